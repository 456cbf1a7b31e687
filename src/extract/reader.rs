//! Head and tail line reading
//!
//! Only the first and last few non-empty lines of a file are ever examined.
//! The head is read forward line by line; the tail is read from a window at
//! the end of the file so large files are never read in full.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Bytes of tail window per requested line
pub const TAIL_BYTES_PER_LINE: u64 = 4 * 1024;

/// First and last non-empty lines of a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lines {
    /// In file order
    pub head: Vec<String>,
    /// Last line first
    pub tail: Vec<String>,
}

/// Read up to `n` non-empty lines from each end of the file at `path`
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be opened, seeked or read.
pub fn read_lines(path: &Path, n: usize) -> io::Result<Lines> {
    let mut file = File::open(path)?;
    let head = read_head(&mut file, n)?;
    let tail = read_tail(&mut file, n)?;
    Ok(Lines { head, tail })
}

/// Up to `n` non-empty lines from the start, in file order
///
/// # Errors
///
/// Returns an `io::Error` if seeking or reading fails.
pub fn read_head<R: Read + Seek>(source: &mut R, n: usize) -> io::Result<Vec<String>> {
    source.seek(SeekFrom::Start(0))?;

    let mut reader = BufReader::new(source);
    let mut head = Vec::with_capacity(n);
    let mut buf = Vec::new();
    while head.len() < n {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = trim_line(&buf);
        if !line.is_empty() {
            head.push(String::from_utf8_lossy(line).into_owned());
        }
    }
    Ok(head)
}

/// Up to `n` non-empty lines from the end, last line first
///
/// Reads at most `n * TAIL_BYTES_PER_LINE` bytes; the whole file when it is
/// smaller than that.
///
/// # Errors
///
/// Returns an `io::Error` if seeking or reading fails.
pub fn read_tail<R: Read + Seek>(source: &mut R, n: usize) -> io::Result<Vec<String>> {
    let len = source.seek(SeekFrom::End(0))?;
    let window = (n as u64).saturating_mul(TAIL_BYTES_PER_LINE).min(len);
    source.seek(SeekFrom::Start(len - window))?;

    let mut text = Vec::new();
    source.take(window).read_to_end(&mut text)?;

    Ok(text
        .split(|&b| b == b'\n')
        .rev()
        .map(trim_line)
        .filter(|line| !line.is_empty())
        .take(n)
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect())
}

fn trim_line(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
