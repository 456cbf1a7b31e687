//! Path sources
//!
//! The scan engine pulls paths one at a time from an [`Input`], which hides
//! whether they come from the command line, a file, or standard input.
//! Paths are kept as raw bytes, so names that are not valid UTF-8 pass
//! through unchanged.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Source of paths to scan
pub trait Input {
    /// Next path, or `None` once the source is exhausted
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the underlying source cannot be read.
    fn read_path(&mut self) -> io::Result<Option<PathBuf>>;
}

/// Paths supplied up front
#[derive(Debug, Clone, Default)]
pub struct ListInput {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ListInput {
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into_iter(),
        }
    }
}

impl Input for ListInput {
    fn read_path(&mut self) -> io::Result<Option<PathBuf>> {
        Ok(self.paths.next())
    }
}

/// One path per line from a reader; blank lines are skipped
pub struct ReaderInput<R> {
    reader: R,
    line: Vec<u8>,
}

impl<R: BufRead> ReaderInput<R> {
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
        }
    }
}

impl<R: BufRead> Input for ReaderInput<R> {
    fn read_path(&mut self) -> io::Result<Option<PathBuf>> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            let mut end = self.line.len();
            while end > 0 && matches!(self.line[end - 1], b'\n' | b'\r') {
                end -= 1;
            }
            if end > 0 {
                return Ok(Some(path_from_bytes(&self.line[..end])));
            }
        }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Write `path` followed by a newline, byte for byte where the platform allows
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_path<W: Write + ?Sized>(output: &mut W, path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        output.write_all(path.as_os_str().as_bytes())?;
    }
    #[cfg(not(unix))]
    output.write_all(path.to_string_lossy().as_bytes())?;

    output.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain(input: &mut dyn Input) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        while let Some(path) = input.read_path().unwrap() {
            paths.push(path);
        }
        paths
    }

    #[test]
    fn test_list_input() {
        let mut input = ListInput::new(vec!["a.log".into(), "b.log".into()]);
        assert_eq!(drain(&mut input), vec![PathBuf::from("a.log"), PathBuf::from("b.log")]);
        assert_eq!(input.read_path().unwrap(), None);
    }

    #[test]
    fn test_reader_input_lines() {
        let mut input = ReaderInput::new(Cursor::new("a.log\n\nb log.txt\r\nc.log"));
        assert_eq!(
            drain(&mut input),
            vec![PathBuf::from("a.log"), PathBuf::from("b log.txt"), PathBuf::from("c.log")]
        );
    }

    #[test]
    fn test_reader_input_empty() {
        let mut input = ReaderInput::new(Cursor::new(""));
        assert_eq!(input.read_path().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_reader_input_keeps_non_utf8_names() {
        use std::os::unix::ffi::OsStrExt;

        let mut input = ReaderInput::new(&b"a.log\nbad\xff.log\nb.log\n"[..]);
        let paths = drain(&mut input);

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], PathBuf::from("a.log"));
        assert_eq!(paths[1].as_os_str().as_bytes(), b"bad\xff.log");
        assert_eq!(paths[2], PathBuf::from("b.log"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_path_is_byte_exact() {
        let path = path_from_bytes(b"dir/bad\xff.log");
        let mut out = Vec::new();
        write_path(&mut out, &path).unwrap();
        assert_eq!(out, b"dir/bad\xff.log\n");
    }
}
