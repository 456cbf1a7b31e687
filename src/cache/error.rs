//! Failures inside the time range cache
//!
//! A scan never sees these. `Cache` turns each one into a warning naming the
//! file, then behaves as on a miss; the janitor warns and stops sampling.
//! An entry written by an older layout fails to decode and is simply
//! recomputed.

use thiserror::Error;

/// Why a cache lookup, write or sweep could not complete
#[derive(Debug, Error)]
pub enum CacheError {
    /// The database could not be opened, read, written or flushed
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    /// A stored path or time range is corrupt or from another layout
    #[error("Error while decoding data: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// A path or time range could not be turned into bytes
    #[error("Error while encoding data: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
