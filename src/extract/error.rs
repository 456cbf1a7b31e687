//! Extractor construction errors
//!
//! Only a malformed pattern is rejected up front. A format template is never
//! validated here: unknown placeholders simply fail to parse later, at
//! extraction time.

use thiserror::Error;

/// Errors produced while constructing an [`Extractor`](super::Extractor)
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Regex failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ExtractorError {
    #[must_use]
    pub fn regex_compile(pattern: &str, reason: &str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}
