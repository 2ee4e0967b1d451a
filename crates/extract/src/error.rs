//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The extension/MIME pair does not match any supported format.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The document could not be parsed as the format it claims to be.
    #[display("malformed document")]
    MalformedDocument,
    /// A required field could not be found in the document.
    #[display("missing required field: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// A content hash was not 64 lowercase hexadecimal characters.
    #[display("invalid content hash: {_0}")]
    InvalidHash(#[error(not(source))] String),
    /// The underlying stream could not be read to completion.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Documents are either valid or they're not; only reading can be retried.
        matches!(self, Self::Io)
    }
}
