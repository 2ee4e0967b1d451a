//! Error types for a single file going through the [`ingest`](super) pipeline.
//!
//! None of these are scan-fatal: the orchestrator turns each one into a
//! [`Skip`](super::Skip) reason and moves on to the next file.

use derive_more::{Display, Error};

/// A per-file ingestion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for per-file ingestion.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be read to compute its hash or parse it.
    #[display("could not read file")]
    Io,
    /// Extension/MIME pair didn't match a supported format.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The structured parse failed or a required field was missing.
    #[display("malformed document")]
    MalformedDocument,
    /// A blocking worker panicked or was cancelled.
    #[display("background task failed")]
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Task)
    }
}

/// Result type alias for cover extraction.
pub(crate) type CoverResult<T> = std::result::Result<T, exn::Exn<CoverErrorKind>>;

/// Why a cover couldn't be extracted. Never leaves the projector: a bad cover
/// only costs the record its cover.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoverErrorKind {
    /// The base64 payload or image bytes couldn't be decoded.
    #[display("could not decode cover image")]
    Decode,
    /// The decoded cover couldn't be written to the cover store.
    #[display("could not store cover image")]
    Store,
    #[display("background task failed")]
    Task,
}
