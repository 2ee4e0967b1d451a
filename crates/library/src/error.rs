//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only scan-fatal conditions live here. Anything that goes wrong with a
//! single file is reported through [`ingest::error`](crate::ingest::error)
//! and never aborts a scan.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies why a scan could not run to completion.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Another scan holds the scan lock.
    #[display("a scan is already in progress")]
    ScanInProgress,
    /// The device index could not be queried for candidate files.
    #[display("could not query the device index")]
    DeviceIndex,
    /// The set of already-ingested hashes could not be loaded.
    #[display("could not load known content hashes")]
    Cache,
    /// The batch of newly ingested books could not be written.
    #[display("could not persist ingested books")]
    Persistence,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Nothing is half-written on failure; the next scan starts over.
        true
    }
}
