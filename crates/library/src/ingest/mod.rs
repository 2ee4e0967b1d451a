//! Scanning a device and ingesting the e-books found on it.
//!
//! A scan runs in three stages:
//!
//! 1. **Discover**: ask the device index for every candidate file.
//! 2. **Process**: for each candidate, in order, hash it, skip it if the
//!    content was seen before, otherwise detect its format, parse it, and
//!    project it onto a [`BookRecord`](tome_cache::BookRecord).
//! 3. **Commit**: write every new record in one batch.
//!
//! [`ingest`] exposes this as a stream of [`ScanEvent`]s. [`Ingestor`] wraps it
//! with a scan lock and the observable state a front-end watches.

mod candidate;
mod cover;
pub mod error;
mod file;
mod ingestor;
mod project;
mod stream;

pub use candidate::{CandidateFile, discover};
pub use file::{Outcome, Skip};
pub use ingestor::{Ingestor, ScanSummary};
pub use stream::{ScanEvent, ingest};
