//! Finding e-books on a device and bringing them into the catalogue.

pub mod error;
pub mod ingest;

pub use crate::ingest::{CandidateFile, Ingestor, Outcome, ScanEvent, ScanSummary, Skip, discover, ingest};
