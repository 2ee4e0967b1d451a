//! Collaborators at the edge of the ingestion pipeline: the device's content
//! index (what files exist), and the cover store (where extracted cover
//! images go).

pub mod covers;
pub mod error;
pub mod index;
mod path;

pub use crate::covers::CoverStore;
pub use crate::index::{DeviceIndex, IndexEntry};
use std::sync::Arc;

pub type IndexHandle = Arc<dyn DeviceIndex + Send + Sync>;
pub type CoverHandle = Arc<dyn CoverStore + Send + Sync>;
