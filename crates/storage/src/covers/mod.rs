//! Storage for extracted cover images.

mod local;
#[cfg(feature = "mock")]
mod memory;
mod ro;

pub use self::local::LocalCoverStore;
#[cfg(feature = "mock")]
pub use self::memory::MemoryCoverStore;
pub use self::ro::ReadOnlyCoverStore;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Subdirectory (below the store's root) that covers are written to.
pub const COVER_DIR: &str = "cover_pages";
/// Covers are always re-encoded as PNG before being stored.
pub const COVER_EXTENSION: &str = "png";

/// Somewhere to put decoded cover images.
#[async_trait]
pub trait CoverStore: Send + Sync {
    /// Store a PNG-encoded cover as `<COVER_DIR>/<stem>.png`, replacing any
    /// previous cover with the same stem, and return its absolute path.
    ///
    /// The stem must be a plain file name (no separators, no `..`).
    async fn save(&self, stem: &str, png: &[u8]) -> Result<PathBuf>;

    /// Where [`save`](Self::save) would put a cover with this stem, without
    /// touching storage.
    fn path_for(&self, stem: &str) -> Result<PathBuf>;
}
