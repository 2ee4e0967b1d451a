//! Read-only cover storage.

use super::CoverStore;
use crate::CoverHandle;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Wraps another cover store and silently drops every save, logging an
/// [`info event`](tracing::Event) and reporting where the cover would have
/// gone.
#[derive(Clone)]
pub struct ReadOnlyCoverStore {
    inner: CoverHandle,
}
impl ReadOnlyCoverStore {
    pub fn new(inner: CoverHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CoverStore for ReadOnlyCoverStore {
    async fn save(&self, stem: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.inner.path_for(stem)?;
        tracing::info!(path = %path.display(), bytes = png.len(), "Skipping cover write during read-only mode");
        Ok(path)
    }

    fn path_for(&self, stem: &str) -> Result<PathBuf> {
        self.inner.path_for(stem)
    }
}
