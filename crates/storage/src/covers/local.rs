//! Cover images on the local filesystem.

use super::{COVER_DIR, COVER_EXTENSION, CoverStore};
use crate::error::{ErrorKind, Result};
use crate::path::validate_file_name;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Writes covers to `<root>/cover_pages/`.
#[derive(Clone, Debug)]
pub struct LocalCoverStore {
    dir: PathBuf,
}
impl LocalCoverStore {
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if `root` is not
    /// absolute or is not a directory. The cover directory itself is created
    /// on first save.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root.to_path_buf()));
        }
        Ok(Self { dir: root.join(COVER_DIR) })
    }

    /// The directory covers are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl CoverStore for LocalCoverStore {
    async fn save(&self, stem: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(stem)?;
        fs::create_dir_all(&self.dir).await.map_err(|e| ErrorKind::io(e, &self.dir))?;
        fs::write(&path, png).await.map_err(|e| ErrorKind::io(e, &path))?;
        debug!(path = %path.display(), size = png.len(), "cover saved");
        Ok(path)
    }

    fn path_for(&self, stem: &str) -> Result<PathBuf> {
        Ok(self.dir.join(validate_file_name(format!("{stem}.{COVER_EXTENSION}"))?))
    }
}
