//! In-memory cover storage for testing.

use super::{COVER_DIR, COVER_EXTENSION, CoverStore};
use crate::error::{ErrorKind, Result};
use crate::path::validate_file_name;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Keeps covers in a map, keyed by the path they would have been written to.
pub struct MemoryCoverStore {
    dir: PathBuf,
    covers: RwLock<HashMap<PathBuf, Vec<u8>>>,
    failing: bool,
}

impl MemoryCoverStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(COVER_DIR),
            covers: RwLock::default(),
            failing: false,
        }
    }

    /// A store where every save fails, as if the disk were full.
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub async fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.covers.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.covers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.covers.read().await.is_empty()
    }
}
impl Default for MemoryCoverStore {
    fn default() -> Self {
        Self::new("/covers")
    }
}

#[async_trait]
impl CoverStore for MemoryCoverStore {
    async fn save(&self, stem: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(stem)?;
        if self.failing {
            exn::bail!(ErrorKind::BackendError("cover store is failing on purpose".to_string()));
        }
        self.covers.write().await.insert(path.clone(), png.to_vec());
        Ok(path)
    }

    fn path_for(&self, stem: &str) -> Result<PathBuf> {
        Ok(self.dir.join(validate_file_name(format!("{stem}.{COVER_EXTENSION}"))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_get() {
        let store = MemoryCoverStore::default();
        let path = store.save("abc", b"png").await.unwrap();
        assert_eq!(path, Path::new("/covers/cover_pages/abc.png"));
        assert_eq!(store.get(&path).await.as_deref(), Some(&b"png"[..]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_failing() {
        let store = MemoryCoverStore::failing();
        assert!(store.save("abc", b"png").await.is_err());
        assert!(store.is_empty().await);
    }
}
