//! Device content index.
//!
//! A [`DeviceIndex`] knows which files exist on the device and what MIME type
//! each one was declared with. It does not read file contents.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalIndex;
#[cfg(feature = "mock")]
pub use self::mock::MockIndex;
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt, future};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use time::UtcDateTime;

pub(crate) type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<IndexEntry>> + Send + 'a>>;

/// One row of the device index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Human readable name, usually the file name.
    pub display_name: String,
    /// MIME type the file was declared (or guessed) with.
    pub mime_type: String,
    /// When the file was added to the device.
    pub added: UtcDateTime,
}
impl IndexEntry {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, added: UtcDateTime) -> Self {
        let path = path.into();
        Self {
            display_name: Self::display_name_of(&path),
            path,
            mime_type: mime_type.into(),
            added,
        }
    }

    fn display_name_of(path: &Path) -> String {
        path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Lowercase file extension, or an empty string if there is none.
    pub fn extension(&self) -> String {
        self.path.extension().map(|ext| ext.to_string_lossy().to_lowercase()).unwrap_or_default()
    }
}

/// Queryable index of files on the device.
#[async_trait]
pub trait DeviceIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Every entry in the index, in no particular order.
    fn entries(&self) -> EntryStream<'_>;

    /// Entries declared with any of the given MIME types (case-insensitive),
    /// most recently added first.
    async fn query(&self, mime_types: &[&str]) -> Result<Vec<IndexEntry>> {
        let mut entries: Vec<IndexEntry> = self
            .entries()
            .try_filter(|entry| {
                future::ready(mime_types.iter().any(|mime| entry.mime_type.eq_ignore_ascii_case(mime)))
            })
            .try_collect()
            .await?;
        entries.sort_by(|a, b| b.added.cmp(&a.added));
        Ok(entries)
    }
}
