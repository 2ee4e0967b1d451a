//! In-memory device index for testing.

use super::{DeviceIndex, EntryStream, IndexEntry};
use async_stream::stream;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory device index for testing.
///
/// # Examples
///
/// ```
/// use tome_storage::index::{DeviceIndex, IndexEntry, MockIndex};
/// use time::UtcDateTime;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = MockIndex::with_entries([
///     IndexEntry::new("/books/a.fb2", "application/x-fictionbook+xml", UtcDateTime::now()),
/// ]);
/// assert_eq!(index.query(&["application/x-fictionbook+xml"]).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockIndex {
    entries: RwLock<Vec<IndexEntry>>,
}

impl MockIndex {
    pub fn with_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Add an entry, as if a file had just been copied onto the device.
    pub async fn push(&self, entry: IndexEntry) {
        self.entries.write().await.push(entry);
    }
}

#[async_trait]
impl DeviceIndex for MockIndex {
    fn name(&self) -> &str {
        "mock"
    }

    fn entries(&self) -> EntryStream<'_> {
        Box::pin(stream! {
            // Snapshot, so the lock isn't held across yield points.
            let entries = self.entries.read().await.clone();
            for entry in entries {
                yield Ok(entry);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, UtcDateTime};

    #[tokio::test]
    async fn test_query_sorts_newest_first() {
        let now = UtcDateTime::now();
        let index = MockIndex::with_entries([
            IndexEntry::new("/b/old.fb2", "application/x-fictionbook+xml", now - Duration::days(2)),
            IndexEntry::new("/b/new.fb2", "APPLICATION/X-FICTIONBOOK+XML", now),
            IndexEntry::new("/b/pic.png", "image/png", now),
        ]);
        index.push(IndexEntry::new("/b/mid.bin", "application/octet-stream", now - Duration::days(1))).await;
        let names: Vec<String> = index
            .query(&["application/x-fictionbook+xml", "application/octet-stream"])
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.display_name)
            .collect();
        assert_eq!(names, vec!["new.fb2", "mid.bin", "old.fb2"]);
    }

    #[test]
    fn test_entry_helpers() {
        let entry = IndexEntry::new("/b/Book.FB2", "x", UtcDateTime::now());
        assert_eq!(entry.display_name, "Book.FB2");
        assert_eq!(entry.extension(), "fb2");
        assert_eq!(IndexEntry::new("/b/README", "x", UtcDateTime::now()).extension(), "");
    }
}
