//! Device Scanner: turns the device index into a list of candidate files.

use std::path::PathBuf;

use tome_extract::{Format, OCTET_STREAM};
use tome_storage::error::Result as StorageResult;
use tome_storage::{IndexEntry, IndexHandle};
use tracing::{debug, instrument};

/// A file that might be an e-book, as reported by the device index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub display_name: String,
    /// MIME type the device declared the file with.
    pub mime_type: String,
}
impl From<IndexEntry> for CandidateFile {
    fn from(entry: IndexEntry) -> Self {
        Self {
            path: entry.path,
            display_name: entry.display_name,
            mime_type: entry.mime_type,
        }
    }
}

/// MIME types worth asking the index for: every supported format's own type,
/// plus the generic fallback devices use for files they don't recognise.
fn wanted_mime_types() -> Vec<&'static str> {
    Format::ALL.iter().map(Format::mime_type).chain([OCTET_STREAM]).collect()
}

/// A generic-typed entry is only kept if its extension is one we support.
fn keep(entry: &IndexEntry) -> bool {
    if !entry.mime_type.eq_ignore_ascii_case(OCTET_STREAM) {
        return true;
    }
    let extension = entry.extension();
    Format::ALL.iter().any(|format| format.extension() == extension)
}

/// Every candidate e-book on the device, most recently added first.
///
/// Returns a complete list rather than a stream so the caller knows the
/// count up front.
#[instrument(level = "debug", skip_all, fields(index = index.name()))]
pub async fn discover(index: &IndexHandle) -> StorageResult<Vec<CandidateFile>> {
    let entries = index.query(&wanted_mime_types()).await?;
    let total = entries.len();
    let candidates: Vec<CandidateFile> = entries.into_iter().filter(keep).map(CandidateFile::from).collect();
    debug!(total, kept = candidates.len(), "device index queried");
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use time::{Duration, UtcDateTime};
    use tome_extract::FB2_MIME;
    use tome_storage::index::MockIndex;

    #[rstest]
    #[case("/b/book.fb2", FB2_MIME, true)]
    #[case("/b/book.fb2", OCTET_STREAM, true)]
    #[case("/b/BOOK.FB2", OCTET_STREAM, true)]
    #[case("/b/book.txt", OCTET_STREAM, false)]
    #[case("/b/book", OCTET_STREAM, false)]
    #[case("/b/book.epub", OCTET_STREAM, false)]
    fn test_keep(#[case] path: &str, #[case] mime: &str, #[case] expected: bool) {
        assert_eq!(keep(&IndexEntry::new(path, mime, UtcDateTime::now())), expected);
    }

    #[tokio::test]
    async fn test_discover() {
        let now = UtcDateTime::now();
        let index: IndexHandle = Arc::new(MockIndex::with_entries([
            IndexEntry::new("/b/old.fb2", FB2_MIME, now - Duration::days(3)),
            IndexEntry::new("/b/notes.txt", OCTET_STREAM, now),
            IndexEntry::new("/b/photo.jpg", "image/jpeg", now),
            IndexEntry::new("/b/new.fb2", OCTET_STREAM, now - Duration::hours(1)),
        ]));
        let names: Vec<String> = discover(&index).await.unwrap().into_iter().map(|c| c.display_name).collect();
        assert_eq!(names, vec!["new.fb2", "old.fb2"]);
    }
}
