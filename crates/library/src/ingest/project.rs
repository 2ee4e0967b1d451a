//! Metadata Projector: flattens a [`ParsedDocument`] onto a [`BookRecord`].

use std::path::{Path, PathBuf};

use exn::ResultExt;
use tokio::task::spawn_blocking;
use tome_cache::BookRecord;
use tome_extract::ContentHash;
use tome_extract::models::{Binary, ParsedDocument};
use tome_storage::CoverHandle;
use tracing::{debug, warn};

use crate::ingest::cover::decode_to_png;
use crate::ingest::error::{CoverErrorKind, CoverResult};

/// Build the record for a parsed document.
///
/// The cover, if the document has one, is decoded and saved to `covers`
/// under the content hash. Failing to do so only costs the record its cover.
pub(crate) async fn project(
    document: ParsedDocument,
    hash: ContentHash,
    annotation: Option<String>,
    file_path: &Path,
    covers: &CoverHandle,
) -> BookRecord {
    let cover_path = match document.cover_binary() {
        Some(binary) => match save_cover(binary.clone(), &hash, covers).await {
            Ok(path) => Some(path),
            Err(error) => {
                warn!(path = %file_path.display(), ?error, "cover skipped");
                None
            },
        },
        None => {
            if let Some(cover) = &document.cover {
                debug!(path = %file_path.display(), id = %cover.id, "cover page refers to a missing binary");
            }
            None
        },
    };
    let series = document.latest_series().cloned();
    let publish_info = document.publish_info.clone().unwrap_or_default();
    BookRecord {
        cover_path,
        author_name: document.author_names(),
        translator: document.translator_names(),
        annotation,
        series: series.as_ref().map(|s| s.name.clone()),
        volume_number: series.and_then(|s| s.number),
        publisher: publish_info.publisher,
        year: publish_info.year,
        lang: document.language,
        keywords: document.keywords,
        isbn: publish_info.isbn,
        file_path: Some(file_path.to_path_buf()),
        ..BookRecord::new(document.title, hash)
    }
}

async fn save_cover(binary: Binary, hash: &ContentHash, covers: &CoverHandle) -> CoverResult<PathBuf> {
    let png = spawn_blocking(move || decode_to_png(&binary.data)).await.or_raise(|| CoverErrorKind::Task)??;
    covers.save(hash.as_str(), &png).await.or_raise(|| CoverErrorKind::Store)
}
