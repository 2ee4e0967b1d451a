//! The per-file half of a scan: hash, dedup, detect, parse, project.

use std::collections::HashSet;
use std::path::PathBuf;

use exn::ResultExt;
use tokio::task::spawn_blocking;
use tome_cache::BookRecord;
use tome_extract::{ContentHash, Format};
use tome_storage::CoverHandle;
use tracing::instrument;

use crate::ingest::candidate::CandidateFile;
use crate::ingest::error::{ErrorKind, Result};
use crate::ingest::project::project;

/// Why a candidate file didn't produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// Content already ingested (this scan or an earlier one).
    Duplicate(ContentHash),
    /// Extension/MIME pair isn't a supported format; carries the extension.
    Unsupported(String),
    /// The document couldn't be parsed, or has no title.
    Malformed,
    /// The file couldn't be read.
    Unreadable,
}
impl From<&ErrorKind> for Skip {
    fn from(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::UnsupportedFormat(extension) => Self::Unsupported(extension.clone()),
            ErrorKind::MalformedDocument => Self::Malformed,
            ErrorKind::Io | ErrorKind::Task => Self::Unreadable,
        }
    }
}

/// What happened to a single candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new record, not yet persisted (its id is still `None`).
    Ingested(Box<BookRecord>),
    Skipped { path: PathBuf, reason: Skip },
}

/// Run one candidate through the pipeline.
///
/// Content already in `known` is reported as [`Skip::Duplicate`] without
/// being parsed. Every other failure comes back as an error for the caller
/// to turn into a skip.
#[instrument(level = "debug", skip_all, fields(path = %candidate.path.display()))]
pub(crate) async fn ingest_file(
    candidate: &CandidateFile,
    known: &HashSet<ContentHash>,
    covers: &CoverHandle,
) -> Result<Outcome> {
    let path = candidate.path.clone();
    let hash = spawn_blocking(move || ContentHash::from_file(path))
        .await
        .or_raise(|| ErrorKind::Task)?
        .or_raise(|| ErrorKind::Io)?;
    if known.contains(&hash) {
        return Ok(Outcome::Skipped {
            path: candidate.path.clone(),
            reason: Skip::Duplicate(hash),
        });
    }

    let extension = candidate
        .path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let format = Format::from_path(&candidate.path, &candidate.mime_type)
        .or_raise(|| ErrorKind::UnsupportedFormat(extension))?;

    let path = candidate.path.clone();
    let (parsed, annotation) = spawn_blocking(move || -> Result<_> {
        let bytes = std::fs::read(&path).or_raise(|| ErrorKind::Io)?;
        // Independent passes: either may succeed without the other.
        Ok((format.parse(&bytes), format.annotation(&bytes)))
    })
    .await
    .or_raise(|| ErrorKind::Task)??;
    let document = parsed.or_raise(|| ErrorKind::MalformedDocument)?;

    let record = project(document, hash, annotation, &candidate.path, covers).await;
    Ok(Outcome::Ingested(Box::new(record)))
}
