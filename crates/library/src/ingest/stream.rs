use crate::error::{ErrorKind, Result};
use crate::ingest::candidate::discover;
use crate::ingest::file::{Outcome, Skip, ingest_file};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use tome_cache::{BookRecord, Repository};
use tome_storage::{CoverHandle, IndexHandle};
use tracing::{debug, info, warn};

/// Progress events emitted by [`ingest`] as it works through the device.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of candidate files.
/// 3. [`Processed`](Self::Processed) once per candidate, in discovery order.
/// 4. [`Committed`](Self::Committed) at most once, only if there was anything
///    new to write and the repository isn't in dry-run mode.
/// 5. [`Complete`](Self::Complete) exactly once.
///
/// A scan-fatal error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started,
    DiscoveryComplete(u64),
    Processed(Outcome),
    /// The batch of new records was written; these are the stored records,
    /// ids included.
    Committed(Vec<BookRecord>),
    Complete,
}

/// Streams [`ScanEvent`]s for one pass over the device index.
///
/// The persisted hash set is read once up front. Candidates are processed
/// one after another; a file that fails for any reason becomes an
/// [`Outcome::Skipped`] and the scan carries on. Only three things are
/// fatal: the hash set can't be read, the index can't be queried, or the
/// final batch write fails.
pub fn ingest<'a>(
    index: &'a IndexHandle,
    cache: &'a Repository,
    covers: &'a CoverHandle,
) -> impl Stream<Item = Result<ScanEvent>> + 'a {
    stream!({
        yield Ok(ScanEvent::Started);

        let mut known = match cache.list_hashes().await.or_raise(|| ErrorKind::Cache) {
            Ok(known) => known,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let candidates = match discover(index).await.or_raise(|| ErrorKind::DeviceIndex) {
            Ok(candidates) => candidates,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        info!(candidates = candidates.len(), known = known.len(), "scanning device");
        yield Ok(ScanEvent::DiscoveryComplete(candidates.len() as u64));

        let mut batch: Vec<BookRecord> = Vec::new();
        for candidate in &candidates {
            let outcome = match ingest_file(candidate, &known, covers).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(path = %candidate.path.display(), ?error, "skipping file");
                    Outcome::Skipped { path: candidate.path.clone(), reason: Skip::from(&*error) }
                },
            };
            match &outcome {
                Outcome::Ingested(record) => {
                    debug!(path = %candidate.path.display(), title = %record.title, "ingested");
                    // Identical files later in this same scan are duplicates too.
                    known.insert(record.hash.clone());
                    batch.push(record.as_ref().clone());
                },
                Outcome::Skipped { path, reason: Skip::Duplicate(hash) } => {
                    debug!(path = %path.display(), %hash, "already ingested");
                },
                Outcome::Skipped { .. } => {},
            }
            yield Ok(ScanEvent::Processed(outcome));
        }

        if cache.is_dry_run() {
            info!(count = batch.len(), "dry run: new books not committed");
        } else if !batch.is_empty() {
            match cache.upsert(&batch).await.or_raise(|| ErrorKind::Persistence) {
                Ok(stored) => {
                    info!(count = stored.len(), "new books committed");
                    yield Ok(ScanEvent::Committed(stored));
                },
                Err(e) => {
                    yield Err(e);
                    return;
                },
            }
        } else {
            info!("no new books found");
        }

        yield Ok(ScanEvent::Complete);
    })
}
