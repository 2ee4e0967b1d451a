use std::pin::pin;
use std::sync::Arc;

use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use tokio::sync::{Mutex, watch};
use tome_cache::{BookPreview, BookRecord, Repository};
use tome_storage::covers::ReadOnlyCoverStore;
use tome_storage::{CoverHandle, IndexHandle};
use tracing::{info, instrument};

use crate::error::{ErrorKind, Result};
use crate::ingest::file::{Outcome, Skip};
use crate::ingest::stream::{ScanEvent, ingest};

/// Totals for one completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub discovered: u64,
    pub ingested: usize,
    pub duplicates: usize,
    /// Files skipped for any reason other than being a duplicate.
    pub skipped: usize,
}

/// Owns the collaborators a scan needs and the state observers watch.
///
/// Only one scan runs at a time. Observers subscribe to [`scanning`](Self::scanning)
/// and [`books`](Self::books); both are updated as scans start, commit and
/// finish.
pub struct Ingestor {
    index: IndexHandle,
    cache: Repository,
    covers: CoverHandle,
    lock: Mutex<()>,
    scanning: watch::Sender<bool>,
    books: watch::Sender<Vec<BookPreview>>,
}

impl Ingestor {
    /// A dry-run repository also makes cover storage read-only, so a dry-run
    /// scan leaves nothing behind.
    pub fn new(index: IndexHandle, cache: Repository, covers: CoverHandle) -> Self {
        let covers: CoverHandle = match cache.is_dry_run() {
            true => Arc::new(ReadOnlyCoverStore::new(covers)),
            false => covers,
        };
        Self {
            index,
            cache,
            covers,
            lock: Mutex::new(()),
            scanning: watch::channel(false).0,
            books: watch::channel(Vec::new()).0,
        }
    }

    /// Whether a scan is currently running.
    pub fn scanning(&self) -> watch::Receiver<bool> {
        self.scanning.subscribe()
    }

    /// The most recently published book previews.
    pub fn books(&self) -> watch::Receiver<Vec<BookPreview>> {
        self.books.subscribe()
    }

    /// Publish everything already persisted, without scanning.
    pub async fn refresh(&self) -> Result<()> {
        let previews = self.cache.list_previews().await.or_raise(|| ErrorKind::Cache)?;
        self.books.send_replace(previews);
        Ok(())
    }

    /// Scan the device, streaming progress as it goes.
    ///
    /// Fails immediately with [`ErrorKind::ScanInProgress`] if another scan
    /// holds the lock. The `scanning` flag is raised for as long as the
    /// stream is alive, and lowered however it ends: completion, a fatal
    /// error, or being dropped part-way.
    ///
    /// When new books were committed, observers receive exactly that batch.
    /// Otherwise they receive every persisted preview.
    pub fn scan(&self) -> impl Stream<Item = Result<ScanEvent>> + '_ {
        stream!({
            let Ok(_permit) = self.lock.try_lock() else {
                yield Err(exn::Exn::from(ErrorKind::ScanInProgress));
                return;
            };
            let _flag = ScanningFlag::raise(&self.scanning);

            let mut committed = false;
            let mut events = pin!(ingest(&self.index, &self.cache, &self.covers));
            while let Some(event) = events.next().await {
                match &event {
                    Ok(ScanEvent::Committed(stored)) => {
                        committed = true;
                        self.books.send_replace(stored.iter().filter_map(BookRecord::preview).collect());
                    },
                    Ok(ScanEvent::Complete) if !committed => {
                        if let Err(e) = self.refresh().await {
                            yield Err(e);
                            return;
                        }
                    },
                    _ => {},
                }
                yield event;
            }
        })
    }

    /// Run a scan to completion, returning only the totals.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        let mut events = pin!(self.scan());
        while let Some(event) = events.next().await {
            match event? {
                ScanEvent::DiscoveryComplete(count) => summary.discovered = count,
                ScanEvent::Processed(Outcome::Ingested(_)) => summary.ingested += 1,
                ScanEvent::Processed(Outcome::Skipped { reason: Skip::Duplicate(_), .. }) => summary.duplicates += 1,
                ScanEvent::Processed(Outcome::Skipped { .. }) => summary.skipped += 1,
                ScanEvent::Started | ScanEvent::Committed(_) | ScanEvent::Complete => {},
            }
        }
        info!(
            discovered = summary.discovered,
            ingested = summary.ingested,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            "scan finished"
        );
        Ok(summary)
    }
}

/// Holds `scanning` high until dropped.
struct ScanningFlag<'a>(&'a watch::Sender<bool>);
impl<'a> ScanningFlag<'a> {
    fn raise(sender: &'a watch::Sender<bool>) -> Self {
        sender.send_replace(true);
        Self(sender)
    }
}
impl Drop for ScanningFlag<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::cover::tests::encoded_image;
    use crate::ingest::tests::{fb2, write};
    use image::ImageFormat;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicI64, Ordering};
    use tempfile::TempDir;
    use time::{Duration, UtcDateTime};
    use tome_cache::Database;
    use tome_extract::{ContentHash, FB2_MIME, OCTET_STREAM};
    use tome_storage::IndexEntry;
    use tome_storage::covers::MemoryCoverStore;
    use tome_storage::index::MockIndex;

    struct Fixture {
        dir: TempDir,
        db: Database,
        index: Arc<MockIndex>,
        covers: Arc<MemoryCoverStore>,
        ingestor: Ingestor,
        added: AtomicI64,
    }

    impl Fixture {
        async fn new() -> Self {
            Self::with_dry_run(false).await
        }

        async fn with_dry_run(dry_run: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = Database::connect_in_memory().await.unwrap();
            let index = Arc::new(MockIndex::default());
            let covers = Arc::new(MemoryCoverStore::default());
            let cache = Repository::new(db.pool().clone(), dry_run);
            let ingestor = Ingestor::new(index.clone(), cache, covers.clone());
            Self { dir, db, index, covers, ingestor, added: AtomicI64::new(0) }
        }

        /// Write a file and register it with the index. Later files count as
        /// more recently added.
        async fn add(&self, name: &str, mime_type: &str, contents: &str) -> PathBuf {
            let path = write(self.dir.path(), name, contents);
            let minutes = self.added.fetch_add(1, Ordering::Relaxed);
            let added = UtcDateTime::now() - Duration::days(30) + Duration::minutes(minutes);
            self.index.push(IndexEntry::new(&path, mime_type, added)).await;
            path
        }

        async fn add_book(&self, name: &str, title: &str) -> PathBuf {
            self.add(name, FB2_MIME, &fb2(title, "")).await
        }

        fn cache(&self) -> Repository {
            Repository::from(&self.db)
        }

        async fn events(&self) -> Vec<Result<ScanEvent>> {
            self.ingestor.scan().collect().await
        }
    }

    fn covered_fb2(title: &str) -> String {
        let extra = r##"<annotation><p>A  story.</p></annotation><coverpage><image l:href="#c.png"/></coverpage>"##;
        fb2(title, extra).replace(
            "</FictionBook>",
            &format!(r#"<binary id="c.png" content-type="image/png">{}</binary></FictionBook>"#, encoded_image(ImageFormat::Png)),
        )
    }

    fn titles(previews: &[BookPreview]) -> Vec<&str> {
        let mut titles: Vec<&str> = previews.iter().map(|p| p.title.as_str()).collect();
        titles.sort();
        titles
    }

    #[tokio::test]
    async fn test_scan_ingests_new_books() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        fixture.add_book("b.fb2", "Beta").await;

        let summary = fixture.ingestor.run().await.unwrap();
        assert_eq!(summary, ScanSummary { discovered: 2, ingested: 2, duplicates: 0, skipped: 0 });

        let stored = fixture.cache().list_all().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|book| book.id.is_some()));
        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Alpha", "Beta"]);
        assert!(!*fixture.ingestor.scanning().borrow());
    }

    #[tokio::test]
    async fn test_event_order() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;

        let events: Vec<ScanEvent> = fixture.events().await.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], ScanEvent::Started);
        assert_eq!(events[1], ScanEvent::DiscoveryComplete(1));
        assert!(matches!(&events[2], ScanEvent::Processed(Outcome::Ingested(r)) if r.title == "Alpha"));
        assert!(matches!(&events[3], ScanEvent::Committed(stored) if stored.len() == 1 && stored[0].id.is_some()));
        assert_eq!(events[4], ScanEvent::Complete);
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        fixture.ingestor.run().await.unwrap();

        let summary = fixture.ingestor.run().await.unwrap();
        assert_eq!(summary, ScanSummary { discovered: 1, ingested: 0, duplicates: 1, skipped: 0 });
        assert_eq!(fixture.cache().list_all().await.unwrap().len(), 1);

        // Nothing committed, so the persisted set is published instead.
        let events: Vec<ScanEvent> = fixture.events().await.into_iter().map(|e| e.unwrap()).collect();
        assert!(!events.iter().any(|e| matches!(e, ScanEvent::Committed(_))));
        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Alpha"]);
    }

    #[tokio::test]
    async fn test_identical_content_is_ingested_once() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        fixture.add_book("copy-of-a.fb2", "Alpha").await;

        let summary = fixture.ingestor.run().await.unwrap();
        assert_eq!(summary.ingested, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(fixture.cache().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_files_do_not_abort_the_scan() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        let broken = fixture.add("broken.fb2", FB2_MIME, "<FictionBook><description>").await;
        let untitled = fixture.add("untitled.fb2", FB2_MIME, &fb2("   ", "")).await;
        let text = fixture.add("notes.fb2", "text/plain", "just some notes").await;
        fixture.add_book("z.fb2", "Zulu").await;

        let events = fixture.events().await;
        let skips: Vec<(PathBuf, Skip)> = events
            .iter()
            .filter_map(|e| match e {
                Ok(ScanEvent::Processed(Outcome::Skipped { path, reason })) => Some((path.clone(), reason.clone())),
                _ => None,
            })
            .collect();
        // "text/plain" isn't asked for, so the index never reports it.
        assert!(!skips.iter().any(|(path, _)| path == &text));
        assert!(skips.contains(&(broken, Skip::Malformed)));
        assert!(skips.contains(&(untitled, Skip::Malformed)));
        assert!(matches!(events.last(), Some(Ok(ScanEvent::Complete))));
        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Alpha", "Zulu"]);
    }

    #[tokio::test]
    async fn test_format_gate() {
        let fixture = Fixture::new().await;
        // Generic MIME type with the right extension: accepted.
        fixture.add("generic.fb2", OCTET_STREAM, &fb2("Generic", "")).await;
        // Generic MIME type with any other extension: never a candidate.
        fixture.add("generic.xml", OCTET_STREAM, &fb2("Xml", "")).await;
        // Declared as FB2 but with the wrong extension: rejected.
        let wrong = fixture.add("declared.txt", FB2_MIME, &fb2("Declared", "")).await;

        let events = fixture.events().await;
        assert!(matches!(events[1], Ok(ScanEvent::DiscoveryComplete(2))));
        assert!(events.iter().any(|e| matches!(
            e,
            Ok(ScanEvent::Processed(Outcome::Skipped { path, reason: Skip::Unsupported(ext) })) if path == &wrong && ext == "txt"
        )));
        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Generic"]);
    }

    #[tokio::test]
    async fn test_cover_and_annotation() {
        let fixture = Fixture::new().await;
        fixture.add("covered.fb2", FB2_MIME, &covered_fb2("Covered")).await;
        fixture.ingestor.run().await.unwrap();

        let book = &fixture.cache().list_all().await.unwrap()[0];
        assert_eq!(book.annotation.as_deref(), Some("A story."));
        let cover = book.cover_path.as_deref().unwrap();
        assert_eq!(cover, Path::new("/covers/cover_pages").join(format!("{}.png", book.hash)));
        assert!(fixture.covers.get(cover).await.is_some());
        assert_eq!(fixture.ingestor.books().borrow()[0].cover_path.as_deref(), Some(cover));
    }

    #[tokio::test]
    async fn test_only_new_batch_is_published() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        fixture.ingestor.run().await.unwrap();
        fixture.add_book("b.fb2", "Beta").await;
        fixture.ingestor.run().await.unwrap();

        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Beta"]);
        fixture.ingestor.refresh().await.unwrap();
        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_concurrent_scan_is_rejected() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        let scanning = fixture.ingestor.scanning();

        let mut first = Box::pin(fixture.ingestor.scan());
        assert!(matches!(first.next().await, Some(Ok(ScanEvent::Started))));
        assert!(*scanning.borrow());

        let second: Vec<_> = fixture.ingestor.scan().collect().await;
        assert_eq!(second.len(), 1);
        assert_eq!(**second[0].as_ref().unwrap_err(), ErrorKind::ScanInProgress);
        assert!(*scanning.borrow(), "a rejected scan must not lower the flag");

        // Abandoning a scan part-way releases the lock and lowers the flag.
        drop(first);
        assert!(!*scanning.borrow());
        assert_eq!(fixture.ingestor.run().await.unwrap().ingested, 1);
    }

    #[tokio::test]
    async fn test_persistence_failure() {
        let fixture = Fixture::new().await;
        fixture.add_book("a.fb2", "Alpha").await;
        fixture.ingestor.run().await.unwrap();

        sqlx::query("CREATE TRIGGER reject_inserts BEFORE INSERT ON books BEGIN SELECT RAISE(ABORT, 'read only'); END;")
            .execute(fixture.db.pool())
            .await
            .unwrap();
        fixture.add_book("b.fb2", "Beta").await;
        fixture.add_book("c.fb2", "Gamma").await;

        let err = fixture.ingestor.run().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Persistence);
        assert!(!*fixture.ingestor.scanning().borrow());
        // The failed batch is all-or-nothing.
        let stored = fixture.cache().list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Alpha");
    }

    #[tokio::test]
    async fn test_cache_failure() {
        let fixture = Fixture::new().await;
        fixture.db.close().await;
        let events = fixture.events().await;
        assert!(matches!(events[0], Ok(ScanEvent::Started)));
        assert_eq!(**events[1].as_ref().unwrap_err(), ErrorKind::Cache);
        assert_eq!(events.len(), 2);
        assert!(!*fixture.ingestor.scanning().borrow());
    }

    #[tokio::test]
    async fn test_dry_run_leaves_nothing_behind() {
        let fixture = Fixture::with_dry_run(true).await;
        let seeded = BookRecord::new("Seeded", ContentHash::of(b"seeded"));
        fixture.cache().upsert(&[seeded]).await.unwrap();
        fixture.add("covered.fb2", FB2_MIME, &covered_fb2("Covered")).await;

        let events: Vec<ScanEvent> = fixture.events().await.into_iter().map(|e| e.unwrap()).collect();
        let Some(ScanEvent::Processed(Outcome::Ingested(record))) = events.get(2) else {
            panic!("expected a record, got {events:?}");
        };
        assert!(record.cover_path.is_some(), "the cover path is still reported");
        assert!(!events.iter().any(|e| matches!(e, ScanEvent::Committed(_))));
        assert!(matches!(events.last(), Some(ScanEvent::Complete)));

        assert!(fixture.covers.is_empty().await);
        let stored = fixture.cache().list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(titles(&fixture.ingestor.books().borrow()), vec!["Seeded"]);
    }
}
