//! Repository for [`BookRecord`] entities.

use std::collections::HashSet;

use exn::ResultExt;
use sqlx::SqlitePool;
use tome_extract::ContentHash;
use tracing::{debug, instrument};

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{BookPreview, BookRecord, BookRow, PreviewRow};

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|e| e.is_unique_violation())
}

/// Repository for reading and writing books in the cache database.
///
/// Records are keyed by their database id; the content hash is a second,
/// unique key enforced by the schema.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    ///
    /// In dry-run mode every write is skipped (reads still hit the database).
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // =========================================================================
    // Insert/Update
    // =========================================================================

    /// Insert or replace a batch of books in a single transaction.
    ///
    /// Records without an id are inserted; records with an id replace the
    /// existing row. Returns the records with their ids filled in.
    ///
    /// The whole batch is rolled back with [`ErrorKind::Constraint`] if any
    /// record would duplicate a content hash already stored (or one earlier in
    /// the same batch).
    #[instrument(level = "debug", skip_all, fields(count = books.len(), dry_run = self.dry_run))]
    pub async fn upsert(&self, books: &[BookRecord]) -> Result<Vec<BookRecord>> {
        if self.dry_run || books.is_empty() {
            return Ok(books.to_vec());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut stored = Vec::with_capacity(books.len());
        for book in books {
            let row = BookRow::try_from(book)?;
            let result = sqlx::query_scalar::<_, i64>(include_str!("../queries/upsert_book.sql"))
                .bind(row.id)
                .bind(row.cover_path)
                .bind(row.title)
                .bind(row.author_name)
                .bind(row.annotation)
                .bind(row.series)
                .bind(row.volume_number)
                .bind(row.publisher)
                .bind(row.year)
                .bind(row.lang)
                .bind(row.translator)
                .bind(row.keywords)
                .bind(row.isbn)
                .bind(row.file_path)
                .bind(row.hash)
                .bind(row.is_favourite)
                .fetch_one(&mut *tx)
                .await;
            let id = match result {
                Err(e) if is_unique_violation(&e) => return Err(e).or_raise(|| ErrorKind::Constraint),
                other => other.or_raise(|| ErrorKind::Database)?,
            };
            stored.push(BookRecord { id: Some(id), ..book.clone() });
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        debug!(count = stored.len(), "books upserted");
        Ok(stored)
    }

    /// Mark (or unmark) a book as a favourite.
    ///
    /// Returns `false` if no book has the given id.
    pub async fn set_favourite(&self, id: i64, favourite: bool) -> Result<bool> {
        if self.dry_run {
            return Ok(self.get_by_id(id).await?.is_some());
        }
        let result = sqlx::query(include_str!("../queries/set_favourite.sql"))
            .bind(favourite)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get_by_id(&self, id: i64) -> Result<Option<BookRecord>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_by_id.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(BookRecord::try_from).transpose()
    }

    pub async fn get_by_hash(&self, hash: &ContentHash) -> Result<Option<BookRecord>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_by_hash.sql"))
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(BookRecord::try_from).transpose()
    }

    // =========================================================================
    // List
    // =========================================================================

    /// Every book, in insertion order.
    pub async fn list_all(&self) -> Result<Vec<BookRecord>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_all.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(BookRecord::try_from).collect()
    }

    /// Every book, reduced to what's needed to display it in a list.
    pub async fn list_previews(&self) -> Result<Vec<BookPreview>> {
        let rows: Vec<PreviewRow> = sqlx::query_as(include_str!("../queries/list_previews.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(BookPreview::from).collect())
    }

    /// The content hash of every stored book.
    ///
    /// Loaded once per scan so that deduplication doesn't cost a query per file.
    pub async fn list_hashes(&self) -> Result<HashSet<ContentHash>> {
        let hashes: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_hashes.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        hashes
            .into_iter()
            .map(|hash| hash.parse::<ContentHash>().or_raise(|| ErrorKind::InvalidData("hash")))
            .collect()
    }

    /// Books in the given series (case-insensitive), optionally leaving one out.
    pub async fn list_by_series(&self, series: impl AsRef<str>, exclude_id: Option<i64>) -> Result<Vec<BookRecord>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_by_series.sql"))
            .bind(series.as_ref())
            // Ids start at 1, so -1 never excludes anything.
            .bind(exclude_id.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(BookRecord::try_from).collect()
    }

    /// Other books in the same series as book `id`.
    ///
    /// Empty if the book doesn't exist or isn't part of a series.
    pub async fn list_related(&self, id: i64) -> Result<Vec<BookRecord>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_related.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(BookRecord::try_from).collect()
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete a book by id. Returns `false` if there was nothing to delete.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        if self.dry_run {
            return Ok(self.get_by_id(id).await?.is_some());
        }
        let result = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
