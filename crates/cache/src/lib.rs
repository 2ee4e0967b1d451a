//! SQLite persistence for ingested books.
//!
//! The source files on the device are the source of truth; this database only
//! remembers what has already been ingested (by content hash) and the metadata
//! extracted at the time. Delete it and the next scan rebuilds it.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{BookPreview, BookRecord};
pub use crate::repo::Repository;
