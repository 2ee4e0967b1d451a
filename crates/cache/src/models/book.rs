use std::path::{Path, PathBuf};

use exn::{OptionExt, ResultExt};
use tome_extract::ContentHash;

use crate::error::{Error, ErrorKind};

/// A persisted book.
///
/// The content hash is unique across all records: two files with identical
/// bytes can never both be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    /// Assigned by the database on first insert; `None` until then.
    pub id: Option<i64>,
    /// Decoded cover image saved to local storage.
    pub cover_path: Option<PathBuf>,
    pub title: String,
    /// Full names of all authors, comma separated.
    pub author_name: Option<String>,
    pub annotation: Option<String>,
    pub series: Option<String>,
    pub volume_number: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub lang: Option<String>,
    /// Full names of all translators, comma separated.
    pub translator: Option<String>,
    pub keywords: Option<String>,
    pub isbn: Option<String>,
    /// Where the source file was found.
    pub file_path: Option<PathBuf>,
    pub hash: ContentHash,
    pub is_favourite: Option<bool>,
}

impl BookRecord {
    /// A not-yet-persisted record with only the required fields set.
    pub fn new(title: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            id: None,
            cover_path: None,
            title: title.into(),
            author_name: None,
            annotation: None,
            series: None,
            volume_number: None,
            publisher: None,
            year: None,
            lang: None,
            translator: None,
            keywords: None,
            isbn: None,
            file_path: None,
            hash,
            is_favourite: Some(false),
        }
    }

    pub fn preview(&self) -> Option<BookPreview> {
        Some(BookPreview {
            id: self.id?,
            title: self.title.clone(),
            cover_path: self.cover_path.clone(),
        })
    }
}

/// The subset of a [`BookRecord`] needed to show it in a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPreview {
    pub id: i64,
    pub title: String,
    pub cover_path: Option<PathBuf>,
}

fn sqlx_hates_paths(path: Option<&Path>, field: &'static str) -> Result<Option<String>, Error> {
    path.map(|p| Ok(p.to_str().ok_or_raise(|| ErrorKind::InvalidData(field))?.to_string()))
        .transpose()
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: Option<i64>,
    pub(crate) cover_path: Option<String>,
    pub(crate) title: String,
    pub(crate) author_name: Option<String>,
    pub(crate) annotation: Option<String>,
    pub(crate) series: Option<String>,
    pub(crate) volume_number: Option<String>,
    pub(crate) publisher: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) lang: Option<String>,
    pub(crate) translator: Option<String>,
    pub(crate) keywords: Option<String>,
    pub(crate) isbn: Option<String>,
    pub(crate) file_path: Option<String>,
    pub(crate) hash: String,
    pub(crate) is_favourite: Option<bool>,
}

impl TryFrom<&BookRecord> for BookRow {
    type Error = Error;
    fn try_from(book: &BookRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: book.id,
            cover_path: sqlx_hates_paths(book.cover_path.as_deref(), "cover path")?,
            title: book.title.clone(),
            author_name: book.author_name.clone(),
            annotation: book.annotation.clone(),
            series: book.series.clone(),
            volume_number: book.volume_number.clone(),
            publisher: book.publisher.clone(),
            year: book.year.clone(),
            lang: book.lang.clone(),
            translator: book.translator.clone(),
            keywords: book.keywords.clone(),
            isbn: book.isbn.clone(),
            file_path: sqlx_hates_paths(book.file_path.as_deref(), "file path")?,
            hash: book.hash.to_string(),
            is_favourite: book.is_favourite,
        })
    }
}

impl TryFrom<BookRow> for BookRecord {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            cover_path: row.cover_path.map(PathBuf::from),
            title: row.title,
            author_name: row.author_name,
            annotation: row.annotation,
            series: row.series,
            volume_number: row.volume_number,
            publisher: row.publisher,
            year: row.year,
            lang: row.lang,
            translator: row.translator,
            keywords: row.keywords,
            isbn: row.isbn,
            file_path: row.file_path.map(PathBuf::from),
            hash: row.hash.parse::<ContentHash>().or_raise(|| ErrorKind::InvalidData("hash"))?,
            is_favourite: row.is_favourite,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PreviewRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) cover_path: Option<String>,
}

impl From<PreviewRow> for BookPreview {
    fn from(row: PreviewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            cover_path: row.cover_path.map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_not_a_favourite() {
        let record = BookRecord::new("T", ContentHash::of(b"x"));
        assert_eq!(record.is_favourite, Some(false));
        assert_eq!(record.id, None);
        assert_eq!(record.preview(), None);
    }

    #[test]
    fn test_row_rejects_bad_hash() {
        let mut row = BookRow::try_from(&BookRecord::new("T", ContentHash::of(b"x"))).unwrap();
        row.hash = "nope".to_string();
        let err = BookRecord::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("hash"));
    }
}
