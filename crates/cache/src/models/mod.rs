mod book;

pub use self::book::{BookPreview, BookRecord};
pub(crate) use self::book::{BookRow, PreviewRow};
