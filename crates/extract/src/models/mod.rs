mod binary;
mod document;
mod person;
mod publish;
mod series;

pub use self::binary::{Binary, CoverRef};
pub use self::document::{ParsedDocument, normalize_genres};
pub use self::person::{Person, join_names};
pub use self::publish::PublishInfo;
pub use self::series::Series;
