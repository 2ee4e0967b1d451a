//! Metadata extraction for e-book files.
//!
//! - [`ContentHash`] fingerprints a file's bytes,
//! - [`Format`] decides whether a file is something we can parse, and
//! - [`Format::parse`] / [`Format::annotation`] pull bibliographic metadata
//!   out of it.

mod consts;
pub mod error;
mod fb2;
pub mod format;
pub mod hash;
pub mod models;

pub use crate::format::{FB2_MIME, Format, OCTET_STREAM, canonical_mime_type};
pub use crate::hash::ContentHash;
pub use crate::models::ParsedDocument;
