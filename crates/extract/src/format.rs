//! Supported document formats and the extension/MIME gate in front of them.

use crate::error::{ErrorKind, Result};
use crate::fb2;
use crate::models::ParsedDocument;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

/// MIME type declared for FictionBook 2 documents.
pub const FB2_MIME: &str = "application/x-fictionbook+xml";
/// Generic MIME type that devices fall back to when they don't recognise a file.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Canonical MIME type for each e-book extension the detector knows about.
///
/// Knowing an extension is not the same as supporting it: only extensions that
/// belong to a [`Format`] variant are ever accepted.
const MIME_TYPES: &[(&str, &str)] = &[
    ("fb2", FB2_MIME),
    ("epub", "application/epub+zip"),
    ("mobi", "application/x-mobipocket-ebook"),
];

/// Returns the canonical MIME type for a (case-insensitive) file extension.
pub fn canonical_mime_type(extension: &str) -> Option<&'static str> {
    let extension = extension.to_lowercase();
    MIME_TYPES.iter().find(|(ext, _)| *ext == extension).map(|(_, mime)| *mime)
}

/// A supported structured document format.
///
/// Each variant knows how to parse its own documents, so callers only ever
/// deal with `Format` and [`ParsedDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// FictionBook 2 (.fb2)
    FictionBook2,
}

impl Format {
    /// Every supported format.
    pub const ALL: &'static [Format] = &[Format::FictionBook2];

    /// The (lowercase, dot-less) file extension for this format.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Format::FictionBook2 => "fb2",
        }
    }

    /// The MIME type a correctly tagged file of this format declares.
    #[inline]
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::FictionBook2 => FB2_MIME,
        }
    }

    /// Short identifier (for displaying to user).
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::FictionBook2 => "fb2",
        }
    }

    /// Classify a file by its extension and the MIME type it was declared with.
    ///
    /// Both have to agree: the extension must map to a supported format, and
    /// the declared type must either be that format's canonical type or the
    /// generic [`OCTET_STREAM`]. A generic type on its own is never enough.
    #[must_use]
    pub fn detect(extension: &str, declared: &str) -> Option<Format> {
        let extension = extension.to_lowercase();
        let canonical = canonical_mime_type(&extension)?;
        let declared_ok = declared.eq_ignore_ascii_case(canonical) || declared.eq_ignore_ascii_case(OCTET_STREAM);
        Self::ALL.iter().copied().find(|format| format.extension() == extension && declared_ok)
    }

    /// Same as [`detect`](Self::detect), reading the extension off a path.
    ///
    /// Returns [`UnsupportedFormat`](ErrorKind::UnsupportedFormat) carrying
    /// the offending extension (empty if the path has none).
    pub fn from_path(path: impl AsRef<Path>, declared: &str) -> Result<Format> {
        let extension = path.as_ref().extension().and_then(|e| e.to_str()).unwrap_or_default();
        match Self::detect(extension, declared) {
            Some(format) => Ok(format),
            None => exn::bail!(ErrorKind::UnsupportedFormat(extension.to_lowercase())),
        }
    }

    /// Parse the structured metadata of a document in this format.
    pub fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument> {
        match self {
            Format::FictionBook2 => fb2::parse(bytes),
        }
    }

    /// Pull the free-text annotation straight out of the raw document.
    ///
    /// Independent of [`parse`](Self::parse): either one may succeed while the
    /// other fails.
    pub fn annotation(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Format::FictionBook2 => fb2::annotation(bytes),
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
