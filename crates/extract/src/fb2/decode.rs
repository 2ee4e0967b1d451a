use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::consts::{DECLARATION_WINDOW, DECLARED_ENCODING_REGEX};

/// Decode a raw document into text.
///
/// A byte-order mark takes priority, then the encoding named by the XML
/// declaration, then UTF-8. Invalid sequences become U+FFFD rather than
/// failing; the XML parser will reject the document later if it matters.
pub(crate) fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => declared_encoding(bytes).unwrap_or(UTF_8),
    };
    // `decode` sniffs (and strips) the BOM itself.
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "document contained malformed byte sequences");
    }
    text
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let head = String::from_utf8_lossy(head);
    let label = DECLARED_ENCODING_REGEX.captures(&head)?.get(1)?.as_str();
    let encoding = Encoding::for_label(label.as_bytes());
    if encoding.is_none() {
        debug!(label, "unknown encoding label in XML declaration");
    }
    encoding
}
