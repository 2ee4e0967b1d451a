//! FictionBook 2 documents.
//!
//! Two independent passes over the same bytes:
//! - [`parse`] maps the `<description>` and `<binary>` elements onto a
//!   [`ParsedDocument`] through serde, and
//! - [`annotation`] walks the raw event stream for the first `<annotation>`
//!   element, wherever it lives.
//!
//! Neither depends on the other, so a document with a broken description can
//! still yield an annotation and vice versa.

mod decode;
mod schema;

use exn::ResultExt;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use crate::consts::WHITESPACE_REGEX;
use crate::error::{ErrorKind, Result};
use crate::models::ParsedDocument;

const ANNOTATION: &[u8] = b"annotation";

/// Parse the structured metadata of a FictionBook 2 document.
///
/// # Errors
///
/// - [`MalformedDocument`](ErrorKind::MalformedDocument) if the bytes are not
///   well-formed XML (after decoding),
/// - [`MissingField`](ErrorKind::MissingField) if the document has no
///   description, title info, or (non-blank) book title.
#[instrument(level = "debug", skip(bytes), fields(size = bytes.len()))]
pub fn parse(bytes: &[u8]) -> Result<ParsedDocument> {
    let text = decode::decode(bytes);
    let book: schema::FictionBook = quick_xml::de::from_str(&text).or_raise(|| ErrorKind::MalformedDocument)?;
    let document = ParsedDocument::try_from(book)?;
    debug!(
        title = %document.title,
        authors = document.authors.len(),
        binaries = document.binaries.len(),
        "parsed document"
    );
    Ok(document)
}

/// Text content of the first `<annotation>` element in the document.
///
/// Nested markup is flattened and runs of whitespace collapse to a single
/// space. Returns `None` when there is no annotation, when it holds no text,
/// or when the document can't be read far enough to find one.
#[instrument(level = "debug", skip(bytes), fields(size = bytes.len()))]
pub fn annotation(bytes: &[u8]) -> Option<String> {
    let text = decode::decode(bytes);
    match annotation_text(&text) {
        Ok(Some(raw)) => {
            let cleaned = WHITESPACE_REGEX.replace_all(raw.trim(), " ").into_owned();
            (!cleaned.is_empty()).then_some(cleaned)
        },
        Ok(None) => None,
        Err(error) => {
            debug!(%error, "could not extract annotation");
            None
        },
    }
}

fn annotation_text(xml: &str) -> std::result::Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut collected: Option<String> = None;
    // Depth of elements opened inside the annotation (the annotation itself is 1).
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth > 0 {
                    depth += 1;
                } else if e.local_name().as_ref() == ANNOTATION {
                    depth = 1;
                    collected = Some(String::new());
                }
            },
            Event::Empty(e) if depth == 0 && e.local_name().as_ref() == ANNOTATION => {
                return Ok(Some(String::new()));
            },
            Event::End(_) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Ok(collected);
                }
            },
            Event::Text(e) if depth > 0 => {
                if let Some(buffer) = collected.as_mut() {
                    buffer.push_str(&e.unescape()?);
                }
            },
            Event::CData(e) if depth > 0 => {
                if let Some(buffer) = collected.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&e));
                }
            },
            Event::Eof => return Ok(None),
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, Series};

    const FULL: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink">
  <description>
    <title-info>
      <genre>sf-fantasy</genre>
      <genre></genre>
      <genre match="80">prose_classic</genre>
      <author>
        <first-name>Jane</first-name>
        <middle-name/>
        <last-name>Doe</last-name>
        <home-page>https://example.com/jane</home-page>
        <email>jane@example.com</email>
      </author>
      <author>
        <nickname>anon</nickname>
      </author>
      <book-title>The Title</book-title>
      <annotation>
        <p>First   paragraph.</p>
        <p>Second &amp; last.</p>
      </annotation>
      <keywords>magic, dragons</keywords>
      <coverpage><image l:href="#cover.png" alt="Front"/></coverpage>
      <lang>en</lang>
      <translator><first-name>Tom</first-name><last-name>Lator</last-name></translator>
      <sequence name="Chronicles" number="2"/>
    </title-info>
    <document-info>
      <author><nickname>converter</nickname></author>
    </document-info>
    <publish-info>
      <book-name>The Title (print)</book-name>
      <publisher>Pub House</publisher>
      <city>Springfield</city>
      <year>2001</year>
      <isbn>978-3-16-148410-0</isbn>
      <sequence name="Pub Series" number="7"/>
    </publish-info>
  </description>
  <body>
    <section><title><p>Chapter 1</p></title><p>Once <emphasis>upon</emphasis> a time.</p></section>
  </body>
  <binary id="cover.png" content-type="image/png">iVBORw0KGgo=</binary>
  <binary id="other.jpg" content-type="image/jpeg">/9j/4AAQ</binary>
</FictionBook>
"##;

    fn minimal(title_info: &str) -> String {
        format!("<FictionBook><description><title-info>{title_info}</title-info></description></FictionBook>")
    }

    #[test]
    fn test_parse_full_document() {
        let document = parse(FULL.as_bytes()).unwrap();
        assert_eq!(document.title, "The Title");
        assert_eq!(document.genres, vec!["sf_fantasy", "prose_classic"]);
        assert_eq!(document.author_names().as_deref(), Some("Jane Doe, anon"));
        assert_eq!(document.authors[0].home_pages, vec!["https://example.com/jane"]);
        assert_eq!(document.authors[0].emails, vec!["jane@example.com"]);
        assert_eq!(document.authors[0].middle_name, None);
        assert_eq!(document.translator_names().as_deref(), Some("Tom Lator"));
        assert_eq!(document.keywords.as_deref(), Some("magic, dragons"));
        assert_eq!(document.language.as_deref(), Some("en"));
        assert_eq!(document.latest_series(), Some(&Series::new("Chronicles", Some("2"))));

        let publish = document.publish_info.as_ref().unwrap();
        assert_eq!(publish.book_name.as_deref(), Some("The Title (print)"));
        assert_eq!(publish.publisher.as_deref(), Some("Pub House"));
        assert_eq!(publish.city.as_deref(), Some("Springfield"));
        assert_eq!(publish.year.as_deref(), Some("2001"));
        assert_eq!(publish.isbn.as_deref(), Some("978-3-16-148410-0"));
        assert_eq!(publish.series, vec![Series::new("Pub Series", Some("7"))]);

        let cover = document.cover.as_ref().unwrap();
        assert_eq!(cover.id, "cover.png");
        assert_eq!(cover.alt.as_deref(), Some("Front"));
        assert_eq!(document.binaries.len(), 2);
        let binary = document.cover_binary().unwrap();
        assert_eq!(binary.content_type.as_deref(), Some("image/png"));
        assert_eq!(binary.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_parse_minimal_document() {
        let document = parse(minimal("<book-title>T</book-title>").as_bytes()).unwrap();
        assert_eq!(document, ParsedDocument::new("T"));
    }

    #[test]
    fn test_parse_keeps_series_order() {
        let xml = minimal(r#"<book-title>T</book-title><sequence name="A" number="1"/><sequence name="B" number="3"/><sequence number="9"/>"#);
        let document = parse(xml.as_bytes()).unwrap();
        assert_eq!(document.series, vec![Series::new("A", Some("1")), Series::new("B", Some("3"))]);
        assert_eq!(document.latest_series(), Some(&Series::new("B", Some("3"))));
    }

    #[test]
    fn test_parse_xlink_prefix() {
        let xml = r##"<FictionBook xmlns:xlink="http://www.w3.org/1999/xlink"><description><title-info>
            <book-title>T</book-title><coverpage><image xlink:href="#c.jpg"/></coverpage>
        </title-info></description></FictionBook>"##;
        let document = parse(xml.as_bytes()).unwrap();
        assert_eq!(document.cover.map(|c| c.id).as_deref(), Some("c.jpg"));
    }

    #[test]
    fn test_parse_windows_1251() {
        let mut bytes = br#"<?xml version="1.0" encoding="windows-1251"?><FictionBook><description><title-info><author><first-name>"#.to_vec();
        // "Лев"
        bytes.extend_from_slice(&[0xCB, 0xE5, 0xE2]);
        bytes.extend_from_slice(b"</first-name></author><book-title>T</book-title></title-info></description></FictionBook>");
        let document = parse(&bytes).unwrap();
        assert_eq!(document.authors, vec![Person { first_name: Some("Лев".to_string()), ..Person::default() }]);
    }

    #[test]
    fn test_parse_missing_title() {
        let err = parse(minimal("<lang>en</lang>").as_bytes()).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("book-title"));
        let err = parse(minimal("<book-title>   </book-title>").as_bytes()).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("book-title"));
    }

    #[test]
    fn test_parse_missing_description() {
        let err = parse(b"<FictionBook><body/></FictionBook>").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("description"));
        let err = parse(b"<FictionBook><description><publish-info/></description></FictionBook>").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("title-info"));
    }

    #[test]
    fn test_parse_garbage() {
        for bytes in [&b""[..], b"not xml at all", b"<FictionBook><description>", b"\x00\x01\x02"] {
            assert!(parse(bytes).is_err());
        }
    }

    #[test]
    fn test_annotation() {
        assert_eq!(annotation(FULL.as_bytes()).as_deref(), Some("First paragraph. Second & last."));
    }

    #[test]
    fn test_annotation_without_structure() {
        // No title, so the structured pass fails, but the annotation is still there.
        let xml = minimal("<annotation><![CDATA[raw\n\ttext]]></annotation>");
        assert!(parse(xml.as_bytes()).is_err());
        assert_eq!(annotation(xml.as_bytes()).as_deref(), Some("raw text"));
    }

    #[test]
    fn test_annotation_absent_or_empty() {
        assert_eq!(annotation(minimal("<book-title>T</book-title>").as_bytes()), None);
        assert_eq!(annotation(minimal("<annotation/>").as_bytes()), None);
        assert_eq!(annotation(minimal("<annotation> <p>  </p> </annotation>").as_bytes()), None);
        assert_eq!(annotation(b"<<<"), None);
    }

    #[test]
    fn test_annotation_first_wins() {
        let xml = "<a><annotation>one</annotation><annotation>two</annotation></a>";
        assert_eq!(annotation(xml.as_bytes()).as_deref(), Some("one"));
    }
}
