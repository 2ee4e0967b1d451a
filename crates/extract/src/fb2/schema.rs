//! Serde mirror of the parts of a FictionBook 2 document we care about.
//!
//! Everything is optional here so that a document missing a required element
//! surfaces as [`MissingField`](ErrorKind::MissingField) instead of an opaque
//! deserializer message. Unknown elements (the whole `<body>`, `<stylesheet>`,
//! `<document-info>`...) are skipped.

use exn::OptionExt;
use serde::Deserialize;

use crate::error::{Error, ErrorKind};
use crate::models::{Binary, CoverRef, ParsedDocument, Person, PublishInfo, Series, normalize_genres};

#[derive(Debug, Deserialize)]
pub(super) struct FictionBook {
    description: Option<Description>,
    #[serde(rename = "binary", default)]
    binaries: Vec<BinaryElement>,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(rename = "title-info")]
    title_info: Option<TitleInfo>,
    #[serde(rename = "publish-info")]
    publish_info: Option<PublishInfoElement>,
}

#[derive(Debug, Deserialize)]
struct TitleInfo {
    #[serde(rename = "genre", default)]
    genres: Vec<Genre>,
    #[serde(rename = "author", default)]
    authors: Vec<PersonElement>,
    #[serde(rename = "book-title")]
    book_title: Option<String>,
    keywords: Option<String>,
    lang: Option<String>,
    #[serde(rename = "translator", default)]
    translators: Vec<PersonElement>,
    #[serde(rename = "sequence", default)]
    sequences: Vec<Sequence>,
    coverpage: Option<Coverpage>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct PersonElement {
    #[serde(rename = "first-name")]
    first_name: Option<String>,
    #[serde(rename = "middle-name")]
    middle_name: Option<String>,
    #[serde(rename = "last-name")]
    last_name: Option<String>,
    nickname: Option<String>,
    #[serde(rename = "home-page", default)]
    home_pages: Vec<String>,
    #[serde(rename = "email", default)]
    emails: Vec<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Sequence {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@number")]
    number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Coverpage {
    #[serde(rename = "image", default)]
    images: Vec<Image>,
}

// Attribute names keep their namespace prefix, and documents disagree on which
// prefix to bind the xlink namespace to.
#[derive(Debug, Deserialize)]
struct Image {
    #[serde(rename = "@l:href", alias = "@xlink:href", alias = "@href")]
    href: Option<String>,
    #[serde(rename = "@alt")]
    alt: Option<String>,
    #[serde(rename = "@title")]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishInfoElement {
    #[serde(rename = "book-name")]
    book_name: Option<String>,
    publisher: Option<String>,
    city: Option<String>,
    year: Option<String>,
    isbn: Option<String>,
    #[serde(rename = "sequence", default)]
    sequences: Vec<Sequence>,
}

#[derive(Debug, Deserialize)]
struct BinaryElement {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@content-type")]
    content_type: Option<String>,
    #[serde(rename = "$text", default)]
    data: String,
}

/// Trimmed text, or `None` when there's nothing but whitespace.
fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn series(sequences: Vec<Sequence>) -> Vec<Series> {
    sequences
        .into_iter()
        .filter_map(|sequence| Some(Series::new(text(sequence.name)?, text(sequence.number))))
        .collect()
}

impl From<PersonElement> for Person {
    fn from(value: PersonElement) -> Self {
        Self {
            id: text(value.id),
            first_name: text(value.first_name),
            middle_name: text(value.middle_name),
            last_name: text(value.last_name),
            nickname: text(value.nickname),
            home_pages: value.home_pages.into_iter().filter_map(|v| text(Some(v))).collect(),
            emails: value.emails.into_iter().filter_map(|v| text(Some(v))).collect(),
        }
    }
}

impl From<PublishInfoElement> for PublishInfo {
    fn from(value: PublishInfoElement) -> Self {
        Self {
            book_name: text(value.book_name),
            publisher: text(value.publisher),
            city: text(value.city),
            year: text(value.year),
            isbn: text(value.isbn),
            series: series(value.sequences),
        }
    }
}

impl Coverpage {
    fn into_cover(self) -> Option<CoverRef> {
        let image = self.images.into_iter().find(|image| image.href.is_some())?;
        let mut cover = CoverRef::new(image.href?);
        cover.alt = text(image.alt);
        cover.title = text(image.title);
        (!cover.id.is_empty()).then_some(cover)
    }
}

impl TryFrom<FictionBook> for ParsedDocument {
    type Error = Error;

    fn try_from(book: FictionBook) -> Result<Self, Self::Error> {
        let description = book.description.ok_or_raise(|| ErrorKind::MissingField("description"))?;
        let title_info = description.title_info.ok_or_raise(|| ErrorKind::MissingField("title-info"))?;
        let title = text(title_info.book_title).ok_or_raise(|| ErrorKind::MissingField("book-title"))?;
        Ok(Self {
            title,
            authors: title_info.authors.into_iter().map(Person::from).collect(),
            translators: title_info.translators.into_iter().map(Person::from).collect(),
            genres: normalize_genres(title_info.genres.iter().map(|genre| genre.value.as_str())),
            keywords: text(title_info.keywords),
            language: text(title_info.lang),
            series: series(title_info.sequences),
            publish_info: description.publish_info.map(PublishInfo::from),
            cover: title_info.coverpage.and_then(Coverpage::into_cover),
            binaries: book
                .binaries
                .into_iter()
                .filter_map(|binary| {
                    Some(Binary {
                        id: text(binary.id)?,
                        content_type: text(binary.content_type),
                        data: binary.data,
                    })
                })
                .collect(),
        })
    }
}
