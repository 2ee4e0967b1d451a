use super::{Binary, CoverRef, Person, PublishInfo, Series, join_names};

/// Bibliographic metadata parsed out of a single document.
///
/// Built fresh for every file and thrown away once it has been projected onto
/// a persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Book title (the only required field)
    pub title: String,
    pub authors: Vec<Person>,
    pub translators: Vec<Person>,
    /// Genre tags, normalized on construction (see [`normalize_genres`])
    pub genres: Vec<String>,
    /// Comma separated keywords, as written in the document
    pub keywords: Option<String>,
    /// Language code, e.g. `en`
    pub language: Option<String>,
    /// Series memberships in document order
    pub series: Vec<Series>,
    pub publish_info: Option<PublishInfo>,
    pub cover: Option<CoverRef>,
    pub binaries: Vec<Binary>,
}

impl ParsedDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// All authors' full names, joined with `", "`.
    pub fn author_names(&self) -> Option<String> {
        join_names(&self.authors)
    }

    /// All translators' full names, joined with `", "`.
    pub fn translator_names(&self) -> Option<String> {
        join_names(&self.translators)
    }

    /// The authoritative series entry.
    ///
    /// Documents list series in supersede order, so the last one wins.
    pub fn latest_series(&self) -> Option<&Series> {
        self.series.last()
    }

    /// The embedded binary the cover page points to, if it exists.
    pub fn cover_binary(&self) -> Option<&Binary> {
        let cover = self.cover.as_ref()?;
        self.binaries.iter().find(|binary| binary.id == cover.id)
    }
}

/// Drops empty genres and replaces hyphens with underscores.
pub fn normalize_genres(genres: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    genres
        .into_iter()
        .map(|genre| genre.as_ref().trim().replace('-', "_"))
        .filter(|genre| !genre.is_empty())
        .collect()
}
