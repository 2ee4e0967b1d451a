use super::Series;

/// Details of the printed edition a document was made from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishInfo {
    /// Title of the printed edition
    pub book_name: Option<String>,
    pub publisher: Option<String>,
    pub city: Option<String>,
    pub year: Option<String>,
    pub isbn: Option<String>,
    /// Publisher's own series (distinct from the title-info series).
    pub series: Vec<Series>,
}
