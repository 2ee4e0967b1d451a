/// A base64 payload embedded in the document (usually an image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub id: String,
    /// Declared media type, e.g. `image/jpeg`
    pub content_type: Option<String>,
    /// Base64 text exactly as found in the document (may contain line breaks).
    pub data: String,
}

/// Reference from the title page to the binary holding the cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverRef {
    /// Identifier of the [`Binary`], with any leading `#` already stripped.
    pub id: String,
    pub alt: Option<String>,
    pub title: Option<String>,
}
impl CoverRef {
    pub fn new(href: impl AsRef<str>) -> Self {
        let href = href.as_ref().trim();
        Self {
            id: href.strip_prefix('#').unwrap_or(href).to_string(),
            alt: None,
            title: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_ref_strips_fragment_marker() {
        assert_eq!(CoverRef::new("#cover.jpg").id, "cover.jpg");
        assert_eq!(CoverRef::new("cover.jpg").id, "cover.jpg");
        assert_eq!(CoverRef::new(" #cover.jpg ").id, "cover.jpg");
    }

    #[test]
    fn test_cover_ref_strips_only_one_marker() {
        assert_eq!(CoverRef::new("##c").id, "#c");
        assert_eq!(CoverRef::new("#").id, "");
    }
}
