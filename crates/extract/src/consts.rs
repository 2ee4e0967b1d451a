use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// The `encoding` pseudo-attribute of an XML declaration.
regex!(DECLARED_ENCODING_REGEX, r#"^\s*<\?xml[^>]*?\bencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#);
regex!(WHITESPACE_REGEX, r"\s+");

/// Bytes at the start of a document searched for the XML declaration.
pub(crate) const DECLARATION_WINDOW: usize = 256;
