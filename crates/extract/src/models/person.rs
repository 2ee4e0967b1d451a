use std::fmt::{Display, Formatter, Result as FmtResult};

/// A person credited on a book (author or translator).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Person {
    /// Identifier assigned by a library catalogue, if any
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub home_pages: Vec<String>,
    pub emails: Vec<String>,
}
impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Self::default()
        }
    }

    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    pub fn from_nickname(nickname: impl Into<String>) -> Self {
        Self {
            nickname: Some(nickname.into()),
            ..Self::default()
        }
    }

    /// Display name of the person.
    ///
    /// Non-blank name parts joined by single spaces, in `first middle last`
    /// order. When all three are blank, falls back to the nickname, and when
    /// there's no nickname either, to an empty string.
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            return self.nickname.as_deref().map(str::trim).unwrap_or_default().to_string();
        }
        parts.join(" ")
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.full_name())
    }
}

/// Joins the full names of several people with `", "`.
///
/// Returns `None` for an empty list, so that "nobody" and "somebody nameless"
/// stay distinguishable.
pub fn join_names<'a>(people: impl IntoIterator<Item = &'a Person>) -> Option<String> {
    let names: Vec<String> = people.into_iter().map(Person::full_name).collect();
    (!names.is_empty()).then(|| names.join(", "))
}
