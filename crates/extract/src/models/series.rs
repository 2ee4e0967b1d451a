/// A book's membership in a series (FB2 `<sequence>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Series {
    /// Series name
    pub name: String,
    /// Volume within the series; free text, documents use "2", "2.5", "II"...
    pub number: Option<String>,
}
impl Series {
    pub fn new<N: Into<String>>(name: impl Into<String>, number: Option<N>) -> Self {
        Self {
            name: name.into(),
            number: number.map(Into::into),
        }
    }
}
