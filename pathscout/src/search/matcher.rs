use std::ffi::OsStr;

/// Case-sensitive substring match against an entry's base name.
///
/// Names are compared as raw bytes, so entries whose names are not valid
/// UTF-8 can still match an ASCII term.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    term: String,
}

impl NameMatcher {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }

    /// Returns true if `name` contains the term. The empty term matches everything.
    pub fn is_match(&self, name: &OsStr) -> bool {
        contains(name.as_encoded_bytes(), self.term.as_bytes())
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}
