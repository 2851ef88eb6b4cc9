//! Text normalization and prefix matching

use std::borrow::Cow;

/// Case-folds text according to the widget configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    case_sensitive: bool,
}

impl Normalizer {
    /// Create a normalizer
    ///
    /// # Arguments
    /// * `case_sensitive` - When true, normalization is the identity
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    /// Normalize a string, borrowing it when no folding is needed
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.to_lowercase())
        }
    }
}

/// Prefix test on already-normalized strings.
///
/// True iff `haystack` starts with `needle`; this is a prefix match, not a
/// substring search.
pub fn matches(needle: &str, haystack: &str) -> bool {
    haystack.starts_with(needle)
}
