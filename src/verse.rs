//! verse.rs
//!
//! The verse record returned by every backend, and the text clean-up
//! applied to resolved verses before they are handed to callers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches an opening or closing markup tag, including one left
/// unterminated at the end of the text.
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+(>|$)").unwrap());

/// One verse as served by a backend.
///
/// Field aliases accept the column names of the Romanian dataset
/// (`carte`, `capitol`, `verset`, `tip`) and the `bookname` field some
/// backends use for search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    #[serde(alias = "carte", alias = "bookname")]
    pub book: String,
    #[serde(alias = "capitol")]
    pub chapter: String,
    #[serde(alias = "verset")]
    pub verse: String,
    #[serde(rename = "type", alias = "tip", default)]
    pub kind: String,
    pub text: String,
}

impl VerseRecord {
    pub fn new(
        book: impl Into<String>,
        chapter: impl Into<String>,
        verse: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        VerseRecord {
            book: book.into(),
            chapter: chapter.into(),
            verse: verse.into(),
            kind: String::new(),
            text: text.into(),
        }
    }

    /// Strips markup and asterisks from the text in place.
    pub fn clean(&mut self) {
        self.text = strip_markup(&self.text);
    }
}

/// Removes markup tags and literal `*` characters.
///
/// Applying it twice gives the same result as applying it once.
pub fn strip_markup(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, "");
    without_tags.replace('*', "")
}
