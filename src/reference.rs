//! reference.rs
//!
//! Parses a human-written scripture reference into a [`ParsedReference`].
//!
//! The accepted shapes are:
//!
//! ```text
//! Genesis 1        - the whole chapter
//! Genesis 1:1      - one verse
//! Genesis 1:1,3    - an explicit list of verses, kept in the given order
//! Genesis 1:1-10   - an inclusive range, expanded verse by verse
//! ```
//!
//! The book is everything before the last space and is kept verbatim
//! (including any surrounding whitespace); fixing misspellings is the job
//! of [`crate::books`].

use crate::error::ParseError;

/// Which verses of a chapter a reference asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerseSelector {
    /// The whole chapter.
    All,
    Single(String),
    /// Comma-separated verses in the order they were written.
    List(Vec<String>),
    /// Inclusive range; `first <= last` always holds.
    Range { first: u32, last: u32 },
}

impl VerseSelector {
    /// Returns the requested verse numbers in order, or `None` for [`VerseSelector::All`].
    pub fn verses(&self) -> Option<Vec<String>> {
        match self {
            VerseSelector::All => None,
            VerseSelector::Single(verse) => Some(vec![verse.clone()]),
            VerseSelector::List(verses) => Some(verses.clone()),
            VerseSelector::Range { first, last } => {
                Some((*first..=*last).map(|v| v.to_string()).collect())
            }
        }
    }

    /// Returns `true` if `verse` is selected.
    pub fn contains(&self, verse: &str) -> bool {
        match self {
            VerseSelector::All => true,
            VerseSelector::Single(v) => v == verse,
            VerseSelector::List(verses) => verses.iter().any(|v| v == verse),
            VerseSelector::Range { first, last } => verse
                .parse::<u32>()
                .map(|n| n >= *first && n <= *last)
                .unwrap_or(false),
        }
    }
}

/// A reference split into book, chapter and verse selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub book: String,
    pub chapter: String,
    pub selector: VerseSelector,
}

impl ParsedReference {
    /// Returns a copy addressed to `book`, used once the canonical name is known.
    pub fn with_book(&self, book: impl Into<String>) -> Self {
        ParsedReference {
            book: book.into(),
            chapter: self.chapter.clone(),
            selector: self.selector.clone(),
        }
    }
}

fn is_numeral(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn parse_bound(reference: &str, s: &str) -> Result<u32, ParseError> {
    let invalid = || ParseError::InvalidVerse {
        reference: reference.to_string(),
        verse: s.to_string(),
    };
    if !is_numeral(s) {
        return Err(invalid());
    }
    s.parse::<u32>().map_err(|_| invalid())
}

fn parse_selector(reference: &str, verses: &str) -> Result<VerseSelector, ParseError> {
    if let Some((first, last)) = verses.split_once('-') {
        let first = parse_bound(reference, first)?;
        let last = parse_bound(reference, last)?;
        if first > last {
            return Err(ParseError::ReversedRange {
                reference: reference.to_string(),
                first,
                last,
            });
        }
        return Ok(VerseSelector::Range { first, last });
    }

    let mut list = Vec::new();
    for piece in verses.split(',') {
        if !is_numeral(piece) {
            return Err(ParseError::InvalidVerse {
                reference: reference.to_string(),
                verse: piece.to_string(),
            });
        }
        list.push(piece.to_string());
    }

    if list.len() == 1 {
        Ok(VerseSelector::Single(list.remove(0)))
    } else {
        Ok(VerseSelector::List(list))
    }
}

/// Parses `reference` into book, chapter and verse selector.
///
/// # Examples
///
/// ```
/// use scriptura::reference::{parse, VerseSelector};
///
/// let parsed = parse("Genesis 1:1-3").unwrap();
/// assert_eq!(parsed.book, "Genesis");
/// assert_eq!(parsed.chapter, "1");
/// assert_eq!(parsed.selector, VerseSelector::Range { first: 1, last: 3 });
/// ```
pub fn parse(reference: &str) -> Result<ParsedReference, ParseError> {
    let (book, token) = reference
        .rsplit_once(' ')
        .ok_or_else(|| ParseError::MissingChapter {
            reference: reference.to_string(),
        })?;

    if token.is_empty() {
        return Err(ParseError::MissingChapter {
            reference: reference.to_string(),
        });
    }

    let mut parts = token.split(':');
    let chapter = parts.next().unwrap_or_default();
    let verses = parts.next();
    if parts.next().is_some() {
        return Err(ParseError::TooManySeparators {
            reference: reference.to_string(),
        });
    }

    if !is_numeral(chapter) {
        return Err(ParseError::InvalidChapter {
            reference: reference.to_string(),
            chapter: chapter.to_string(),
        });
    }

    let selector = match verses {
        None => VerseSelector::All,
        Some(verses) => parse_selector(reference, verses)?,
    };

    Ok(ParsedReference {
        book: book.to_string(),
        chapter: chapter.to_string(),
        selector,
    })
}
