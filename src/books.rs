//! books.rs
//!
//! Tolerant book-name matching. A possibly misspelled book candidate is
//! scored against a backend's authoritative book list using Levenshtein
//! edit distance, and the closest entry wins.

use strsim::levenshtein;

use crate::error::Error;

/// Returns the entry of `books` with the smallest edit distance to `candidate`.
///
/// Ties go to the entry that appears first in `books`. Returns `None` only
/// when `books` is empty. The comparison is case-sensitive.
pub fn best_match<'a, S: AsRef<str>>(candidate: &str, books: &'a [S]) -> Option<&'a str> {
    best_match_with_distance(candidate, books).map(|(book, _)| book)
}

fn best_match_with_distance<'a, S: AsRef<str>>(
    candidate: &str,
    books: &'a [S],
) -> Option<(&'a str, usize)> {
    let mut best: Option<(&'a str, usize)> = None;
    for book in books {
        let book = book.as_ref();
        let distance = levenshtein(candidate, book);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((book, distance)),
        }
        if distance == 0 {
            break;
        }
    }
    best
}

/// Resolves `candidate` to a canonical book name.
///
/// With `max_distance` set, a best match further away than that many edits
/// is rejected. Fails with [`Error::BookNotFound`] for an empty list.
pub fn match_book<S: AsRef<str>>(
    candidate: &str,
    books: &[S],
    max_distance: Option<usize>,
) -> Result<String, Error> {
    let not_found = || Error::BookNotFound {
        candidate: candidate.to_string(),
    };
    let (book, distance) = best_match_with_distance(candidate, books).ok_or_else(not_found)?;
    if let Some(max) = max_distance {
        if distance > max {
            tracing::debug!(candidate, book, distance, max, "book match rejected");
            return Err(not_found());
        }
    }
    tracing::trace!(candidate, book, distance, "book matched");
    Ok(book.to_string())
}
