//! backend.rs
//!
//! The lookup backend interface. A backend serves verse text for one
//! language or edition; fetching verses is mandatory, listing canonical
//! book names and searching are optional capabilities advertised through
//! [`Capabilities`].

use async_trait::async_trait;
use regex::Regex;

use crate::error::BackendError;
use crate::reference::ParsedReference;
use crate::verse::VerseRecord;

/// The optional operations a backend implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// `list_books` returns the authoritative book list. When set, book
    /// candidates are corrected with the book matcher before fetching.
    pub list_books: bool,
    /// `search` evaluates a pattern across the corpus.
    pub search: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Capabilities {
            list_books: true,
            search: true,
        }
    }
}

#[async_trait]
pub trait LookupBackend: Send + Sync {
    /// Declares which optional operations are implemented. Read once when
    /// a cache or search facade is built on top of the backend.
    fn capabilities(&self) -> Capabilities;

    /// Returns the verses addressed by `address`.
    async fn fetch_verses(&self, address: &ParsedReference) -> Result<Vec<VerseRecord>, BackendError>;

    /// Returns the authoritative book list.
    async fn list_books(&self) -> Result<Vec<String>, BackendError> {
        Err(BackendError::unsupported("list_books"))
    }

    /// Returns every verse whose text matches `pattern`.
    async fn search(&self, _pattern: &Regex) -> Result<Vec<VerseRecord>, BackendError> {
        Err(BackendError::unsupported("search"))
    }
}
