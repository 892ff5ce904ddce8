//! memory.rs
//!
//! A backend holding its whole corpus in memory. It is the storage behind
//! [`crate::json_backend::JsonBackend`] and is handy on its own for
//! embedding small datasets.

use async_trait::async_trait;
use regex::Regex;

use crate::backend::{Capabilities, LookupBackend};
use crate::error::BackendError;
use crate::reference::{ParsedReference, VerseSelector};
use crate::verse::VerseRecord;

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    verses: Vec<VerseRecord>,
    books: Option<Vec<String>>,
}

impl MemoryBackend {
    /// Creates a backend keyed by free-text book names (no book listing).
    pub fn new(verses: Vec<VerseRecord>) -> Self {
        MemoryBackend { verses, books: None }
    }

    /// Advertises `books` as the authoritative book list.
    pub fn with_books(mut self, books: Vec<String>) -> Self {
        self.books = Some(books);
        self
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    fn chapter<'a>(&'a self, address: &'a ParsedReference) -> impl Iterator<Item = &'a VerseRecord> {
        self.verses
            .iter()
            .filter(move |v| v.book == address.book && v.chapter == address.chapter)
    }
}

#[async_trait]
impl LookupBackend for MemoryBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            list_books: self.books.is_some(),
            search: true,
        }
    }

    async fn fetch_verses(&self, address: &ParsedReference) -> Result<Vec<VerseRecord>, BackendError> {
        let found = match &address.selector {
            // Explicit lists come back in the order they were asked for.
            VerseSelector::List(verses) => verses
                .iter()
                .filter_map(|verse| self.chapter(address).find(|v| &v.verse == verse))
                .cloned()
                .collect(),
            selector => {
                let mut found: Vec<VerseRecord> = self
                    .chapter(address)
                    .filter(|v| selector.contains(&v.verse))
                    .cloned()
                    .collect();
                if let VerseSelector::Range { .. } = selector {
                    found.sort_by_key(|v| v.verse.parse::<u32>().unwrap_or(u32::MAX));
                }
                found
            }
        };
        Ok(found)
    }

    async fn list_books(&self) -> Result<Vec<String>, BackendError> {
        self.books
            .clone()
            .ok_or_else(|| BackendError::unsupported("list_books"))
    }

    async fn search(&self, pattern: &Regex) -> Result<Vec<VerseRecord>, BackendError> {
        Ok(self
            .verses
            .iter()
            .filter(|v| pattern.is_match(&v.text))
            .cloned()
            .collect())
    }
}
