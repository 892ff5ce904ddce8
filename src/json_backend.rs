//! json_backend.rs
//!
//! A file backend for one installed language. The language directory holds:
//!
//! - `verses.json`: an array of verse records,
//! - `books.json` (optional): the canonical book list, either as plain
//!   names or as `{"numar": "1", "carte": "Geneza"}` objects.
//!
//! The book list, when present, enables book-name correction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::backend::{Capabilities, LookupBackend};
use crate::error::BackendError;
use crate::fileio::read_json;
use crate::memory::MemoryBackend;
use crate::reference::ParsedReference;
use crate::verse::VerseRecord;

pub const VERSES_FILE: &str = "verses.json";
pub const BOOKS_FILE: &str = "books.json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BookEntry {
    Name(String),
    // Any other columns (such as `numar`) are ignored.
    Numbered {
        #[serde(alias = "carte")]
        book: String,
    },
}

impl BookEntry {
    fn into_name(self) -> String {
        match self {
            BookEntry::Name(name) => name,
            BookEntry::Numbered { book } => book,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonBackend {
    root: PathBuf,
    inner: MemoryBackend,
}

impl JsonBackend {
    /// Loads the dataset stored under `root`.
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, BackendError> {
        let root = root.as_ref().to_path_buf();
        let verses: Vec<VerseRecord> = read_json(root.join(VERSES_FILE)).await?;

        let books_path = root.join(BOOKS_FILE);
        let mut inner = MemoryBackend::new(verses);
        if tokio::fs::try_exists(&books_path).await? {
            let entries: Vec<BookEntry> = read_json(&books_path).await?;
            inner = inner.with_books(entries.into_iter().map(BookEntry::into_name).collect());
        }

        tracing::debug!(root = %root.display(), verses = inner.len(), "loaded json dataset");
        Ok(JsonBackend { root, inner })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl LookupBackend for JsonBackend {
    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    async fn fetch_verses(&self, address: &ParsedReference) -> Result<Vec<VerseRecord>, BackendError> {
        self.inner.fetch_verses(address).await
    }

    async fn list_books(&self) -> Result<Vec<String>, BackendError> {
        self.inner.list_books().await
    }

    async fn search(&self, pattern: &Regex) -> Result<Vec<VerseRecord>, BackendError> {
        self.inner.search(pattern).await
    }
}
