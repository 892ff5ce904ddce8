//! bible.rs
//!
//! One Bible edition: a backend together with its reference cache and
//! search facade.
//!
//! ```no_run
//! use scriptura::{bootstrap, Bible, BibleConfig, BibleOptions, CacheConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = BibleConfig::from_path("bible.json")?;
//! let languages = bootstrap::init(&config).await?;
//! let ro = Bible::open(&languages, &BibleOptions::new("ro"), CacheConfig::default()).await?;
//! for verse in ro.fetch("Psalmii 1:1-6").await?.iter() {
//!     println!("{} | {}", verse.verse, verse.text);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::backend::LookupBackend;
use crate::bootstrap::Languages;
use crate::cache::{CoalescingCache, Resolution};
use crate::config::{BibleOptions, CacheConfig};
use crate::error::Error;
use crate::json_backend::JsonBackend;
use crate::search::{Query, SearchFacade};
use crate::verse::VerseRecord;

#[derive(Clone)]
pub struct Bible {
    language: String,
    cache: CoalescingCache,
    search: SearchFacade,
}

impl Bible {
    pub fn new(language: &str, backend: Arc<dyn LookupBackend>, config: CacheConfig) -> Self {
        Bible {
            language: language.to_lowercase(),
            cache: CoalescingCache::new(backend.clone(), config),
            search: SearchFacade::new(backend),
        }
    }

    /// Opens the installed edition for `options.language()`.
    pub async fn open(
        languages: &Languages,
        options: &BibleOptions,
        config: CacheConfig,
    ) -> Result<Self, Error> {
        let installed = languages
            .get(options.language())
            .ok_or_else(|| Error::LanguageNotFound(options.language().to_string()))?;
        let backend = JsonBackend::open(&installed.path).await?;
        Ok(Bible::new(options.language(), Arc::new(backend), config))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn cache(&self) -> &CoalescingCache {
        &self.cache
    }

    /// Resolves `reference` and passes the verses to `callback`.
    ///
    /// See [`CoalescingCache::resolve`] for delivery guarantees.
    pub fn get<F>(&self, reference: &str, callback: F) -> &Self
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        self.cache.resolve(reference, callback);
        self
    }

    pub async fn fetch(&self, reference: &str) -> Resolution {
        self.cache.get(reference).await
    }

    pub fn search_with<F>(&self, query: impl Into<Query>, callback: F) -> &Self
    where
        F: FnOnce(Result<Vec<VerseRecord>, Error>) + Send + 'static,
    {
        self.search.search_with(query, callback);
        self
    }

    pub async fn search(&self, query: impl Into<Query>) -> Result<Vec<VerseRecord>, Error> {
        self.search.search(query).await
    }
}
