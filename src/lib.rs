//! Resolves human-written scripture references such as `"Genesis 1:1-10"`
//! into verse records, and searches a verse corpus with regular
//! expressions.
//!
//! The pieces, leaves first:
//!
//! 1. **[`reference`]**: parses `"Book chapter[:verses]"` into a
//!    [`ParsedReference`].
//! 2. **[`books`]**: corrects a misspelled book name against a backend's
//!    canonical book list by edit distance.
//! 3. **[`backend`]**: the [`LookupBackend`] interface that serves verse
//!    text for one edition ([`memory`] and [`json_backend`] implement it).
//! 4. **[`cache`]**: a [`CoalescingCache`] that resolves each distinct
//!    reference once, however many callers ask for it concurrently, and
//!    replays the outcome to later callers.
//! 5. **[`search`]**: validates `/pattern/flags` queries and hands them to
//!    backends that can search.
//!
//! [`Bible`] ties these together for one installed edition, and
//! [`bootstrap`] provisions editions on disk from a [`BibleConfig`].
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use scriptura::{Bible, CacheConfig, MemoryBackend, VerseRecord};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), scriptura::Error> {
//! let backend = MemoryBackend::new(vec![
//!     VerseRecord::new("Psalm", "1", "1", "Blessed is the man"),
//!     VerseRecord::new("Psalm", "1", "2", "But his delight"),
//! ]);
//! let bible = Bible::new("en", Arc::new(backend), CacheConfig::default());
//!
//! for verse in bible.fetch("Psalm 1:1-2").await?.iter() {
//!     println!("{} | {}", verse.verse, verse.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod bible;
pub mod books;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod fileio;
pub mod json_backend;
pub mod memory;
pub mod reference;
pub mod search;
pub mod verse;

pub use backend::{Capabilities, LookupBackend};
pub use bible::Bible;
pub use cache::{CoalescingCache, Resolution, Verses};
pub use config::{BibleConfig, BibleOptions, CacheConfig, FailurePolicy, VersionConfig};
pub use error::{BackendError, BootstrapError, ConfigError, Error, ParseError, QueryError};
pub use json_backend::JsonBackend;
pub use memory::MemoryBackend;
pub use reference::{parse, ParsedReference, VerseSelector};
pub use search::{Query, SearchFacade};
pub use verse::{strip_markup, VerseRecord};
