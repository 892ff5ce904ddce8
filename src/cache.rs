//! cache.rs
//!
//! A request-coalescing cache in front of a [`LookupBackend`].
//!
//! Every distinct reference string owns one slot in the table. The first
//! request for a reference creates a pending slot and starts the
//! resolution (parse, optional book correction, fetch, clean-up) on a
//! Tokio task; requests arriving while it runs are queued on the slot.
//! When the backend answers, the slot becomes done and every queued
//! callback is invoked once, in registration order, with the same result.
//! Later requests are answered from the slot without touching the backend.
//!
//! Keys are the raw reference strings: `"Genesis 1:1"` and `"Genesis  1:1"`
//! are different entries.
//!
//! # Locking
//!
//! The table sits behind one `std::sync::Mutex`. It is never held across
//! an `.await` or while a callback runs, so resolutions of different
//! references proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::oneshot;

use crate::backend::{Capabilities, LookupBackend};
use crate::books::match_book;
use crate::config::{CacheConfig, FailurePolicy};
use crate::error::{BackendError, Error};
use crate::reference::parse;
use crate::verse::VerseRecord;

/// Resolved verses, shared between every caller of the same reference.
pub type Verses = Arc<Vec<VerseRecord>>;

/// What a resolution delivers to its callers.
pub type Resolution = Result<Verses, Error>;

type Waiter = Box<dyn FnOnce(Resolution) + Send + 'static>;

enum Slot {
    Pending(Vec<Waiter>),
    Done {
        result: Resolution,
        completed_at: Instant,
    },
}

struct Inner {
    backend: Arc<dyn LookupBackend>,
    capabilities: Capabilities,
    config: CacheConfig,
    table: Mutex<HashMap<String, Slot>>,
}

/// Cheap-to-clone handle; clones share the same table.
#[derive(Clone)]
pub struct CoalescingCache {
    inner: Arc<Inner>,
}

enum Action {
    Replay(Resolution, Waiter),
    Queued,
    Start,
}

impl CoalescingCache {
    pub fn new(backend: Arc<dyn LookupBackend>, config: CacheConfig) -> Self {
        let capabilities = backend.capabilities();
        CoalescingCache {
            inner: Arc::new(Inner {
                backend,
                capabilities,
                config,
                table: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.inner.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, completed_at: Instant) -> bool {
        match self.inner.config.ttl {
            Some(ttl) => completed_at.elapsed() < ttl,
            None => true,
        }
    }

    /// Resolves `reference` and hands the outcome to `callback`.
    ///
    /// A cached outcome is delivered before this returns. Otherwise the
    /// callback runs on a Tokio task once the backend answers, so this must
    /// be called from within a Tokio runtime.
    pub fn resolve<F>(&self, reference: &str, callback: F)
    where
        F: FnOnce(Resolution) + Send + 'static,
    {
        let waiter: Waiter = Box::new(callback);
        let action = {
            let mut table = self.table();
            match table.get_mut(reference) {
                Some(Slot::Done {
                    result,
                    completed_at,
                }) if self.is_fresh(*completed_at) => Action::Replay(result.clone(), waiter),
                Some(Slot::Pending(waiters)) => {
                    waiters.push(waiter);
                    Action::Queued
                }
                _ => {
                    table.insert(reference.to_string(), Slot::Pending(vec![waiter]));
                    Action::Start
                }
            }
        };

        match action {
            Action::Replay(result, waiter) => {
                tracing::debug!(reference, "cache hit");
                waiter(result);
            }
            Action::Queued => tracing::trace!(reference, "queued on pending resolution"),
            Action::Start => {
                tracing::debug!(reference, "cache miss");
                self.spawn_resolution(reference.to_string());
            }
        }
    }

    /// Async form of [`CoalescingCache::resolve`].
    pub async fn get(&self, reference: &str) -> Resolution {
        let (tx, rx) = oneshot::channel();
        self.resolve(reference, move |result| {
            // The receiver only goes away if the caller stopped waiting.
            let _ = tx.send(result);
        });
        rx.await
            .unwrap_or_else(|_| Err(BackendError::new("resolution was dropped").into()))
    }

    fn spawn_resolution(&self, reference: String) {
        let cache = self.clone();
        tokio::spawn(async move {
            let task = {
                let cache = cache.clone();
                let reference = reference.clone();
                tokio::spawn(async move { cache.run(&reference).await })
            };
            // A panicking backend must not leave the waiters hanging.
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(BackendError::new(format!("resolution aborted: {}", err)).into()),
            };
            cache.complete(&reference, result);
        });
    }

    async fn run(&self, reference: &str) -> Resolution {
        let mut address = parse(reference)?;

        if self.inner.capabilities.list_books {
            let books = self.inner.backend.list_books().await?;
            let book = match_book(&address.book, &books, self.inner.config.max_book_distance)?;
            address = address.with_book(book);
        }

        let mut verses = self.inner.backend.fetch_verses(&address).await?;
        verses.iter_mut().for_each(VerseRecord::clean);
        Ok(Arc::new(verses))
    }

    fn complete(&self, reference: &str, result: Resolution) {
        if let Err(err) = &result {
            tracing::warn!(reference, error = %err, "resolution failed");
        }

        let keep = result.is_ok() || self.inner.config.failure_policy == FailurePolicy::CacheErrors;
        let waiters = {
            let mut table = self.table();
            let previous = if keep {
                table.insert(
                    reference.to_string(),
                    Slot::Done {
                        result: result.clone(),
                        completed_at: Instant::now(),
                    },
                )
            } else {
                table.remove(reference)
            };
            match previous {
                Some(Slot::Pending(waiters)) => waiters,
                _ => Vec::new(),
            }
        };

        tracing::debug!(reference, waiters = waiters.len(), "resolution complete");
        for waiter in waiters {
            waiter(result.clone());
        }
    }

    /// Drops the completed entry for `reference` so the next request
    /// resolves again. Pending entries are left alone; returns whether an
    /// entry was removed.
    pub fn invalidate(&self, reference: &str) -> bool {
        let mut table = self.table();
        let done = matches!(table.get(reference), Some(Slot::Done { .. }));
        if done {
            table.remove(reference);
        }
        done
    }

    /// Drops every completed entry.
    pub fn clear_completed(&self) {
        self.table().retain(|_, slot| matches!(slot, Slot::Pending(_)));
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.table().contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::reference::ParsedReference;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify};

    /// Counts calls and, when gated, holds every fetch until released.
    #[derive(Default)]
    struct GatedBackend {
        verses: Vec<VerseRecord>,
        books: Option<Vec<String>>,
        gated: bool,
        fail_fetch: bool,
        fail_books: bool,
        gate: Notify,
        fetches: AtomicUsize,
        book_lists: AtomicUsize,
        last_address: Mutex<Option<ParsedReference>>,
    }

    impl GatedBackend {
        fn new() -> Self {
            GatedBackend {
                verses: vec![
                    VerseRecord::new("Genesis", "1", "1", "<b>In the beginning</b> God created*"),
                    VerseRecord::new("Genesis", "1", "2", "And the earth was <i>without form</i>"),
                    VerseRecord::new("Genesis", "1", "3", "And God said"),
                ],
                ..Default::default()
            }
        }

        fn gated(mut self) -> Self {
            self.gated = true;
            self
        }

        fn with_books(mut self) -> Self {
            self.books = Some(vec!["Genesis".to_string(), "Exodus".to_string()]);
            self
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LookupBackend for GatedBackend {
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                list_books: self.books.is_some(),
                search: false,
            }
        }

        async fn fetch_verses(
            &self,
            address: &ParsedReference,
        ) -> Result<Vec<VerseRecord>, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            *self.last_address.lock().unwrap() = Some(address.clone());
            if self.gated {
                self.gate.notified().await;
            }
            if self.fail_fetch {
                return Err(BackendError::new("disk on fire"));
            }
            Ok(self
                .verses
                .iter()
                .filter(|v| v.book == address.book && address.selector.contains(&v.verse))
                .cloned()
                .collect())
        }

        async fn list_books(&self) -> Result<Vec<String>, BackendError> {
            self.book_lists.fetch_add(1, Ordering::SeqCst);
            if self.fail_books {
                return Err(BackendError::new("no index"));
            }
            Ok(self.books.clone().unwrap_or_default())
        }
    }

    fn cache_over(backend: &Arc<GatedBackend>, config: CacheConfig) -> CoalescingCache {
        CoalescingCache::new(backend.clone(), config)
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let backend = Arc::new(GatedBackend::new().gated());
        let cache = cache_over(&backend, CacheConfig::default());

        let order = Arc::new(Mutex::new(Vec::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        for i in 0..3 {
            let order = order.clone();
            let tx = tx.clone();
            cache.resolve("Genesis 1:1-3", move |result| {
                order.lock().unwrap().push(i);
                tx.send(result).unwrap();
            });
        }
        backend.gate.notify_one();

        let mut results = Vec::new();
        for _ in 0..3 {
            results.push(rx.recv().await.unwrap().unwrap());
        }

        assert_eq!(backend.fetches(), 1);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }

    #[tokio::test]
    async fn test_async_callers_are_coalesced() {
        let backend = Arc::new(GatedBackend::new().gated());
        let cache = cache_over(&backend, CacheConfig::default());

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get("Genesis 1").await }
        });
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get("Genesis 1").await }
        });
        tokio::task::yield_now().await;
        backend.gate.notify_one();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(backend.fetches(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_range_scenario_returns_clean_ordered_verses() {
        let backend = Arc::new(GatedBackend::new());
        let cache = cache_over(&backend, CacheConfig::default());

        let verses = cache.get("Genesis 1:1-3").await.unwrap();
        let numbers: Vec<&str> = verses.iter().map(|v| v.verse.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
        assert_eq!(verses[0].text, "In the beginning God created");
        assert_eq!(verses[1].text, "And the earth was without form");
    }

    #[tokio::test]
    async fn test_completed_entry_is_replayed_synchronously() {
        let backend = Arc::new(GatedBackend::new());
        let cache = cache_over(&backend, CacheConfig::default());
        let first = cache.get("Genesis 1:2").await.unwrap();

        let replayed = Arc::new(Mutex::new(None));
        let slot = replayed.clone();
        cache.resolve("Genesis 1:2", move |result| {
            *slot.lock().unwrap() = Some(result);
        });

        let replayed = replayed.lock().unwrap().take().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &replayed));
        assert_eq!(backend.fetches(), 1);
    }

    #[tokio::test]
    async fn test_parse_failure_never_reaches_backend() {
        let backend = Arc::new(GatedBackend::new().with_books());
        let cache = cache_over(&backend, CacheConfig::default());

        let err = cache.get("???").await.unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::MissingChapter { .. })));
        assert_eq!(backend.fetches(), 0);
        assert_eq!(backend.book_lists.load(Ordering::SeqCst), 0);

        // Replayed from the cache as well.
        assert_eq!(cache.get("???").await.unwrap_err(), err);
    }

    #[tokio::test]
    async fn test_backend_error_is_cached_by_default() {
        let backend = Arc::new(GatedBackend {
            fail_fetch: true,
            ..GatedBackend::new()
        });
        let cache = cache_over(&backend, CacheConfig::default());

        let first = cache.get("Genesis 1:1").await.unwrap_err();
        let second = cache.get("Genesis 1:1").await.unwrap_err();
        assert_eq!(first, Error::Backend(BackendError::new("disk on fire")));
        assert_eq!(first, second);
        assert_eq!(backend.fetches(), 1);
    }

    #[tokio::test]
    async fn test_retry_policy_drops_failed_entries() {
        let backend = Arc::new(GatedBackend {
            fail_fetch: true,
            ..GatedBackend::new()
        });
        let cache = cache_over(
            &backend,
            CacheConfig::default().with_failure_policy(FailurePolicy::RetryErrors),
        );

        assert!(cache.get("Genesis 1:1").await.is_err());
        assert!(!cache.contains("Genesis 1:1"));
        assert!(cache.get("Genesis 1:1").await.is_err());
        assert_eq!(backend.fetches(), 2);
    }

    #[tokio::test]
    async fn test_book_name_is_corrected_before_fetch() {
        let backend = Arc::new(GatedBackend::new().with_books());
        let cache = cache_over(&backend, CacheConfig::default());

        let verses = cache.get("Genesys 1:1").await.unwrap();
        assert_eq!(verses.len(), 1);
        let address = backend.last_address.lock().unwrap().clone().unwrap();
        assert_eq!(address.book, "Genesis");
        assert_eq!(backend.book_lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_book_listing_failure_skips_fetch() {
        let backend = Arc::new(GatedBackend {
            fail_books: true,
            ..GatedBackend::new().with_books()
        });
        let cache = cache_over(&backend, CacheConfig::default());

        let err = cache.get("Genesis 1:1").await.unwrap_err();
        assert_eq!(err, Error::Backend(BackendError::new("no index")));
        assert_eq!(backend.fetches(), 0);
    }

    #[tokio::test]
    async fn test_distant_book_is_not_found() {
        let backend = Arc::new(GatedBackend::new().with_books());
        let cache = cache_over(&backend, CacheConfig::default().with_max_book_distance(2));

        let err = cache.get("Apocalypse 1:1").await.unwrap_err();
        assert_eq!(
            err,
            Error::BookNotFound {
                candidate: "Apocalypse".to_string()
            }
        );
        assert_eq!(backend.fetches(), 0);
    }

    #[tokio::test]
    async fn test_keys_are_not_normalized() {
        let backend = Arc::new(GatedBackend::new());
        let cache = cache_over(&backend, CacheConfig::default());

        cache.get("Genesis 1:1").await.unwrap();
        cache.get("Genesis  1:1").await.unwrap();
        assert_eq!(backend.fetches(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let backend = Arc::new(GatedBackend::new());
        let cache = cache_over(&backend, CacheConfig::default());

        assert!(!cache.invalidate("Genesis 1:1"));
        cache.get("Genesis 1:1").await.unwrap();
        assert!(cache.invalidate("Genesis 1:1"));
        assert!(cache.is_empty());

        cache.get("Genesis 1:1").await.unwrap();
        assert_eq!(backend.fetches(), 2);
    }

    #[tokio::test]
    async fn test_pending_entry_cannot_be_invalidated() {
        let backend = Arc::new(GatedBackend::new().gated());
        let cache = cache_over(&backend, CacheConfig::default());

        let (tx, rx) = oneshot::channel();
        cache.resolve("Genesis 1:3", move |result| {
            let _ = tx.send(result);
        });
        assert!(!cache.invalidate("Genesis 1:3"));
        cache.clear_completed();
        assert!(cache.contains("Genesis 1:3"));

        backend.gate.notify_one();
        assert!(rx.await.unwrap().is_ok());
        cache.clear_completed();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entries_resolve_again() {
        let backend = Arc::new(GatedBackend::new());
        let cache = cache_over(&backend, CacheConfig::default().with_ttl(Duration::ZERO));
        cache.get("Genesis 1:1").await.unwrap();
        cache.get("Genesis 1:1").await.unwrap();
        assert_eq!(backend.fetches(), 2);

        let backend = Arc::new(GatedBackend::new());
        let cache = cache_over(&backend, CacheConfig::default().with_ttl(Duration::from_secs(3600)));
        cache.get("Genesis 1:1").await.unwrap();
        cache.get("Genesis 1:1").await.unwrap();
        assert_eq!(backend.fetches(), 1);
    }
}
