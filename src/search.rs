//! search.rs
//!
//! Regular-expression search over a backend's corpus.
//!
//! A textual query is either a bare pattern (`meroza`) or a delimited one
//! with trailing flags (`/meroza/gi`). Supported flags are `i`
//! (case-insensitive), `m` (multi-line), `s` (dot matches newline), `x`
//! (ignore whitespace) and `u` (Unicode, always on); `g` and `y` are
//! accepted and have no effect. A delimited string whose flags are not
//! recognized is treated as a bare pattern, slashes included.
//!
//! Searches are not cached: every call goes to the backend.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::backend::{Capabilities, LookupBackend};
use crate::error::{Error, QueryError};
use crate::verse::VerseRecord;

const KNOWN_FLAGS: &str = "gimsuxy";

/// A search request, either still textual or already compiled.
#[derive(Debug, Clone)]
pub enum Query {
    Text(String),
    Pattern(Regex),
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::Text(s.to_string())
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::Text(s)
    }
}

impl From<Regex> for Query {
    fn from(re: Regex) -> Self {
        Query::Pattern(re)
    }
}

/// Splits `/body/flags` into body and flags when the flags are all known
/// and none repeats.
fn split_delimited(query: &str) -> Option<(&str, &str)> {
    let rest = query.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let (body, flags) = (&rest[..end], &rest[end + 1..]);
    if body.is_empty() {
        return None;
    }
    let mut seen = String::new();
    for flag in flags.chars() {
        if !KNOWN_FLAGS.contains(flag) || seen.contains(flag) {
            return None;
        }
        seen.push(flag);
    }
    Some((body, flags))
}

/// Compiles a textual query into a regular expression.
pub fn compile(query: &str) -> Result<Regex, QueryError> {
    if query.is_empty() {
        return Err(QueryError::Empty);
    }

    let (body, flags) = split_delimited(query).unwrap_or((query, ""));
    RegexBuilder::new(body)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .build()
        .map_err(|e| QueryError::InvalidPattern {
            pattern: query.to_string(),
            reason: e.to_string(),
        })
}

/// Validates queries and hands them to a backend that supports searching.
#[derive(Clone)]
pub struct SearchFacade {
    backend: Arc<dyn LookupBackend>,
    capabilities: Capabilities,
}

impl SearchFacade {
    pub fn new(backend: Arc<dyn LookupBackend>) -> Self {
        let capabilities = backend.capabilities();
        SearchFacade {
            backend,
            capabilities,
        }
    }

    /// Returns the verses whose text matches `query`.
    pub async fn search(&self, query: impl Into<Query>) -> Result<Vec<VerseRecord>, Error> {
        let pattern = match query.into() {
            Query::Text(text) => compile(&text)?,
            Query::Pattern(re) => re,
        };

        if !self.capabilities.search {
            return Err(QueryError::Unsupported.into());
        }

        tracing::debug!(pattern = pattern.as_str(), "searching");
        Ok(self.backend.search(&pattern).await?)
    }

    /// Callback form of [`SearchFacade::search`]; the search runs on a Tokio task.
    pub fn search_with<F>(&self, query: impl Into<Query>, callback: F)
    where
        F: FnOnce(Result<Vec<VerseRecord>, Error>) + Send + 'static,
    {
        let facade = self.clone();
        let query = query.into();
        tokio::spawn(async move {
            callback(facade.search(query).await);
        });
    }
}
