//! Candidate sources
//!
//! A [`CandidateSource`] answers a lookup for a raw prefix. Lookups may
//! complete in any order; the session tags each one with its generation and
//! the engine decides whether the answer is still wanted.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::candidate::CandidateOps;
use super::text::{self, Normalizer};
use crate::error::Result;

/// Asynchronous candidate lookup
#[async_trait]
pub trait CandidateSource<T>: Send + Sync {
    /// Look up candidates for a prefix
    ///
    /// # Arguments
    /// * `prefix` - Raw text typed by the user, not normalized
    ///
    /// # Returns
    /// * `Result<Vec<T>>` - Candidates in display order
    async fn lookup(&self, prefix: &str) -> Result<Vec<T>>;
}

/// In-memory candidate list filtered by prefix
pub struct StaticSource<T> {
    items: Vec<T>,
    ops: CandidateOps<T>,
    normalizer: Normalizer,
    limit: Option<usize>,
    latency: Option<Duration>,
}

impl<T> fmt::Debug for StaticSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSource")
            .field("items", &self.items.len())
            .field("limit", &self.limit)
            .field("latency", &self.latency)
            .finish()
    }
}

impl<T> StaticSource<T> {
    /// Create a source matching case-insensitively, without limit or latency
    ///
    /// # Arguments
    /// * `items` - Every candidate, in display order
    /// * `ops` - Projection used for matching
    pub fn new(items: Vec<T>, ops: CandidateOps<T>) -> Self {
        Self {
            items,
            ops,
            normalizer: Normalizer::new(false),
            limit: None,
            latency: None,
        }
    }

    /// Match case-sensitively instead
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.normalizer = Normalizer::new(case_sensitive);
        self
    }

    /// Return at most `limit` candidates per lookup
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Delay every answer, simulating a remote service
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> StaticSource<T> {
    fn filter(&self, prefix: &str) -> Vec<T> {
        let needle = self.normalizer.normalize(prefix);
        self.items
            .iter()
            .filter(|item| {
                let projected = self.ops.project(item);
                text::matches(&needle, &self.normalizer.normalize(&projected))
            })
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<T> CandidateSource<T> for StaticSource<T>
where
    T: Clone + Send + Sync,
{
    async fn lookup(&self, prefix: &str) -> Result<Vec<T>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let found = self.filter(prefix);
        trace!(prefix, count = found.len(), "static lookup");
        Ok(found)
    }
}

/// Source backed by a synchronous closure; answers on first poll
pub struct FnSource<F> {
    lookup: F,
}

impl<F> FnSource<F> {
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<T, F> CandidateSource<T> for FnSource<F>
where
    T: Send + 'static,
    F: Fn(&str) -> Result<Vec<T>> + Send + Sync,
{
    async fn lookup(&self, prefix: &str) -> Result<Vec<T>> {
        (self.lookup)(prefix)
    }
}
