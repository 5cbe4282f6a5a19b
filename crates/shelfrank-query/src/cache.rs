//! Aggregate snapshot cache.
//!
//! Holds one all-time [`BookStats`] per book id in a moka in-process cache.
//! Entries have no age-based expiry: a snapshot stays resident until the
//! book's write path evicts it, so coherence comes entirely from eviction.
//! Capacity pressure may still drop entries early, which costs a recompute
//! and nothing else.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use shelfrank_core::{AggregateCache, BookId, BookStats, CacheConfig, CoreResult};
use tracing::{debug, warn};

use crate::engine::RankingEngine;

/// Moka-backed aggregate snapshot cache keyed by book id.
#[derive(Clone)]
pub struct BookStatsCache {
    entries: MokaCache<BookId, BookStats>,
}

impl BookStatsCache {
    /// Creates a cache holding at most `max_entries` snapshots.
    #[must_use]
    pub fn new(max_entries: u64) -> Self {
        let entries = MokaCache::builder().max_capacity(max_entries).build();
        Self { entries }
    }

    /// Creates a cache sized from configuration.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries)
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count(),
        }
    }
}

#[async_trait]
impl AggregateCache for BookStatsCache {
    async fn get(&self, book_id: BookId) -> CoreResult<Option<BookStats>> {
        Ok(self.entries.get(&book_id).await)
    }

    async fn insert(&self, book_id: BookId, stats: BookStats) -> CoreResult<()> {
        self.entries.insert(book_id, stats).await;
        Ok(())
    }

    async fn evict(&self, book_id: BookId) -> CoreResult<()> {
        self.entries.invalidate(&book_id).await;
        Ok(())
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Number of resident snapshots.
    pub entries: u64,
}

/// Read path for per-book snapshots: cache first, engine on a miss.
///
/// The cache is populated lazily; nothing warms it ahead of demand. A miss
/// computes the snapshot through the engine and stores it for the next
/// reader. A failed store is logged and the fresh snapshot is returned
/// anyway, since the read itself succeeded.
pub struct StatsReader {
    engine: Arc<dyn RankingEngine>,
    cache: Arc<dyn AggregateCache>,
}

impl StatsReader {
    /// Creates a reader over the given engine and cache.
    pub fn new(engine: Arc<dyn RankingEngine>, cache: Arc<dyn AggregateCache>) -> Self {
        Self { engine, cache }
    }

    /// Returns the all-time snapshot for a book, or `None` for unknown ids.
    pub async fn book_stats(&self, book_id: BookId) -> CoreResult<Option<BookStats>> {
        if let Some(hit) = self.cache.get(book_id).await? {
            debug!(%book_id, "aggregate snapshot served from cache");
            return Ok(Some(hit));
        }

        let stats = match self.engine.book_stats(book_id).await? {
            Some(stats) => stats,
            None => return Ok(None),
        };

        if let Err(err) = self.cache.insert(book_id, stats.clone()).await {
            warn!(%book_id, error = %err, "failed to cache aggregate snapshot");
        }
        Ok(Some(stats))
    }
}
