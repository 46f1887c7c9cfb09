//! Caching layer for planned journeys.
//!
//! The schedule is fixed for the life of the process, so a time-range query
//! always gives the same answer. Results are cached per query, with a TTL to
//! bound memory rather than to keep them fresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use moka::future::Cache as MokaCache;

use crate::domain::StopId;
use crate::planner::{DetailedJourney, SummaryJourney};

/// Everything that determines a time-range query's answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub origin: StopId,
    pub destination: StopId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Sorted and deduplicated, so listing order does not matter.
    pub excluded: Vec<StopId>,
}

impl QueryKey {
    pub fn new(
        origin: StopId,
        destination: StopId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        excluded: &[StopId],
    ) -> Self {
        let mut excluded = excluded.to_vec();
        excluded.sort();
        excluded.dedup();
        Self {
            origin,
            destination,
            start,
            end,
            excluded,
        }
    }
}

type Entry<T> = Arc<Vec<T>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per result shape.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 10_000,
        }
    }
}

fn table<V: Clone + Send + Sync + 'static>(config: &CacheConfig) -> MokaCache<QueryKey, V> {
    MokaCache::builder()
        .time_to_live(config.ttl)
        .max_capacity(config.max_capacity)
        .build()
}

/// Cache for time-range query results, one table per result shape.
pub struct JourneyCache {
    summaries: MokaCache<QueryKey, Entry<SummaryJourney>>,
    details: MokaCache<QueryKey, Entry<DetailedJourney>>,
}

impl JourneyCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            summaries: table(config),
            details: table(config),
        }
    }

    pub async fn get_summary(&self, key: &QueryKey) -> Option<Entry<SummaryJourney>> {
        self.summaries.get(key).await
    }

    pub async fn insert_summary(&self, key: QueryKey, entry: Entry<SummaryJourney>) {
        self.summaries.insert(key, entry).await;
    }

    pub async fn get_detailed(&self, key: &QueryKey) -> Option<Entry<DetailedJourney>> {
        self.details.get(key).await
    }

    pub async fn insert_detailed(&self, key: QueryKey, entry: Entry<DetailedJourney>) {
        self.details.insert(key, entry).await;
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.summaries.entry_count() + self.details.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.summaries.invalidate_all();
        self.details.invalidate_all();
    }
}
