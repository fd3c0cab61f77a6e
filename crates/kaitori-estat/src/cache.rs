//! In-process response cache with a per-entry time-to-live.
//!
//! Entries are immutable once written and expiry is checked on read. When
//! the map grows past `max_entries`, expired entries are purged before the
//! next insert; live entries are never evicted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug)]
pub(crate) struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub(crate) fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    pub(crate) async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    pub(crate) async fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, v| v.inserted_at.elapsed() < ttl);
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Cache key for a `getStatsData` call: dataset id plus sorted query params.
pub(crate) fn cache_key(stats_data_id: &str, params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_unstable();
    let query = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{stats_data_id}?{query}")
}
