//! Process-wide cache of the unified table.
//!
//! The cache holds at most one [`Dataset`]. An entry is reused while its
//! key matches the requested key and it is younger than the key's refresh
//! interval; otherwise the refresher runs again. Filter selections are
//! never part of the key, so widget changes always hit the cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::refresh::DatasetRefresher;
use crate::{Dataset, DatasetError};

/// Identifies "the data as of the last refresh".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source the data came from.
    pub source_id: String,
    /// Maximum age before the data is fetched again.
    pub refresh_interval: Duration,
}

impl CacheKey {
    /// Creates a key for `source_id` with the given refresh interval.
    #[must_use]
    pub fn new(source_id: impl Into<String>, refresh_interval: Duration) -> Self {
        Self {
            source_id: source_id.into(),
            refresh_interval,
        }
    }
}

/// Shared access to the current [`Dataset`].
#[async_trait]
pub trait TableCache: Send + Sync {
    /// Returns the cached dataset for `key`, refreshing it first when it is
    /// missing, stale, or was stored under a different key.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if a refresh was needed and failed. Failed
    /// refreshes are not cached.
    async fn get_or_refresh(&self, key: &CacheKey) -> Result<Arc<Dataset>, DatasetError>;
}

struct CacheEntry {
    key: CacheKey,
    loaded_at: Instant,
    dataset: Arc<Dataset>,
}

impl CacheEntry {
    fn is_fresh_for(&self, key: &CacheKey) -> bool {
        self.key == *key && self.loaded_at.elapsed() < key.refresh_interval
    }
}

/// A [`TableCache`] that expires its entry after the key's refresh
/// interval.
///
/// The refresh runs while holding the cache lock, so concurrent requests
/// wait for one fetch instead of starting their own.
pub struct TtlCache<R> {
    refresher: R,
    entry: Mutex<Option<CacheEntry>>,
}

impl<R: DatasetRefresher> TtlCache<R> {
    /// Creates an empty cache backed by `refresher`.
    #[must_use]
    pub fn new(refresher: R) -> Self {
        Self {
            refresher,
            entry: Mutex::new(None),
        }
    }

    /// Builds the key for this cache's source with `refresh_interval`.
    #[must_use]
    pub fn key(&self, refresh_interval: Duration) -> CacheKey {
        CacheKey::new(self.refresher.source_id(), refresh_interval)
    }
}

#[async_trait]
impl<R: DatasetRefresher> TableCache for TtlCache<R> {
    async fn get_or_refresh(&self, key: &CacheKey) -> Result<Arc<Dataset>, DatasetError> {
        let mut entry = self.entry.lock().await;

        if let Some(cached) = entry.as_ref()
            && cached.is_fresh_for(key)
        {
            log::debug!("Serving cached dataset for {}", key.source_id);
            return Ok(Arc::clone(&cached.dataset));
        }

        log::info!("Refreshing dataset for {}", key.source_id);
        let started = Instant::now();
        let dataset = Arc::new(self.refresher.refresh().await?);
        log::info!(
            "Refreshed {} records for {} in {:.1}s",
            dataset.table.len(),
            key.source_id,
            started.elapsed().as_secs_f64()
        );

        *entry = Some(CacheEntry {
            key: key.clone(),
            loaded_at: Instant::now(),
            dataset: Arc::clone(&dataset),
        });
        Ok(dataset)
    }
}
