use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use marketpulse_core::{AnalysisCache, AnalysisResult, MarketPulseError};
use tokio::sync::RwLock;

struct CacheEntry {
    result: Arc<AnalysisResult>,
    created_at: Instant,
}

/// In-memory analysis cache with TTL expiration and a bounded capacity.
///
/// Entries are fresh while `now - created_at < ttl`. Writes past capacity
/// evict the oldest entry, so the map cannot grow without bound over a long
/// process lifetime.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl InMemoryCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Arc<AnalysisResult>>, MarketPulseError> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                Ok(Some(entry.result.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn put(&self, key: &str, result: Arc<AnalysisResult>) -> Result<(), MarketPulseError> {
        let mut store = self.store.write().await;
        store.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        if !store.contains_key(key) && store.len() >= self.capacity {
            let oldest = store
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                store.remove(&oldest);
            }
        }
        store.insert(
            key.to_string(),
            CacheEntry {
                result,
                created_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), MarketPulseError> {
        let mut store = self.store.write().await;
        store.clear();
        Ok(())
    }
}
