use std::collections::HashMap;
use std::sync::Arc;

use marketpulse_core::{
    normalize_query, AnalysisCache, AnalysisResult, AnalysisSummary, ItemSource,
    MarketPulseError, Summarizer,
};
use tokio::sync::Mutex;

/// Orchestrates the primary source, summarizer, and cache behind one fetch
/// operation with transparent degradation.
///
/// Explicitly constructed and injectable; holds no global state. Failure
/// semantics: only [`MarketPulseError::Config`] and
/// [`MarketPulseError::EmptyQuery`] escape to the caller. Every transient or
/// data-shape failure is absorbed into a valid, renderable result whose
/// default content is the only signal that something went wrong upstream.
pub struct AnalysisClient {
    source: Arc<dyn ItemSource>,
    summarizer: Arc<dyn Summarizer>,
    cache: Arc<dyn AnalysisCache>,
    // Single-flight guards keyed by normalized query: concurrent callers for
    // the same key queue on one guard and find the cache filled on re-check.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AnalysisClient {
    pub fn new(
        source: Arc<dyn ItemSource>,
        summarizer: Arc<dyn Summarizer>,
        cache: Arc<dyn AnalysisCache>,
    ) -> Self {
        Self {
            source,
            summarizer,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the analysis for a free-text query.
    ///
    /// Serves a cache-fresh result without any network call; otherwise runs
    /// the primary fetch and summarization, caching the outcome. Dropping
    /// the returned future cancels all pending attempts, including any
    /// retry sleep.
    pub async fn fetch_analysis(
        &self,
        query: &str,
    ) -> Result<Arc<AnalysisResult>, MarketPulseError> {
        let key = normalize_query(query);
        if key.is_empty() {
            return Err(MarketPulseError::EmptyQuery);
        }

        if let Some(hit) = self.cache.get(&key).await? {
            tracing::debug!(%key, "cache hit");
            return Ok(hit);
        }

        let guard = self.flight_guard(&key).await;
        let flight = guard.lock().await;

        // A concurrent caller may have completed while we waited.
        let outcome = match self.cache.get(&key).await? {
            Some(hit) => Ok(hit),
            None => self.fetch_uncached(&key).await,
        };

        drop(flight);
        self.release_guard(&key, &guard).await;
        outcome
    }

    /// Drop all cached entries. Idempotent.
    pub async fn clear_cache(&self) -> Result<(), MarketPulseError> {
        self.cache.clear().await
    }

    async fn fetch_uncached(&self, key: &str) -> Result<Arc<AnalysisResult>, MarketPulseError> {
        let items = match self.source.search(key).await {
            Ok(items) => items,
            Err(err @ MarketPulseError::Config(_)) => return Err(err),
            Err(err) => {
                tracing::warn!(%key, error = %err, "primary fetch failed, degrading");
                // Not cached: the next call should get a chance to refetch.
                return Ok(Arc::new(AnalysisResult::degraded(key)));
            }
        };

        let result = if items.is_empty() {
            tracing::debug!(%key, "no usable items, skipping summarizer");
            AnalysisResult::no_data(key)
        } else {
            let summary = match self.summarizer.summarize(key, &items).await {
                Ok(summary) => summary,
                Err(err @ MarketPulseError::Config(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!(%key, error = %err, "summarization failed, using fallback");
                    AnalysisSummary::fallback()
                }
            };
            AnalysisResult {
                query: key.to_string(),
                items,
                summary,
            }
        };

        let result = Arc::new(result);
        self.cache.put(key, result.clone()).await?;
        Ok(result)
    }

    async fn flight_guard(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_guard(&self, key: &str, guard: &Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        // Two strong refs remain when no other caller holds this guard:
        // the map entry and our local clone.
        if let Some(existing) = in_flight.get(key) {
            if Arc::ptr_eq(existing, guard) && Arc::strong_count(existing) <= 2 {
                in_flight.remove(key);
            }
        }
    }
}
