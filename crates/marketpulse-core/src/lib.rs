use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Query normalization
// ---------------------------------------------------------------------------

/// Normalize a free-text query into its canonical form.
///
/// The normalized form (trimmed, lowercased) is the cache key and the unit
/// of request deduplication: `"Query"` and `"  query  "` map to the same
/// slot.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// AnalysisItem
// ---------------------------------------------------------------------------

/// A single upstream item after boundary normalization.
///
/// Vendor payloads are heterogeneous and partially populated; normalization
/// replaces every absent value with an explicit placeholder (empty string,
/// zero) so nothing downstream has to handle missing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnalysisItem {
    pub id: String,
    pub title: String,
    pub text: String,
    pub author: String,
    pub url: String,
    pub engagement: u64,
    pub published_at: String,
}

// ---------------------------------------------------------------------------
// AnalysisSummary
// ---------------------------------------------------------------------------

/// Structured summary produced by the summarization service.
///
/// Invariant: all four fields are always present. Consumers never observe a
/// missing field; a failed or malformed summarization is replaced by one of
/// the documented default constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub overview: String,
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

impl AnalysisSummary {
    /// Overview text used when the primary source returned zero usable items.
    pub const NO_DATA_OVERVIEW: &'static str = "No recent data available for this query.";

    /// Overview text used when summarization failed or returned malformed JSON.
    pub const FALLBACK_OVERVIEW: &'static str =
        "Summary unavailable; showing raw results only.";

    /// The documented "no data" payload: the summarizer is never called when
    /// the primary source yields nothing to summarize.
    pub fn no_data() -> Self {
        Self {
            overview: Self::NO_DATA_OVERVIEW.to_string(),
            trends: Vec::new(),
            competitors: Vec::new(),
            opportunities: Vec::new(),
        }
    }

    /// The documented degrade-to-default payload for summarization failures.
    pub fn fallback() -> Self {
        Self {
            overview: Self::FALLBACK_OVERVIEW.to_string(),
            trends: Vec::new(),
            competitors: Vec::new(),
            opportunities: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// The complete, renderable result of one analysis fetch.
///
/// Always structurally valid: degraded or default content is the only signal
/// that something went wrong upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The normalized query this result answers.
    pub query: String,
    pub items: Vec<AnalysisItem>,
    pub summary: AnalysisSummary,
}

impl AnalysisResult {
    /// Result for a query the primary source had no usable items for.
    pub fn no_data(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            items: Vec::new(),
            summary: AnalysisSummary::no_data(),
        }
    }

    /// Result for a query whose primary fetch failed entirely.
    pub fn degraded(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            items: Vec::new(),
            summary: AnalysisSummary::fallback(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for the MarketPulse client.
///
/// Only `Config` and `EmptyQuery` escape to callers of the analysis client;
/// every transient or data-shape failure is absorbed and converted into a
/// default, renderable result.
#[derive(Debug, Error)]
pub enum MarketPulseError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("empty query")]
    EmptyQuery,
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Server-provided `Retry-After` hint, if any.
        retry_after: Option<Duration>,
    },
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("summary parse error: {0}")]
    SummaryParse(String),
    #[error("cache error: {0}")]
    Cache(String),
}

impl MarketPulseError {
    /// Whether a failed upstream call should be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_))
    }

    /// Server-provided retry hint, when the error carries one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait seams
// ---------------------------------------------------------------------------

/// A primary data source: given a query, return normalized items.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<AnalysisItem>, MarketPulseError>;
}

/// A summarization service turning filtered items into a structured summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        query: &str,
        items: &[AnalysisItem],
    ) -> Result<AnalysisSummary, MarketPulseError>;
}

/// Cache for complete analysis results, keyed by normalized query.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    /// Look up a fresh entry. Expired entries are reported as absent.
    async fn get(&self, key: &str) -> Result<Option<Arc<AnalysisResult>>, MarketPulseError>;
    /// Store an entry. Last write for a key wins.
    async fn put(&self, key: &str, result: Arc<AnalysisResult>) -> Result<(), MarketPulseError>;
    /// Drop all entries. Idempotent.
    async fn clear(&self) -> Result<(), MarketPulseError>;
}
