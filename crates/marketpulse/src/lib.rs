//! MarketPulse — resilient remote analysis client for marketing dashboards.
//!
//! Given a free-text query, [`AnalysisClient`] fetches items from a primary
//! data source, summarizes them through an LLM completion endpoint, and
//! returns a structurally complete [`core::AnalysisResult`] regardless of
//! upstream flakiness. Results are cached by normalized query with a TTL,
//! and concurrent identical queries share one upstream call.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use marketpulse::backend::HttpBackend;
//! use marketpulse::cache::InMemoryCache;
//! use marketpulse::openai::{OpenAiConfig, OpenAiSummarizer};
//! use marketpulse::social::{SocialSearchConfig, SocialSearchSource};
//! use marketpulse::AnalysisClient;
//!
//! let backend = Arc::new(HttpBackend::new()?);
//! let client = AnalysisClient::new(
//!     Arc::new(SocialSearchSource::new(SocialSearchConfig::from_env()?, backend.clone())),
//!     Arc::new(OpenAiSummarizer::new(OpenAiConfig::from_env("gpt-4o-mini")?, backend)),
//!     Arc::new(InMemoryCache::new()),
//! );
//! let result = client.fetch_analysis("rust web frameworks").await?;
//! ```

/// Core types and traits: AnalysisResult, MarketPulseError, ItemSource, Summarizer, AnalysisCache.
pub use marketpulse_core as core;

/// HTTP transport seam and retry-with-backoff: ApiBackend, HttpBackend, FakeBackend, RetryPolicy.
pub use marketpulse_backend as backend;

/// Analysis result caching: InMemoryCache with TTL and bounded capacity.
pub use marketpulse_cache as cache;

/// Primary data source: SocialSearchSource.
pub use marketpulse_social as social;

/// Summarization: OpenAiSummarizer.
pub use marketpulse_openai as openai;

mod client;
pub use client::AnalysisClient;

mod scripted;
pub use scripted::{ScriptedSource, ScriptedSummarizer};
