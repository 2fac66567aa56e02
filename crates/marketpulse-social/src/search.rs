use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use marketpulse_backend::{retry_with_backoff, ApiBackend, ApiRequest, ApiResponse, RetryPolicy};
use marketpulse_core::{AnalysisItem, ItemSource, MarketPulseError};
use serde_json::{json, Value};

/// Configuration for [`SocialSearchSource`].
#[derive(Debug, Clone)]
pub struct SocialSearchConfig {
    /// Vendor API key, sent in the `X-Api-Key` header.
    pub api_key: String,
    /// Base URL for the vendor API. Defaults to `"https://api.socialscan.io/v1"`.
    pub base_url: String,
    /// Cap on items kept after engagement ranking. Bounds the payload handed
    /// to the summarizer. Defaults to 15.
    pub max_items: usize,
}

impl SocialSearchConfig {
    /// Environment variable holding the vendor API key.
    pub const API_KEY_ENV: &'static str = "SOCIAL_SEARCH_API_KEY";

    /// Create a new configuration with the given API key and defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.socialscan.io/v1".to_string(),
            max_items: 15,
        }
    }

    /// Read the API key from the environment.
    pub fn from_env() -> Result<Self, MarketPulseError> {
        let api_key = env::var(Self::API_KEY_ENV).map_err(|_| {
            MarketPulseError::Config(format!("{} is not set", Self::API_KEY_ENV))
        })?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (useful for testing with a mock server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the item cap.
    pub fn with_max_items(mut self, n: usize) -> Self {
        self.max_items = n;
        self
    }
}

/// Primary data source backed by a social search vendor API.
///
/// Vendor payloads are normalized into fully-defaulted [`AnalysisItem`]s,
/// ranked by engagement, and truncated to the configured cap. Transient
/// failures (429, timeout) are retried with exponential backoff.
pub struct SocialSearchSource {
    config: SocialSearchConfig,
    backend: Arc<dyn ApiBackend>,
    retry: RetryPolicy,
}

impl SocialSearchSource {
    pub fn new(config: SocialSearchConfig, backend: Arc<dyn ApiBackend>) -> Self {
        Self {
            config,
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(&self, query: &str) -> ApiRequest {
        ApiRequest {
            url: format!("{}/search", self.config.base_url),
            headers: vec![
                ("X-Api-Key".to_string(), self.config.api_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: json!({
                "query": query,
                "limit": self.config.max_items,
            }),
        }
    }
}

fn check_status(resp: &ApiResponse) -> Result<(), MarketPulseError> {
    if resp.status == 429 {
        let message = resp.body["error"]
            .as_str()
            .unwrap_or("rate limited")
            .to_string();
        return Err(MarketPulseError::RateLimited {
            message,
            retry_after: resp.retry_after,
        });
    }
    if !(200..300).contains(&resp.status) {
        let message = resp.body["error"]
            .as_str()
            .unwrap_or("unknown API error")
            .to_string();
        return Err(MarketPulseError::Upstream {
            status: resp.status,
            message,
        });
    }
    Ok(())
}

fn item_from_post(post: &Value) -> Option<AnalysisItem> {
    // Non-object elements are skipped rather than failing the batch.
    post.as_object()?;
    Some(AnalysisItem {
        id: post["id"].as_str().unwrap_or("").to_string(),
        title: post["title"].as_str().unwrap_or("").to_string(),
        text: post["text"].as_str().unwrap_or("").to_string(),
        author: post["author"].as_str().unwrap_or("").to_string(),
        url: post["url"].as_str().unwrap_or("").to_string(),
        engagement: post["engagement"].as_u64().unwrap_or(0),
        published_at: post["published_at"].as_str().unwrap_or("").to_string(),
    })
}

fn parse_items(body: &Value) -> Result<Vec<AnalysisItem>, MarketPulseError> {
    if !body.is_object() {
        return Err(MarketPulseError::Malformed(
            "expected a JSON object from the search endpoint".to_string(),
        ));
    }
    // A missing or null `posts` field is an empty result, not an error.
    let posts = match body.get("posts").and_then(Value::as_array) {
        Some(posts) => posts,
        None => return Ok(Vec::new()),
    };
    Ok(posts.iter().filter_map(item_from_post).collect())
}

#[async_trait]
impl ItemSource for SocialSearchSource {
    async fn search(&self, query: &str) -> Result<Vec<AnalysisItem>, MarketPulseError> {
        if self.config.api_key.trim().is_empty() {
            return Err(MarketPulseError::Config(
                "social search API key is blank".to_string(),
            ));
        }

        let backend = &self.backend;
        let response = retry_with_backoff(&self.retry, || {
            let request = self.build_request(query);
            async move {
                let resp = backend.send(request).await?;
                check_status(&resp)?;
                Ok(resp)
            }
        })
        .await?;

        let mut items = parse_items(&response.body)?;
        items.sort_by(|a, b| b.engagement.cmp(&a.engagement));
        items.truncate(self.config.max_items);
        tracing::debug!(query, count = items.len(), "social search returned items");
        Ok(items)
    }
}
