use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use marketpulse_backend::{retry_with_backoff, ApiBackend, ApiRequest, ApiResponse, RetryPolicy};
use marketpulse_core::{AnalysisItem, AnalysisSummary, MarketPulseError, Summarizer};
use serde_json::{json, Value};

const SYSTEM_PROMPT: &str = "You are a marketing analyst. Given a search query and a JSON list \
of social posts, respond with a single JSON object with exactly these fields: \
\"overview\" (string), \"trends\" (array of strings), \"competitors\" (array of strings), \
\"opportunities\" (array of strings). Respond with JSON only.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl OpenAiConfig {
    /// Environment variable holding the bearer token.
    pub const API_KEY_ENV: &'static str = "OPENAI_API_KEY";

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.3,
            max_tokens: 1024,
        }
    }

    /// Read the bearer token from the environment.
    pub fn from_env(model: impl Into<String>) -> Result<Self, MarketPulseError> {
        let api_key = env::var(Self::API_KEY_ENV).map_err(|_| {
            MarketPulseError::Config(format!("{} is not set", Self::API_KEY_ENV))
        })?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Summarizer backed by an OpenAI-compatible chat-completions endpoint.
///
/// Requests strict JSON via `response_format`, then parses defensively:
/// a malformed payload degrades to [`AnalysisSummary::fallback`] and partial
/// payloads have their missing fields defaulted. Shape problems never
/// surface as errors; only transport-level failures do.
pub struct OpenAiSummarizer {
    config: OpenAiConfig,
    backend: Arc<dyn ApiBackend>,
    retry: RetryPolicy,
}

impl OpenAiSummarizer {
    pub fn new(config: OpenAiConfig, backend: Arc<dyn ApiBackend>) -> Self {
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

    fn build_request(&self, query: &str, items: &[AnalysisItem]) -> ApiRequest {
        let context = json!({
            "query": query,
            "posts": items,
        });
        ApiRequest {
            url: format!("{}/chat/completions", self.config.base_url),
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.api_key),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: json!({
                "model": self.config.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": context.to_string()},
                ],
                "temperature": self.config.temperature,
                "max_tokens": self.config.max_tokens,
                "response_format": {"type": "json_object"},
            }),
        }
    }
}

fn check_status(resp: &ApiResponse) -> Result<(), MarketPulseError> {
    if resp.status == 429 {
        let message = resp.body["error"]["message"]
            .as_str()
            .unwrap_or("rate limited")
            .to_string();
        return Err(MarketPulseError::RateLimited {
            message,
            retry_after: resp.retry_after,
        });
    }
    if !(200..300).contains(&resp.status) {
        let message = resp.body["error"]["message"]
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

/// Extract JSON from text, tolerating markdown code fences the model may
/// emit despite the strict response format.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }
    trimmed
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the model's content into a summary, defaulting field by field.
fn summary_from_content(content: &str) -> AnalysisSummary {
    let parsed: Value = match serde_json::from_str(extract_json(content)) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "summarizer returned invalid JSON, using fallback");
            return AnalysisSummary::fallback();
        }
    };
    let overview = parsed["overview"]
        .as_str()
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| AnalysisSummary::FALLBACK_OVERVIEW.to_string());
    AnalysisSummary {
        overview,
        trends: string_list(&parsed, "trends"),
        competitors: string_list(&parsed, "competitors"),
        opportunities: string_list(&parsed, "opportunities"),
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(
        &self,
        query: &str,
        items: &[AnalysisItem],
    ) -> Result<AnalysisSummary, MarketPulseError> {
        if self.config.api_key.trim().is_empty() {
            return Err(MarketPulseError::Config(
                "summarizer API key is blank".to_string(),
            ));
        }

        let backend = &self.backend;
        let response = retry_with_backoff(&self.retry, || {
            let request = self.build_request(query, items);
            async move {
                let resp = backend.send(request).await?;
                check_status(&resp)?;
                Ok(resp)
            }
        })
        .await?;

        let content = response.body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("");
        Ok(summary_from_content(content))
    }
}
