use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use marketpulse_core::MarketPulseError;
use serde_json::Value;
use tokio::sync::Mutex;

/// A single outbound API call: POST with a JSON body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    /// Parsed `Retry-After` header (seconds form), when the server sent one.
    pub retry_after: Option<Duration>,
}

#[async_trait]
pub trait ApiBackend: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, MarketPulseError>;
}

/// Production backend using reqwest with a client-level timeout.
///
/// When the timeout fires the in-flight request is aborted and surfaced as
/// `Timeout`, which the retry layer treats as retryable.
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Result<Self, MarketPulseError> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, MarketPulseError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                MarketPulseError::Config(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ApiBackend for HttpBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, MarketPulseError> {
        let mut builder = self.client.post(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        builder = builder.json(&request.body);

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketPulseError::Timeout(format!("request to {} timed out", request.url))
            } else {
                MarketPulseError::Upstream {
                    status: 0,
                    message: format!("HTTP request failed: {e}"),
                }
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                MarketPulseError::Timeout(format!("request to {} timed out", request.url))
            } else {
                MarketPulseError::Upstream {
                    status,
                    message: format!("failed to read response body: {e}"),
                }
            }
        })?;

        let body = match serde_json::from_str(&text) {
            Ok(body) => body,
            // Error bodies are not reliably JSON; the status carries the signal.
            Err(_) if status >= 400 => Value::Null,
            Err(e) => {
                return Err(MarketPulseError::Malformed(format!(
                    "failed to parse response JSON: {e}"
                )))
            }
        };

        Ok(ApiResponse {
            status,
            body,
            retry_after,
        })
    }
}

/// Test backend with queued responses and a log of observed requests.
pub struct FakeBackend {
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, MarketPulseError>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_response(&self, response: ApiResponse) -> &Self {
        self.responses
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Ok(response));
        self
    }

    pub fn push_error(&self, error: MarketPulseError) -> &Self {
        self.responses
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Err(error));
        self
    }

    /// All requests observed so far, in order.
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiBackend for FakeBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, MarketPulseError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        responses.pop_front().unwrap_or_else(|| {
            Err(MarketPulseError::Upstream {
                status: 0,
                message: "FakeBackend exhausted".to_string(),
            })
        })
    }
}
