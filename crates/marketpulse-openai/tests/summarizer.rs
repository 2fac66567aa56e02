use std::sync::Arc;
use std::time::Duration;

use marketpulse_backend::{ApiResponse, FakeBackend, RetryPolicy};
use marketpulse_core::{AnalysisItem, AnalysisSummary, MarketPulseError, Summarizer};
use marketpulse_openai::{OpenAiConfig, OpenAiSummarizer};
use serde_json::json;

fn completion(content: &str) -> ApiResponse {
    ApiResponse {
        status: 200,
        body: json!({
            "choices": [{"message": {"content": content}}]
        }),
        retry_after: None,
    }
}

fn sample_items() -> Vec<AnalysisItem> {
    vec![AnalysisItem {
        id: "p1".to_string(),
        title: "Launch day".to_string(),
        engagement: 40,
        ..Default::default()
    }]
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
    }
}

#[tokio::test]
async fn parses_well_formed_summary() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(completion(
        r#"{"overview": "strong week", "trends": ["video"], "competitors": ["acme"], "opportunities": ["short form"]}"#,
    ));
    let summarizer = OpenAiSummarizer::new(OpenAiConfig::new("key", "gpt-4o-mini"), backend);

    let summary = summarizer.summarize("launch", &sample_items()).await.unwrap();
    assert_eq!(summary.overview, "strong week");
    assert_eq!(summary.trends, vec!["video".to_string()]);
    assert_eq!(summary.competitors, vec!["acme".to_string()]);
    assert_eq!(summary.opportunities, vec!["short form".to_string()]);
}

#[tokio::test]
async fn tolerates_markdown_fences() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(completion(
        "```json\n{\"overview\": \"fenced\", \"trends\": []}\n```",
    ));
    let summarizer = OpenAiSummarizer::new(OpenAiConfig::new("key", "gpt-4o-mini"), backend);

    let summary = summarizer.summarize("launch", &sample_items()).await.unwrap();
    assert_eq!(summary.overview, "fenced");
}

#[tokio::test]
async fn malformed_content_degrades_to_fallback() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(completion("this is not JSON at all"));
    let summarizer = OpenAiSummarizer::new(OpenAiConfig::new("key", "gpt-4o-mini"), backend);

    let summary = summarizer.summarize("launch", &sample_items()).await.unwrap();
    assert_eq!(summary, AnalysisSummary::fallback());
}

#[tokio::test]
async fn missing_choices_degrades_to_fallback() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ApiResponse {
        status: 200,
        body: json!({"choices": []}),
        retry_after: None,
    });
    let summarizer = OpenAiSummarizer::new(OpenAiConfig::new("key", "gpt-4o-mini"), backend);

    let summary = summarizer.summarize("launch", &sample_items()).await.unwrap();
    assert_eq!(summary, AnalysisSummary::fallback());
}

#[tokio::test]
async fn partial_summary_fields_are_defaulted() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(completion(r#"{"trends": ["video", 7]}"#));
    let summarizer = OpenAiSummarizer::new(OpenAiConfig::new("key", "gpt-4o-mini"), backend);

    let summary = summarizer.summarize("launch", &sample_items()).await.unwrap();
    // Missing overview gets the documented default; non-string list entries are dropped
    assert_eq!(summary.overview, AnalysisSummary::FALLBACK_OVERVIEW);
    assert_eq!(summary.trends, vec!["video".to_string()]);
    assert!(summary.competitors.is_empty());
}

#[tokio::test]
async fn request_body_matches_contract() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(completion(r#"{"overview": "ok"}"#));
    let config = OpenAiConfig::new("secret", "gpt-4o-mini")
        .with_temperature(0.1)
        .with_max_tokens(256);
    let summarizer = OpenAiSummarizer::new(config, backend.clone());

    summarizer.summarize("launch", &sample_items()).await.unwrap();

    let requests = backend.requests().await;
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert!(req.url.ends_with("/chat/completions"));
    assert!(req
        .headers
        .iter()
        .any(|(k, v)| k == "Authorization" && v == "Bearer secret"));
    assert_eq!(req.body["model"], "gpt-4o-mini");
    assert_eq!(req.body["temperature"], 0.1);
    assert_eq!(req.body["max_tokens"], 256);
    assert_eq!(req.body["response_format"]["type"], "json_object");
    let messages = req.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    // User content embeds the query and the filtered items as JSON
    let user_content = messages[1]["content"].as_str().unwrap();
    assert!(user_content.contains("launch"));
    assert!(user_content.contains("Launch day"));
}

#[tokio::test]
async fn rate_limit_retries_then_errors() {
    let backend = Arc::new(FakeBackend::new());
    for _ in 0..3 {
        backend.push_response(ApiResponse {
            status: 429,
            body: json!({"error": {"message": "slow down"}}),
            retry_after: None,
        });
    }
    let summarizer = OpenAiSummarizer::new(OpenAiConfig::new("key", "gpt-4o-mini"), backend.clone())
        .with_retry_policy(fast_retry());

    let err = summarizer
        .summarize("launch", &sample_items())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketPulseError::RateLimited { .. }));
    assert_eq!(backend.request_count().await, 3);
}

#[tokio::test]
async fn blank_api_key_fails_without_network() {
    let backend = Arc::new(FakeBackend::new());
    let summarizer =
        OpenAiSummarizer::new(OpenAiConfig::new("", "gpt-4o-mini"), backend.clone());

    let err = summarizer
        .summarize("launch", &sample_items())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketPulseError::Config(_)));
    assert_eq!(backend.request_count().await, 0);
}
