use marketpulse_backend::{ApiBackend, ApiRequest, ApiResponse, FakeBackend};
use marketpulse_core::MarketPulseError;
use serde_json::json;

fn request(url: &str) -> ApiRequest {
    ApiRequest {
        url: url.to_string(),
        headers: vec![],
        body: json!({"q": "test"}),
    }
}

#[tokio::test]
async fn serves_queued_responses_in_order() {
    let backend = FakeBackend::new();
    backend.push_response(ApiResponse {
        status: 200,
        body: json!({"n": 1}),
        retry_after: None,
    });
    backend.push_response(ApiResponse {
        status: 200,
        body: json!({"n": 2}),
        retry_after: None,
    });

    let first = backend.send(request("http://a")).await.unwrap();
    let second = backend.send(request("http://b")).await.unwrap();
    assert_eq!(first.body["n"], 1);
    assert_eq!(second.body["n"], 2);
}

#[tokio::test]
async fn records_requests() {
    let backend = FakeBackend::new();
    backend.push_response(ApiResponse {
        status: 200,
        body: json!({}),
        retry_after: None,
    });

    backend.send(request("http://example/search")).await.unwrap();
    let seen = backend.requests().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, "http://example/search");
    assert_eq!(backend.request_count().await, 1);
}

#[tokio::test]
async fn queued_errors_are_returned() {
    let backend = FakeBackend::new();
    backend.push_error(MarketPulseError::Timeout("scripted".to_string()));

    let err = backend.send(request("http://a")).await.unwrap_err();
    assert!(matches!(err, MarketPulseError::Timeout(_)));
}

#[tokio::test]
async fn errors_when_exhausted() {
    let backend = FakeBackend::new();
    let err = backend.send(request("http://a")).await.unwrap_err();
    assert!(err.to_string().contains("exhausted"));
}
