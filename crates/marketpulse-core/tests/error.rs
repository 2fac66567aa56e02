use std::time::Duration;

use marketpulse_core::MarketPulseError;

#[test]
fn rate_limited_and_timeout_are_retryable() {
    let rate_limited = MarketPulseError::RateLimited {
        message: "slow down".to_string(),
        retry_after: None,
    };
    let timeout = MarketPulseError::Timeout("30s elapsed".to_string());
    assert!(rate_limited.is_retryable());
    assert!(timeout.is_retryable());
}

#[test]
fn other_errors_are_not_retryable() {
    let upstream = MarketPulseError::Upstream {
        status: 500,
        message: "boom".to_string(),
    };
    assert!(!upstream.is_retryable());
    assert!(!MarketPulseError::EmptyQuery.is_retryable());
    assert!(!MarketPulseError::Config("missing key".to_string()).is_retryable());
}

#[test]
fn retry_after_only_on_rate_limit() {
    let hinted = MarketPulseError::RateLimited {
        message: "slow down".to_string(),
        retry_after: Some(Duration::from_secs(2)),
    };
    assert_eq!(hinted.retry_after(), Some(Duration::from_secs(2)));
    assert_eq!(
        MarketPulseError::Timeout("elapsed".to_string()).retry_after(),
        None
    );
}

#[test]
fn display_includes_status() {
    let err = MarketPulseError::Upstream {
        status: 503,
        message: "unavailable".to_string(),
    };
    assert_eq!(err.to_string(), "upstream error (503): unavailable");
}
