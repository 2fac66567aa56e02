mod backend;
pub use backend::{ApiBackend, ApiRequest, ApiResponse, FakeBackend, HttpBackend};

mod retry;
pub use retry::{retry_with_backoff, RetryPolicy};
