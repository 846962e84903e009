use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal HTTP execution capability.
///
/// Both external services are consumed through this trait so tests can
/// substitute a canned implementation. The implementor owns the underlying
/// connection pool and releases it on drop.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
