use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderName;

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header on
/// every request.
///
/// `header_name` is the header field to set and `key` is the raw value
/// written into it. The measurement API authenticates with `X-API-Key`;
/// use [`ApiKey::openaq`] for that scheme.
pub struct ApiKey<C> {
    pub inner: C,
    pub header_name: String,
    pub key: String,
}

impl<C> ApiKey<C> {
    /// Convenience constructor for the OpenAQ scheme: `X-API-Key: <key>`.
    pub fn openaq(inner: C, key: String) -> Self {
        Self {
            inner,
            header_name: "X-API-Key".to_string(),
            key,
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let header_name = HeaderName::from_bytes(self.header_name.as_bytes())
            .expect("ApiKey: invalid header name");
        req.headers_mut()
            .insert(header_name, self.key.parse().expect("ApiKey: invalid key"));
        self.inner.execute(req).await
    }
}
