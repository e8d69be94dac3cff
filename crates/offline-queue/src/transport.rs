//! Delivery transports for queued operations.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::TransportError;
use crate::types::{QueuedOperation, WriteMethod};

/// Default timeout for a delivery attempt.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Seam between the sync engine and the network.
///
/// A delivery attempt resolves with the HTTP status whenever any response was
/// received; `Err` means no response arrived and the attempt is retryable.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, operation: &QueuedOperation) -> Result<u16, TransportError>;
}

/// HTTP transport against the app's API origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the API origin, e.g. `https://pool.example.app`;
    /// queued operations carry paths relative to it.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn headers(operation: &QueuedOperation) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in &operation.headers {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                warn!("skipping invalid header name {name:?} on operation {}", operation.id);
                continue;
            };
            let Ok(value) = HeaderValue::from_str(value) else {
                warn!("skipping invalid header value for {name} on operation {}", operation.id);
                continue;
            };
            headers.insert(name, value);
        }
        headers
    }

    fn url_for(&self, operation: &QueuedOperation) -> String {
        if operation.url.starts_with('/') {
            format!("{}{}", self.base_url, operation.url)
        } else {
            format!("{}/{}", self.base_url, operation.url)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, operation: &QueuedOperation) -> Result<u16, TransportError> {
        let url = self.url_for(operation);
        let mut request = match operation.method {
            WriteMethod::Post => self.client.post(&url),
            WriteMethod::Put => self.client.put(&url),
            WriteMethod::Delete => self.client.delete(&url),
        };
        request = request.headers(Self::headers(operation));
        if let Some(body) = &operation.body {
            request = request.body(body.to_payload());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        debug!(
            "delivered {} {} -> {}",
            operation.method.as_str(),
            operation.url,
            status
        );
        Ok(status)
    }
}
