//! 检测服务共用的 HTTP 请求与重试逻辑

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::time::sleep;

use crate::config::ProviderConfig;
use crate::errors::ProviderError;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Thin wrapper over a per-adapter `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retries: u32,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("cysafe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            retries: config.retries,
        })
    }

    /// Sends the request built by `build`, retrying transient failures with
    /// exponential backoff. `Ok(None)` means the service does not know the
    /// target (HTTP 404).
    pub async fn send_with_retry<F>(&self, build: F) -> Result<Option<Value>, ProviderError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut wait_time = INITIAL_BACKOFF;
        let mut attempt = 0;

        loop {
            match self.send_once(&build).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    log::debug!(
                        "transient provider error ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        self.retries,
                        wait_time
                    );
                    sleep(wait_time).await;
                    wait_time *= 2; // Exponential backoff
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<F>(&self, build: &F) -> Result<Option<Value>, ProviderError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = build(&self.client).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Network(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(Some(body))
    }
}

/// Map HTTP status codes to specific ProviderError variants
pub fn status_error(status: StatusCode) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication,
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded,
        s => ProviderError::Server {
            status_code: s.as_u16(),
        },
    }
}
