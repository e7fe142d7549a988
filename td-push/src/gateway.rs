//! Push gateway seam and HTTP implementation.
//!
//! `PushGateway` is the trait the relay handlers depend on; production
//! wires in `HttpPushGateway`, tests substitute a recording fake. There is
//! deliberately no retry here: delivery is a best-effort side channel and
//! callers drop transient failures after logging them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use td_core::config::PushConfig;
use td_core::error::{TdError, TdResult};

use crate::message::PushMessage;

/// Seam for dispatching push messages.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Deliver one message to its token. An `Ok` result means the gateway
    /// accepted the message, nothing more.
    async fn send(&self, message: &PushMessage) -> TdResult<()>;
}

/// HTTP client posting messages to the configured gateway endpoint.
#[derive(Clone)]
pub struct HttpPushGateway {
    inner: Client,
    /// Endpoint URL messages are posted to.
    endpoint: String,
    /// Bearer key presented to the gateway.
    api_key: String,
}

impl HttpPushGateway {
    /// Create a gateway client from push configuration.
    pub fn new(config: &PushConfig) -> TdResult<Self> {
        if config.endpoint.is_empty() {
            return Err(TdError::MissingConfig("push.endpoint".into()));
        }
        if config.api_key.is_empty() {
            return Err(TdError::MissingConfig("push.api_key".into()));
        }

        let inner = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TdError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// The configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check the HTTP status code and convert to TdError if needed.
    async fn check_status(response: Response) -> TdResult<()> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TdError::AuthFailed(format!("gateway returned {status}")));
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(TdError::GatewayError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }

    /// Classify a reqwest error into a TdError variant.
    fn classify_error(e: reqwest::Error) -> TdError {
        if e.is_timeout() {
            TdError::Timeout(e.to_string())
        } else if e.is_connect() {
            TdError::Http(format!("connection failed: {e}"))
        } else {
            TdError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(&self, message: &PushMessage) -> TdResult<()> {
        debug!("POST {} (channel: {})", self.endpoint, message.android.notification.channel_id);

        let response = self
            .inner
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(Self::classify_error)?;

        Self::check_status(response).await
    }
}
