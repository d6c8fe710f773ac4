use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;

use crate::config::IngestSettings;
use crate::scenario::Event;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("missing ingestion endpoint")]
    MissingEndpoint,

    #[error("invalid ingestion endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("invalid ingestion token: {0}")]
    InvalidToken(String),

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to deliver event: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("ingestion endpoint rejected event: HTTP {status}")]
    Status { status: u16 },
}

/// Destination for replayed events.
#[async_trait]
pub trait IngestSink: Send + Sync {
    async fn deliver(&self, event: &Event) -> Result<(), SinkError>;
}

/// Posts each event as its own JSON request with an
/// `Authorization: <scheme> <token>` header.
#[derive(Debug, Clone)]
pub struct HttpIngestSink {
    client: reqwest::Client,
    endpoint: Url,
    authorization: HeaderValue,
}

impl HttpIngestSink {
    pub fn new(endpoint: &str, token: &str, settings: &IngestSettings) -> Result<Self, SinkError> {
        if endpoint.trim().is_empty() {
            return Err(SinkError::MissingEndpoint);
        }
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| SinkError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let mut authorization =
            HeaderValue::from_str(&format!("{} {}", settings.auth_scheme, token))
                .map_err(|e| SinkError::InvalidToken(e.to_string()))?;
        authorization.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(SinkError::Client)?;

        Ok(Self {
            client,
            endpoint,
            authorization,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl IngestSink for HttpIngestSink {
    async fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(event)
            .send()
            .await
            .map_err(SinkError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
