//! Response uploader interface and default HTTP implementation
//!
//! The engine talks to the remote service through the [`Uploader`] trait.
//! [`HttpUploader`] is the default implementation: it POSTs one response per
//! request and maps every transport and protocol failure into the
//! [`UploadError`] taxonomy before the engine sees it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::value::RawValue;
use std::time::Duration;
use tracing::debug;

use crate::config::{ConfigError, UploaderConfig};
use crate::error::UploadError;
use crate::models::ResponseRecord;

/// Upload transport for survey responses
///
/// Implementations own the transport deadline and surface it as
/// [`UploadError::Timeout`]; the engine imposes no timeout of its own.
/// The record must not be mutated.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload one response; Ok means the server accepted it
    async fn upload(&self, record: &ResponseRecord) -> Result<(), UploadError>;
}

/// Wire payload for one response upload
///
/// `answers` is embedded verbatim from the stored JSON text; the engine
/// never interprets it.
#[derive(Serialize)]
struct UploadPayload<'a> {
    id: &'a str,
    farmer_id: &'a str,
    created_at: i64,
    answers: &'a RawValue,
}

/// HTTP uploader posting responses to a collection endpoint
pub struct HttpUploader {
    client: Client,
    endpoint: String,
}

impl HttpUploader {
    /// Create a new HTTP uploader
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: endpoint.into(),
        }
    }

    /// Create an HTTP uploader from config
    ///
    /// Returns an error if no endpoint is configured.
    pub fn from_config(config: &UploaderConfig) -> Result<Self, ConfigError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| ConfigError::MissingRequired("uploader.endpoint".to_string()))?;

        Ok(Self::new(
            endpoint,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Create an HTTP uploader with a custom reqwest Client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, record: &ResponseRecord) -> Result<(), UploadError> {
        // A record whose stored answers are not valid JSON can never be
        // encoded into a request body.
        let answers: &RawValue = serde_json::from_str(&record.answers_json)
            .map_err(|e| UploadError::Serialization(e.to_string()))?;

        let payload = UploadPayload {
            id: &record.id,
            farmer_id: &record.farmer_id,
            created_at: record.created_at,
            answers,
        };

        debug!(id = record.id.as_str(), endpoint = self.endpoint.as_str(), "Uploading response");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UploadError::Timeout
                } else if e.is_connect() {
                    UploadError::NoInternet
                } else {
                    UploadError::Unknown(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(id = record.id.as_str(), status = status.as_u16(), "Response accepted");
            return Ok(());
        }

        let message = response.text().await.ok().filter(|body| !body.is_empty());
        Err(UploadError::ServerError {
            code: status.as_u16(),
            message,
        })
    }
}
