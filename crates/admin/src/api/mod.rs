//! Backend REST API client for admin endpoints.
//!
//! Every call except login carries the signed-in admin's bearer token.
//! Nothing is cached: the admin always edits against fresh data.

mod auth;
mod images;
mod orders;
mod products;
mod taxonomy;

pub use images::ImageUpload;
pub use orders::OrderListQuery;
pub use products::ProductListQuery;
pub use taxonomy::{NewTaxonomyEntry, TaxonomyEntry, TaxonomyKind};

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use threadline_core::{Acknowledgement, Envelope, EnvelopeError};
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer token was missing, expired or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The envelope reported failure or carried no data.
    #[error("{0}")]
    Envelope(#[from] EnvelopeError),

    /// An endpoint URL could not be built.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the failure is on our side or the backend's rather than the
    /// operator's input.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Http(_) | Self::Parse(_) | Self::InvalidUrl(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Envelope(EnvelopeError::MissingData) => true,
            Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::RateLimited(_)
            | Self::Envelope(EnvelopeError::Rejected(_)) => false,
        }
    }

    /// Short description for flash messages.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Envelope(EnvelopeError::Rejected(message)) => message.clone(),
            Self::Status { status, message } if (400..500).contains(status) => message.clone(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(_) => "Your session has expired.".to_string(),
            Self::RateLimited(seconds) => format!("Rate limited, retry in {seconds}s."),
            _ => "The backend API is unavailable.".to_string(),
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage_base_url: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("threadline-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                storage_base_url: config.storage_base_url.clone(),
            }),
        })
    }

    /// Storage bucket prefix for relative image paths.
    #[must_use]
    pub fn storage_base_url(&self) -> &str {
        &self.inner.storage_base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .bearer_auth(token.expose_secret())
    }

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&response_text)
                .ok()
                .and_then(|body| body.message.or(body.error))
                .unwrap_or_else(|| response_text.chars().take(200).collect());

            return Err(match status {
                reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(message),
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    ApiError::Unauthorized(message)
                }
                _ => {
                    tracing::error!(
                        status = %status,
                        body = %response_text.chars().take(500).collect::<String>(),
                        "Backend API returned non-success status"
                    );
                    ApiError::Status {
                        status: status.as_u16(),
                        message,
                    }
                }
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse backend API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request and unwrap the `data` envelope.
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.execute(request).await?;
        Ok(envelope.into_result()?)
    }

    /// Send a request whose response only acknowledges the action.
    async fn acknowledge(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<String>, ApiError> {
        let ack: Acknowledgement = self.execute(request).await?;
        Ok(ack.into_result()?)
    }
}
