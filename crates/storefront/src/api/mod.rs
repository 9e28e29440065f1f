//! Backend REST API client.
//!
//! # Architecture
//!
//! - The backend API is the source of truth - NO local persistence
//! - Responses arrive wrapped in `{ data }` or `{ success, data, message }`
//!   envelopes, unwrapped by [`ApiClient::execute`]
//! - Catalog reads are cached via `moka` (5 minute TTL)
//! - Customer calls carry the session's bearer token
//!
//! # Example
//!
//! ```rust,ignore
//! use threadline_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.product("linen-shirt").await?;
//! ```

mod account;
mod cache;
mod catalog;
mod orders;

pub use catalog::{DEFAULT_PAGE_SIZE, ProductQuery, SortOrder};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use threadline_core::{Acknowledgement, Envelope, EnvelopeError};
use url::Url;

use crate::config::ApiConfig;
use cache::{CacheKey, CacheValue};

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
    /// Message safe to show to a shopper.
    ///
    /// Business rejections carry the backend's message; everything else gets
    /// a generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Envelope(EnvelopeError::Rejected(message)) => message.clone(),
            Self::Status { status, message } if (400..500).contains(status) => message.clone(),
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::Unauthorized(_) => "Please sign in again.".to_string(),
            Self::RateLimited(_) => "Too many requests, please try again shortly.".to_string(),
            _ => "Something went wrong talking to the store. Please try again.".to_string(),
        }
    }

    /// Whether the failure is on our side or the backend's rather than the
    /// shopper's.
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
}

/// Error body shape used by the backend on failures.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage_base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("threadline-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                storage_base_url: config.storage_base_url.clone(),
                cache,
            }),
        })
    }

    /// Storage bucket prefix for relative image paths.
    #[must_use]
    pub fn storage_base_url(&self) -> &str {
        &self.inner.storage_base_url
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded.
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
        token: Option<&SecretString>,
    ) -> reqwest::RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
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
    async fn acknowledge(&self, request: reqwest::RequestBuilder) -> Result<Option<String>, ApiError> {
        let ack: Acknowledgement = self.execute(request).await?;
        Ok(ack.into_result()?)
    }

    /// Drop every cached catalog response.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
