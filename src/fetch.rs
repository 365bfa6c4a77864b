//! Remote retrieval.
//!
//! [`Transport`] is the seam between the adapter and the network. The
//! production implementation, [`HttpTransport`], issues one attempt per
//! request with `reqwest` and classifies failures into [`FetchError`].
//! Tests substitute their own transport.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use listing_search_core::query::ProviderQuery;

/// Response bodies quoted in errors are cut to this many characters.
const BODY_EXCERPT_CHARS: usize = 512;

/// A fully built provider request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Provider name, for logs and errors.
    pub provider: String,
    pub url: Url,
    pub headers: HeaderMap,
    /// `Params` are sent as a `GET` query string, `Json` as a `POST` body.
    pub query: ProviderQuery,
    pub timeout: Option<Duration>,
}

/// Why a retrieval produced no usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network error, DNS failure, refused connection, or timeout.
    #[error("could not reach {provider}: {source}")]
    ConnectivityFailure {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The provider answered with a non-success status.
    #[error("{provider} rejected the request with HTTP {status}: {body}")]
    ProviderRejection {
        provider: String,
        status: u16,
        body: String,
    },
    /// A success status whose body is not JSON.
    #[error("{provider} returned an unreadable response: {source}")]
    MalformedResponse {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::ConnectivityFailure { .. } => "connectivity_failure",
            FetchError::ProviderRejection { .. } => "provider_rejection",
            FetchError::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Executes provider requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the decoded JSON body.
    async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError>;

    /// Send `request` and succeed on any 2xx status, ignoring the body.
    async fn probe(&self, request: &ProviderRequest) -> Result<(), FetchError>;
}

/// `reqwest`-backed transport. Cheap to clone; clones share a pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("listing-search/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn send(&self, request: &ProviderRequest) -> Result<reqwest::Response, FetchError> {
        let mut builder = match &request.query {
            ProviderQuery::Params(params) => self.client.get(request.url.clone()).query(params),
            ProviderQuery::Json(body) => self.client.post(request.url.clone()).json(body),
        };
        builder = builder.headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::ConnectivityFailure {
                provider: request.provider.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ProviderRejection {
                provider: request.provider.clone(),
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ProviderRequest) -> Result<Value, FetchError> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::ConnectivityFailure {
                provider: request.provider.clone(),
                source: Box::new(e),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::MalformedResponse {
            provider: request.provider.clone(),
            source: Box::new(e),
        })
    }

    async fn probe(&self, request: &ProviderRequest) -> Result<(), FetchError> {
        self.send(request).await.map(|_| ())
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
