//! HTTP transport for the platform's GraphQL endpoint.
//!
//! Attaches the three identifying headers to every request and wraps any
//! transport failure together with the target URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::graphql::{GraphQlRequest, QueryExecutor};

pub const API_TOKEN_HEADER: &str = "Dagster-Cloud-Api-Token";
pub const VERSION_HEADER: &str = "Dagster-Cloud-Version";
pub const SCOPE_HEADER: &str = "Dagster-Cloud-Scope";

/// Failures below the domain layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint url={url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header {name}: {message}")]
    InvalidHeader { name: &'static str, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("url={url:?} error={source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("url={url:?} status={status} body={body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("{operation} returned errors: {}", messages.join("; "))]
    GraphQl {
        operation: String,
        messages: Vec<String>,
    },

    #[error("{operation} returned no data")]
    MissingData { operation: String },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Identity attached to every request.
#[derive(Clone)]
pub struct AuthHeaders {
    pub api_token: String,
    pub version: String,
    pub scope: String,
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("api_token", &"<redacted>")
            .field("version", &self.version)
            .field("scope", &self.scope)
            .finish()
    }
}

impl AuthHeaders {
    fn to_header_map(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (API_TOKEN_HEADER, &self.api_token),
            (VERSION_HEADER, &self.version),
            (SCOPE_HEADER, &self.scope),
        ] {
            let mut value =
                HeaderValue::from_str(value).map_err(|e| TransportError::InvalidHeader {
                    name,
                    message: e.to_string(),
                })?;
            if name == API_TOKEN_HEADER {
                value.set_sensitive(true);
            }
            let header =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    TransportError::InvalidHeader {
                        name,
                        message: e.to_string(),
                    }
                })?;
            headers.insert(header, value);
        }
        Ok(headers)
    }
}

/// GraphQL endpoint for `deployment` within `organization`.
pub fn endpoint_url(organization: &str, deployment: &str) -> Result<Url, TransportError> {
    let raw = format!("https://{organization}.dagster.cloud/{deployment}/graphql");
    Url::parse(&raw).map_err(|source| TransportError::InvalidUrl { url: raw, source })
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// [`QueryExecutor`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpExecutor {
    /// Build an executor for `endpoint`.
    ///
    /// `timeout` bounds each request; `None` leaves requests unbounded so the
    /// caller's own cancellation decides.
    pub fn new(
        endpoint: Url,
        auth: &AuthHeaders,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("dcctl/", env!("CARGO_PKG_VERSION")))
            .default_headers(auth.to_header_map()?);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Client)?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryExecutor for HttpExecutor {
    async fn execute(&self, request: GraphQlRequest) -> Result<Value, TransportError> {
        let url = self.endpoint.to_string();
        let operation = request.operation_name;

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|source| TransportError::Http {
                url: url.clone(),
                source,
            })?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            return Err(TransportError::GraphQl {
                operation: operation.to_string(),
                messages: errors.into_iter().map(|e| e.message).collect(),
            });
        }

        envelope.data.ok_or_else(|| TransportError::MissingData {
            operation: operation.to_string(),
        })
    }
}
