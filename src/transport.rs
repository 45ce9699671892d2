//! GraphQL transport.
//!
//! [`GraphQLTransport`] is the seam between the pipeline and the network:
//! it takes a prepared [`GraphQLRequest`] and hands back the response's
//! `data` member. [`GitHubClient`] implements it over HTTPS with reqwest;
//! tests use [`crate::testing::MockTransport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{IntoStaleBotError, Result, StaleBotError};
use crate::query::GraphQLRequest;

/// Executes GraphQL requests.
///
/// Implementations must be `Send + Sync` so remediation can run several
/// issues concurrently.
#[async_trait]
pub trait GraphQLTransport: Send + Sync {
    /// Send a request and return its `data`.
    ///
    /// # Errors
    ///
    /// - [`StaleBotError::Transport`] when the request cannot be sent, the
    ///   server answers with a non-success status, or the response lists
    ///   GraphQL errors.
    /// - [`StaleBotError::MalformedResponse`] when the body is not a
    ///   GraphQL response or has no `data`.
    async fn execute(&self, request: &GraphQLRequest) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

/// GitHub GraphQL API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    /// Create a client authenticating with a personal access or app token.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or non-ASCII token, or if
    /// the HTTP client cannot be built.
    pub fn new(token: &str, api_url: &str, timeout: Duration) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(StaleBotError::config(
                "GitHub token is empty (set GH_TOKEN or pass --token)",
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| StaleBotError::config("GitHub token contains invalid characters"))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("stalebot/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StaleBotError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl GraphQLTransport for GitHubClient {
    #[instrument(skip(self, request), fields(operation = request.operation_name))]
    async fn execute(&self, request: &GraphQLRequest) -> Result<Value> {
        let operation = request.operation_name;

        let response = self
            .client
            .post(&self.api_url)
            .json(request)
            .send()
            .await
            .map_err(|e| StaleBotError::transport(operation, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StaleBotError::transport(
                operation,
                format!("GitHub API returned status {status}: {}", truncate(&body, 500)),
            ));
        }

        let body = response.text().await.into_transport_error(operation)?;
        let parsed: GraphQLResponse = serde_json::from_str(&body)
            .map_err(|e| StaleBotError::malformed(operation, e.to_string()))?;

        if let Some(errors) = parsed.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(StaleBotError::transport(
                operation,
                format!("GraphQL errors: {}", messages.join(", ")),
            ));
        }

        debug!("{} succeeded", operation);
        parsed
            .data
            .ok_or_else(|| StaleBotError::malformed(operation, "no data in GraphQL response"))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
