//! Client for the DealX marketplace search API.
//!
//! One call, one round trip: [`DealxClient::search`] issues a single GET to
//! `{base_url}/api/ads/search` and returns the upstream JSON untouched. No
//! timeout override, no retry, no pagination follow-up.

pub mod model;

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

/// Path of the search endpoint, resolved against the base URL.
pub const SEARCH_PATH: &str = "/api/ads/search";

/// Status reported when the HTTP layer failed without a response.
pub const FALLBACK_STATUS: u16 = 500;

/// Validated search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Free-text query; may be empty.
    pub query: String,
    /// Sort expression such as `-created`; empty means unsorted.
    pub sort: String,
    /// 1-based page offset.
    pub offset: i64,
    /// Page size.
    pub limit: i64,
}

/// Errors from a search round trip.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The API answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-supplied `error` field, or a generic description.
        message: String,
    },

    /// The request failed before a complete response was received.
    #[error("{message}")]
    Transport {
        /// HTTP status, if the failure carried one.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// The search URL could not be built from the base URL.
    #[error("invalid search URL: {0}")]
    InvalidUrl(String),

    /// A success response whose body is not JSON.
    #[error("response body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

impl SearchError {
    /// HTTP status for failures that happened at the HTTP layer.
    ///
    /// Transport failures without a status report [`FALLBACK_STATUS`].
    /// Returns `None` for failures outside the HTTP exchange.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { status, .. } => Some(status.unwrap_or(FALLBACK_STATUS)),
            Self::InvalidUrl(_) | Self::InvalidBody(_) => None,
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// HTTP client bound to one DealX deployment.
///
/// The base URL is kept as configured and parsed on every search, so a
/// malformed value fails the individual call rather than the server.
#[derive(Debug, Clone)]
pub struct DealxClient {
    http: reqwest::Client,
    base_url: String,
}

impl DealxClient {
    /// Creates a client for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Builds the search URL for `params`.
    ///
    /// `q`, `offset` and `limit` are always present. `sort` is omitted when
    /// empty, since the API treats a missing sort differently from `sort=`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidUrl`] if the base URL does not parse or
    /// cannot carry a path.
    pub fn search_url(&self, params: &SearchParams) -> Result<Url, SearchError> {
        let mut url = Url::parse(&self.base_url)
            .and_then(|base| base.join(SEARCH_PATH))
            .map_err(|e| SearchError::InvalidUrl(e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &params.query);
            if !params.sort.is_empty() {
                pairs.append_pair("sort", &params.sort);
            }
            pairs.append_pair("offset", &params.offset.to_string());
            pairs.append_pair("limit", &params.limit.to_string());
        }

        Ok(url)
    }

    /// Runs one search and returns the upstream JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the URL cannot be built, the request fails,
    /// the API answers with a non-success status, or the body is not JSON.
    pub async fn search(&self, params: &SearchParams) -> Result<Value, SearchError> {
        let url = self.search_url(params)?;
        tracing::debug!(url = %url, "Querying DealX search API");

        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            // An unreadable error body still reports the real status
            let body = response.text().await.ok();
            let error = status_error(status, body.as_deref());
            tracing::warn!(status, message = %error, "DealX search failed");
            return Err(error);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(SearchError::InvalidBody)
    }
}

/// Maps a non-success response to [`SearchError::Status`].
fn status_error(status: u16, body: Option<&str>) -> SearchError {
    let message = body
        .and_then(upstream_error_message)
        .unwrap_or_else(|| format!("Request failed with status code {status}"));
    SearchError::Status { status, message }
}

/// Extracts a non-empty string `error` field from an error body.
fn upstream_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
