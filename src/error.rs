//! Error types for product2schema.

use thiserror::Error;

/// Result type for product2schema operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`crate::AsyncEngine::transform_url`] and friends.
///
/// Every variant aborts the pipeline; no partial response is ever produced.
#[derive(Error, Debug)]
pub enum Error {
    /// Retrieving page content from the scraping service failed.
    #[error("Fetch failed for {url}: {source}")]
    Fetch {
        /// URL that was being fetched
        url: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// The language-model call failed.
    #[error("Schema extraction failed: {0}")]
    Extraction(#[source] ProviderError),

    /// The model answered, but its output is not a usable product schema.
    #[error("Could not parse schema from model output: {message}")]
    SchemaParse {
        /// What went wrong while parsing
        message: String,
        /// The raw model output
        raw: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn fetch(url: &str, source: impl Into<ProviderError>) -> Self {
        Error::Fetch {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn schema_parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Error::SchemaParse {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

/// Underlying cause of a failed provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The provider throttled the request. Nothing retries it.
    #[error("Rate limited (retry after {retry_after:?} seconds): {message}")]
    RateLimit {
        /// Seconds the provider asked us to wait, if it said
        retry_after: Option<u64>,
        /// Error message
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Network or HTTP error.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body was JSON but lacked an expected field.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// The call was refused before any request was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e)
        }
    }
}

impl ProviderError {
    /// Build a provider error from a non-success response.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        });

        match status {
            401 | 403 => ProviderError::Authentication(message),
            429 => ProviderError::RateLimit {
                retry_after,
                message,
            },
            _ => ProviderError::Api { status, message },
        }
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// OpenAI nests it as `{"error": {"message": ..}}`, Zyte uses problem+json
/// with `detail`/`title`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidates = [
        value.pointer("/error/message"),
        value.get("error").filter(|e| e.is_string()),
        value.get("detail"),
        value.get("title"),
    ];
    let message = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string);
    message
}
