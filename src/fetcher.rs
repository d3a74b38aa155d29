//! Page retrieval through the Zyte API.

use crate::config::EngineConfig;
use crate::error::{Error, ProviderError, Result};
use crate::page::readable_text;
use crate::types::FetchResult;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Retrieves page content for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the readable content of `url` and the cost of doing so.
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractRequest<'a> {
    url: &'a str,
    browser_html: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractResponse {
    browser_html: Option<String>,
}

/// [`Fetcher`] backed by Zyte's browser rendering.
pub struct ZyteFetcher {
    api_key: String,
    endpoint: String,
    cost_per_request: f64,
    http_client: reqwest::Client,
}

impl ZyteFetcher {
    /// Create a fetcher from an engine config.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid User-Agent: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.zyte_key.clone(),
            endpoint: format!("{}/v1/extract", config.zyte_base_url),
            cost_per_request: config.fetch_cost_per_request,
            http_client,
        })
    }

    async fn browser_html(&self, url: &str) -> std::result::Result<String, ProviderError> {
        debug!(url = url, "Requesting rendered page from Zyte");

        let response = self
            .http_client
            .post(&self.endpoint)
            .basic_auth(&self.api_key, Some(""))
            .json(&ExtractRequest {
                url,
                browser_html: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_response(response).await);
        }

        let body = response.bytes().await?;
        let parsed: ExtractResponse = serde_json::from_slice(&body)?;
        parsed.browser_html.ok_or_else(|| {
            ProviderError::MalformedResponse("response has no browserHtml field".into())
        })
    }
}

#[async_trait]
impl Fetcher for ZyteFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let html = self
            .browser_html(url)
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let content = readable_text(&html);
        if content.is_empty() {
            return Err(Error::fetch(
                url,
                ProviderError::MalformedResponse("rendered page has no readable text".into()),
            ));
        }

        debug!(
            url = url,
            html_bytes = html.len(),
            content_bytes = content.len(),
            "Fetched page"
        );

        Ok(FetchResult {
            content,
            cost: self.cost_per_request,
        })
    }
}
