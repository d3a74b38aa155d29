//! The URL-to-schema pipeline and its async and blocking front ends.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::extractor::{OpenAiExtractor, SchemaExtractor};
use crate::fetcher::{Fetcher, ZyteFetcher};
use crate::types::Response;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Fetch, then extract, then assemble. Any failure ends the run.
pub(crate) async fn run_pipeline(
    fetcher: &dyn Fetcher,
    extractor: &dyn SchemaExtractor,
    url: &str,
) -> Result<Response> {
    let start = Instant::now();

    let page = fetcher.fetch(url).await?;
    debug!(url = url, cost = page.cost, "Fetch stage complete");

    let extraction = extractor.extract(&page.content).await?;
    debug!(url = url, cost = extraction.cost, "Extraction stage complete");

    let response = Response {
        url: url.to_string(),
        product_schema: extraction.schema,
        cost: page.cost + extraction.cost,
    };

    info!(
        url = url,
        cost = response.cost,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Transformed URL to product schema"
    );

    Ok(response)
}

/// Non-blocking engine.
///
/// Cheap to clone; clones share the same providers, so one engine can serve
/// many concurrent `transform_url` calls.
///
/// # Example
///
/// ```rust,no_run
/// use product2schema::AsyncEngine;
///
/// #[tokio::main]
/// async fn main() -> Result<(), product2schema::Error> {
///     let engine = AsyncEngine::from_keys("zyte-key", "openai-key")?;
///     let response = engine.transform_url("https://example.com/product").await?;
///     println!("{:?} (${:.4})", response.product_schema, response.cost);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AsyncEngine {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn SchemaExtractor>,
}

impl AsyncEngine {
    /// Create an engine backed by Zyte and OpenAI.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self::with_providers(
            ZyteFetcher::new(&config)?,
            OpenAiExtractor::new(&config)?,
        ))
    }

    /// Create an engine with default settings from the two API keys.
    pub fn from_keys(zyte_key: impl Into<String>, openai_key: impl Into<String>) -> Result<Self> {
        Self::new(EngineConfig::builder(zyte_key, openai_key).build()?)
    }

    /// Create an engine over custom providers.
    pub fn with_providers(
        fetcher: impl Fetcher + 'static,
        extractor: impl SchemaExtractor + 'static,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(extractor),
        }
    }

    /// Turn a product URL into a product schema.
    pub async fn transform_url(&self, url: &str) -> Result<Response> {
        run_pipeline(self.fetcher.as_ref(), self.extractor.as_ref(), url).await
    }
}

/// Blocking engine.
///
/// Runs the same pipeline as [`AsyncEngine`] on a private single-threaded
/// runtime. `transform_url` must not be called from inside an async context;
/// creating or dropping the engine there is fine.
pub struct BlockingEngine {
    inner: AsyncEngine,
    // Always `Some` until dropped.
    runtime: Option<tokio::runtime::Runtime>,
}

impl BlockingEngine {
    /// Create an engine backed by Zyte and OpenAI.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::from_async(AsyncEngine::new(config)?)
    }

    /// Create an engine with default settings from the two API keys.
    pub fn from_keys(zyte_key: impl Into<String>, openai_key: impl Into<String>) -> Result<Self> {
        Self::from_async(AsyncEngine::from_keys(zyte_key, openai_key)?)
    }

    /// Create an engine over custom providers.
    pub fn with_providers(
        fetcher: impl Fetcher + 'static,
        extractor: impl SchemaExtractor + 'static,
    ) -> Result<Self> {
        Self::from_async(AsyncEngine::with_providers(fetcher, extractor))
    }

    fn from_async(inner: AsyncEngine) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to start runtime: {}", e)))?;
        Ok(Self {
            inner,
            runtime: Some(runtime),
        })
    }

    /// Turn a product URL into a product schema, blocking until done.
    pub fn transform_url(&self, url: &str) -> Result<Response> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::Config(
                "BlockingEngine::transform_url called from within an async runtime; use AsyncEngine instead"
                    .into(),
            ));
        }
        let Some(runtime) = &self.runtime else {
            return Err(Error::Config("runtime has been shut down".into()));
        };
        runtime.block_on(self.inner.transform_url(url))
    }
}

impl Drop for BlockingEngine {
    fn drop(&mut self) {
        // A plain drop blocks on shutdown, which panics inside an async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
