//! Turn product page URLs into structured product schemas.
//!
//! A URL goes through two provider calls, strictly in order: Zyte renders the
//! page, then an OpenAI chat model reads the page text and fills in a product
//! schema. The result carries the schema and the combined cost of both calls.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use product2schema::{AsyncEngine, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), product2schema::Error> {
//!     let config = EngineConfig::builder("your-zyte-key", "your-openai-key").build()?;
//!     let engine = AsyncEngine::new(config)?;
//!
//!     let response = engine
//!         .transform_url("https://example.com/product")
//!         .await?;
//!
//!     println!("{:#?}", response.product_schema);
//!     println!("Cost: ${:.6}", response.cost);
//!     Ok(())
//! }
//! ```
//!
//! Use [`BlockingEngine`] for the same pipeline without an async runtime.

mod config;
mod engine;
mod error;
mod extractor;
mod fetcher;
mod page;
mod types;
mod version;

pub use config::{EngineConfig, EngineConfigBuilder, OPENAI_KEY_ENV, ZYTE_KEY_ENV};
pub use engine::{AsyncEngine, BlockingEngine};
pub use error::{Error, ProviderError, Result};
pub use extractor::{OpenAiExtractor, SchemaExtractor};
pub use fetcher::{Fetcher, ZyteFetcher};
pub use page::readable_text;
pub use types::*;
pub use version::{build_user_agent, SDK_VERSION};
