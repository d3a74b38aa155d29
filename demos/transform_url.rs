//! Transform a single product URL.
//!
//! Run with: `ZYTE_KEY=... OPENAI_API_KEY=... cargo run --example transform_url -- <url>`

use product2schema::{AsyncEngine, EngineConfig};

#[tokio::main]
async fn main() -> Result<(), product2schema::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product2schema=info".into()),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com/product".into());

    // Reads ZYTE_KEY and OPENAI_API_KEY
    let engine = AsyncEngine::new(EngineConfig::from_env()?)?;

    let response = engine.transform_url(&url).await?;

    println!("Product schema: {:#?}", response.product_schema);
    println!("Cost: ${:.6}", response.cost);

    Ok(())
}
