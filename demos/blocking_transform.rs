//! Transform product URLs without an async runtime.
//!
//! Run with: `ZYTE_KEY=... OPENAI_API_KEY=... cargo run --example blocking_transform -- <url>...`

use product2schema::{BlockingEngine, EngineConfig};

fn main() -> Result<(), product2schema::Error> {
    tracing_subscriber::fmt().init();

    let config = EngineConfig::from_env()?;
    let engine = BlockingEngine::new(config)?;

    let mut total = 0.0;
    for url in std::env::args().skip(1) {
        match engine.transform_url(&url) {
            Ok(response) => {
                total += response.cost;
                match response.product() {
                    Ok(product) => println!("{}: {:#?}", url, product),
                    Err(_) => println!("{}: {:#?}", url, response.product_schema),
                }
            }
            // Each call is independent; keep going with the next URL.
            Err(e) => eprintln!("{}: {}", url, e),
        }
    }

    println!("Total cost: ${:.6}", total);
    Ok(())
}
