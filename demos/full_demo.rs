//! Full demo: configuration, one async transform, one blocking transform.
//!
//! Run with: `ZYTE_KEY=... OPENAI_API_KEY=... cargo run --example full_demo`

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use product2schema::{AsyncEngine, BlockingEngine, EngineConfig, Error, Response, SDK_VERSION};
use std::time::Duration;

const TEST_URL: &str = "https://www.oldandrarewhisky.co.uk/products/tormore-1992-26-year-old-the-first-editions-single-malt-scotch-whisky-70cl-45-7-abv";

fn get_url() -> String {
    std::env::var("PRODUCT_URL").unwrap_or_else(|_| TEST_URL.into())
}

fn header(text: &str) {
    println!();
    println!("{}", format!(" {} ", text).on_blue().bold());
    println!();
}

fn subheader(text: &str) {
    println!("{} {}", "▸".blue().bold(), text.bold().blue());
}

fn info(label: &str, value: &str) {
    println!("  {}: {}", label.dimmed(), value);
}

fn success(text: &str) {
    println!("{} {}", "✔".green(), text);
}

fn error(text: &str) {
    println!("{} {}", "✖".red(), text);
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn show(response: &Response) {
    subheader("Result");
    info("URL", &response.url);
    info("Cost", &format!("${:.6}", response.cost));

    match response.product() {
        Ok(product) if product.is_product_page => {
            if let Some(meta) = product.product_metadata {
                info("Name", &meta.product_name);
                if let Some(price) = meta.base_price {
                    let symbol = meta.currency_symbol.unwrap_or_default();
                    info("Price", &format!("{}{:.2}", symbol, price));
                }
                if let Some(brand) = meta.brand_name {
                    info("Brand", &brand);
                }
            }
        }
        Ok(_) => info("Product page", "no"),
        Err(e) => error(&format!("Schema has an unexpected shape: {}", e)),
    }

    subheader("Raw schema");
    let formatted = serde_json::to_string_pretty(&response.product_schema).unwrap_or_default();
    println!("{}", formatted.dimmed());
}

fn report(result: Result<Response, Error>) {
    match result {
        Ok(response) => {
            success("Transform complete");
            show(&response);
        }
        Err(Error::Fetch { url, source }) => error(&format!("Could not fetch {}: {}", url, source)),
        Err(Error::SchemaParse { message, raw }) => {
            error(&format!("Model output was not a schema: {}", message));
            println!("{}", raw.dimmed());
        }
        Err(e) => error(&e.to_string()),
    }
}

fn main() -> Result<(), Error> {
    println!();
    println!(
        "{}",
        "  product2schema - Full Demo  ".on_magenta().bold()
    );

    header("Configuration");
    let url = get_url();
    let config = EngineConfig::from_env()?;
    info("Version", SDK_VERSION);
    info("Model", config.model());
    info(
        "Pricing",
        &format!(
            "${}/M in, ${}/M out",
            config.pricing().input_per_million,
            config.pricing().output_per_million
        ),
    );
    info("URL", &url);

    header("Async engine");
    let engine = AsyncEngine::new(config.clone())?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Config(format!("failed to start runtime: {}", e)))?;
    let pb = spinner("Fetching page and extracting schema...");
    let result = runtime.block_on(engine.transform_url(&url));
    pb.finish_and_clear();
    report(result);
    drop(runtime);

    header("Blocking engine");
    let engine = BlockingEngine::new(config)?;
    let pb = spinner("Fetching page and extracting schema...");
    let result = engine.transform_url(&url);
    pb.finish_and_clear();
    report(result);

    println!();
    Ok(())
}
