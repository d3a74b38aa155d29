use product2schema::{AsyncEngine, BlockingEngine, EngineConfig, Error, ProviderError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_URL: &str = "https://shop.example.com/products/tormore-1992";

const PAGE_HTML: &str = r#"<html>
  <head><title>Tormore 1992</title></head>
  <body>
    <nav>Whisky | Gin | Rum</nav>
    <h1>Tormore 1992 26 Year Old</h1>
    <p>£349.00</p>
    <footer>Old and Rare Whisky Ltd</footer>
  </body>
</html>"#;

fn model_output() -> Value {
    json!({
        "is_product_page": true,
        "product_metadata": {
            "product_name": "Tormore 1992 26 Year Old",
            "currency_symbol": "£",
            "base_price": 349.0,
            "brand_name": "Tormore"
        }
    })
}

async fn mount_providers(server: &MockServer, model_text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/extract"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": PRODUCT_URL,
            "browserHtml": PAGE_HTML
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": model_text},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 2000, "completion_tokens": 100}
        })))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> EngineConfig {
    EngineConfig::builder("zyte-key", "sk-test")
        .zyte_base_url(server.uri())
        .openai_base_url(server.uri())
        .fetch_cost_per_request(0.0016)
        .build()
        .unwrap()
}

#[tokio::test]
async fn transform_url_end_to_end() {
    let server = MockServer::start().await;
    mount_providers(&server, &model_output().to_string()).await;

    let engine = AsyncEngine::new(config_for(&server)).unwrap();
    let response = engine.transform_url(PRODUCT_URL).await.unwrap();

    assert_eq!(response.url, PRODUCT_URL);
    assert_eq!(Value::Object(response.product_schema.clone()), model_output());
    // 2000 * 5 / 1M + 100 * 15 / 1M = 0.0115, plus the flat fetch cost
    assert!((response.cost - (0.0016 + 0.0115)).abs() < 1e-12);

    let product = response.product().unwrap();
    assert_eq!(
        product.product_metadata.unwrap().product_name,
        "Tormore 1992 26 Year Old"
    );

    // The model sees the cleaned page text, not the raw HTML.
    let requests = server.received_requests().await.unwrap();
    let chat = requests
        .iter()
        .find(|r| r.url.path() == "/v1/chat/completions")
        .unwrap();
    let body: Value = serde_json::from_slice(&chat.body).unwrap();
    let user_content = body["messages"][2]["content"].as_str().unwrap();
    assert!(user_content.contains("£349.00"));
    assert!(!user_content.contains("<h1>"));
    assert!(!user_content.contains("Gin"));
}

#[tokio::test]
async fn fetch_failure_never_reaches_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/extract"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let engine = AsyncEngine::new(config_for(&server)).unwrap();
    let err = engine.transform_url(PRODUCT_URL).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Fetch {
            source: ProviderError::Api { status: 500, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn malformed_model_output_is_a_parse_error() {
    let server = MockServer::start().await;
    mount_providers(&server, "The product is a whisky.").await;

    let engine = AsyncEngine::new(config_for(&server)).unwrap();
    let err = engine.transform_url(PRODUCT_URL).await.unwrap_err();

    assert!(matches!(err, Error::SchemaParse { .. }));
}

#[test]
fn blocking_and_async_agree() {
    let server_runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let server = server_runtime.block_on(async {
        let server = MockServer::start().await;
        mount_providers(&server, &model_output().to_string()).await;
        server
    });

    let blocking = BlockingEngine::new(config_for(&server)).unwrap();
    let from_blocking = blocking.transform_url(PRODUCT_URL).unwrap();

    let engine = AsyncEngine::new(config_for(&server)).unwrap();
    let from_async = server_runtime
        .block_on(engine.transform_url(PRODUCT_URL))
        .unwrap();

    assert_eq!(
        serde_json::to_vec(&from_blocking).unwrap(),
        serde_json::to_vec(&from_async).unwrap()
    );

    drop(blocking);
    server_runtime.block_on(async move { drop(server) });
}
