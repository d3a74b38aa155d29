//! Schema extraction through the OpenAI chat completions API.

use crate::config::EngineConfig;
use crate::error::{Error, ProviderError, Result};
use crate::types::{product_json_schema, ExtractionResult, ModelPricing, ProductSchema, TokenUsage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Turns page content into a product schema.
#[async_trait]
pub trait SchemaExtractor: Send + Sync {
    /// Extract a schema from `content` and report the cost of doing so.
    async fn extract(&self, content: &str) -> Result<ExtractionResult>;
}

const PARSER_INSTRUCTION: &str = "You are a webpage parser. User will provide you with the text of a webpage. \
You should determine if it's a product page, and if it is fill the data in the given format. \
If it's not a product page, then product details are not required. \
Reply in valid JSON.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    response_format: Value,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// [`SchemaExtractor`] backed by an OpenAI chat model.
pub struct OpenAiExtractor {
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    pricing: ModelPricing,
    schema_prompt: String,
    http_client: reqwest::Client,
}

impl OpenAiExtractor {
    /// Create an extractor from an engine config.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid User-Agent: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(config.extract_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let schema = serde_json::to_string_pretty(&product_json_schema())
            .map_err(|e| Error::Config(format!("failed to render product schema: {}", e)))?;

        Ok(Self {
            api_key: config.openai_key.clone(),
            endpoint: format!("{}/v1/chat/completions", config.openai_base_url),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            pricing: config.pricing,
            schema_prompt: format!("Below is the OpenAPI JSON schema:\n{}", schema),
            http_client,
        })
    }

    async fn complete(&self, content: &str) -> std::result::Result<ChatCompletion, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: PARSER_INSTRUCTION,
                },
                ChatMessage {
                    role: "system",
                    content: &self.schema_prompt,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
            max_tokens: self.max_tokens,
            response_format: json!({"type": "json_object"}),
        };

        debug!(
            model = %self.model,
            content_bytes = content.len(),
            "Requesting schema extraction"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::from_response(response).await);
        }

        let body: Value = response.json().await?;
        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl SchemaExtractor for OpenAiExtractor {
    async fn extract(&self, content: &str) -> Result<ExtractionResult> {
        if content.trim().is_empty() {
            return Err(Error::Extraction(ProviderError::InvalidRequest(
                "page content is empty".into(),
            )));
        }

        let completion = self.complete(content).await.map_err(Error::Extraction)?;

        let cost = match &completion.usage {
            Some(usage) => self.pricing.cost(usage),
            None => {
                warn!(model = %self.model, "Completion did not report token usage");
                0.0
            }
        };

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            Error::Extraction(ProviderError::MalformedResponse(
                "completion has no choices".into(),
            ))
        })?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!(
                max_tokens = self.max_tokens,
                "Completion hit the token limit; output is likely truncated"
            );
        }

        let text = choice.message.content.unwrap_or_default();
        let schema = parse_schema(&text)?;

        Ok(ExtractionResult {
            schema,
            cost,
            usage: completion.usage,
        })
    }
}

/// Parse model output into a validated product schema object.
pub(crate) fn parse_schema(text: &str) -> Result<Map<String, Value>> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(Error::schema_parse("model returned no content", text));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::schema_parse(format!("invalid JSON: {}", e), text))?;

    let Value::Object(map) = value else {
        return Err(Error::schema_parse("expected a JSON object", text));
    };

    serde_json::from_value::<ProductSchema>(Value::Object(map.clone())).map_err(|e| {
        Error::schema_parse(format!("does not match the product schema: {}", e), text)
    })?;

    Ok(map)
}

/// Models sometimes wrap JSON in a Markdown fence despite json mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Language tag, if any, runs up to the first non-alphanumeric char.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.trim().trim_end_matches("```").trim()
}
