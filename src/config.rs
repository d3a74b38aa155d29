//! Engine configuration.

use crate::error::{Error, Result};
use crate::types::ModelPricing;
use crate::version::build_user_agent;
use std::time::Duration;
use tracing::warn;

const DEFAULT_ZYTE_BASE_URL: &str = "https://api.zyte.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 1500;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the Zyte API key.
pub const ZYTE_KEY_ENV: &str = "ZYTE_KEY";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Validated, immutable configuration for an engine.
///
/// Both credentials are required. Everything else has a default.
#[derive(Clone)]
pub struct EngineConfig {
    pub(crate) zyte_key: String,
    pub(crate) openai_key: String,
    pub(crate) zyte_base_url: String,
    pub(crate) openai_base_url: String,
    pub(crate) model: String,
    pub(crate) max_tokens: u32,
    pub(crate) fetch_timeout: Duration,
    pub(crate) extract_timeout: Duration,
    pub(crate) pricing: ModelPricing,
    pub(crate) fetch_cost_per_request: f64,
    pub(crate) user_agent: String,
}

impl EngineConfig {
    /// Create a new config builder.
    pub fn builder(zyte_key: impl Into<String>, openai_key: impl Into<String>) -> EngineConfigBuilder {
        EngineConfigBuilder::new(zyte_key, openai_key)
    }

    /// Build a default config from `ZYTE_KEY` and `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name).map_err(|_| Error::Config(format!("{} is not set", name)))
        };
        Self::builder(read(ZYTE_KEY_ENV)?, read(OPENAI_KEY_ENV)?).build()
    }

    /// Model used for extraction.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Pricing applied to the model's token usage.
    pub fn pricing(&self) -> ModelPricing {
        self.pricing
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("zyte_key", &"<redacted>")
            .field("openai_key", &"<redacted>")
            .field("zyte_base_url", &self.zyte_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("extract_timeout", &self.extract_timeout)
            .field("pricing", &self.pricing)
            .field("fetch_cost_per_request", &self.fetch_cost_per_request)
            .finish()
    }
}

/// Builder for constructing an [`EngineConfig`].
pub struct EngineConfigBuilder {
    zyte_key: String,
    openai_key: String,
    zyte_base_url: String,
    openai_base_url: String,
    model: String,
    max_tokens: u32,
    fetch_timeout: Duration,
    extract_timeout: Duration,
    pricing: ModelPricing,
    fetch_cost_per_request: f64,
    user_agent_suffix: Option<String>,
}

impl EngineConfigBuilder {
    /// Create a new builder with the scraping and language-model keys.
    pub fn new(zyte_key: impl Into<String>, openai_key: impl Into<String>) -> Self {
        Self {
            zyte_key: zyte_key.into(),
            openai_key: openai_key.into(),
            zyte_base_url: DEFAULT_ZYTE_BASE_URL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            extract_timeout: Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS),
            pricing: ModelPricing::default(),
            fetch_cost_per_request: 0.0,
            user_agent_suffix: None,
        }
    }

    /// Set the Zyte API base URL.
    pub fn zyte_base_url(mut self, url: impl Into<String>) -> Self {
        self.zyte_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the OpenAI API base URL.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the chat model used for extraction.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the completion token limit.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the timeout for the scraping call.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the timeout for the language-model call.
    pub fn extract_timeout(mut self, timeout: Duration) -> Self {
        self.extract_timeout = timeout;
        self
    }

    /// Set the token pricing for the configured model.
    pub fn pricing(mut self, pricing: ModelPricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Set the flat USD cost charged per successful fetch.
    pub fn fetch_cost_per_request(mut self, cost: f64) -> Self {
        self.fetch_cost_per_request = cost;
        self
    }

    /// Set a custom User-Agent suffix.
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Validate and build the config.
    pub fn build(self) -> Result<EngineConfig> {
        if self.zyte_key.trim().is_empty() {
            return Err(Error::Config("Zyte API key is required".into()));
        }
        if self.openai_key.trim().is_empty() {
            return Err(Error::Config("OpenAI API key is required".into()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model name must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be greater than zero".into()));
        }

        let prices = [
            ("fetch_cost_per_request", self.fetch_cost_per_request),
            ("pricing.input_per_million", self.pricing.input_per_million),
            ("pricing.output_per_million", self.pricing.output_per_million),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        for base_url in [&self.zyte_base_url, &self.openai_base_url] {
            if !base_url.starts_with("https://") {
                warn!(
                    base_url = %base_url,
                    "API base URL is not using HTTPS. This is insecure."
                );
            }
        }

        Ok(EngineConfig {
            zyte_key: self.zyte_key,
            openai_key: self.openai_key,
            zyte_base_url: self.zyte_base_url,
            openai_base_url: self.openai_base_url,
            model: self.model,
            max_tokens: self.max_tokens,
            fetch_timeout: self.fetch_timeout,
            extract_timeout: self.extract_timeout,
            pricing: self.pricing,
            fetch_cost_per_request: self.fetch_cost_per_request,
            user_agent: build_user_agent(self.user_agent_suffix.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::builder("zk", "ok").build().unwrap();
        assert_eq!(config.zyte_base_url, "https://api.zyte.com");
        assert_eq!(config.openai_base_url, "https://api.openai.com");
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.max_tokens, 1500);
        assert_eq!(config.fetch_timeout, Duration::from_secs(60));
        assert_eq!(config.extract_timeout, Duration::from_secs(120));
        assert_eq!(config.pricing(), ModelPricing::GPT_4O);
        assert_eq!(config.fetch_cost_per_request, 0.0);
    }

    #[test]
    fn test_missing_keys_rejected() {
        let err = EngineConfig::builder("", "ok").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("Zyte")));

        let err = EngineConfig::builder("zk", "   ").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("OpenAI")));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(EngineConfig::builder("zk", "ok")
            .max_tokens(0)
            .build()
            .is_err());
        assert!(EngineConfig::builder("zk", "ok")
            .fetch_cost_per_request(-0.01)
            .build()
            .is_err());
        assert!(EngineConfig::builder("zk", "ok")
            .pricing(ModelPricing {
                input_per_million: f64::NAN,
                output_per_million: 1.0,
            })
            .build()
            .is_err());
    }

    #[test]
    fn test_base_urls_trimmed() {
        let config = EngineConfig::builder("zk", "ok")
            .zyte_base_url("http://localhost:9000/")
            .openai_base_url("http://localhost:9001//")
            .build()
            .unwrap();
        assert_eq!(config.zyte_base_url, "http://localhost:9000");
        assert_eq!(config.openai_base_url, "http://localhost:9001");
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = EngineConfig::builder("zyte-secret", "sk-secret")
            .build()
            .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("zyte-secret"));
        assert!(!printed.contains("sk-secret"));
    }
}
