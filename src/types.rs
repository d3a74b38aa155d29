//! Data types shared by the pipeline stages.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// Outcome of a successful `transform_url` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// URL that was transformed.
    pub url: String,
    /// Product schema extracted from the page.
    pub product_schema: Map<String, Value>,
    /// Combined fetch and extraction cost in USD.
    pub cost: f64,
}

impl Response {
    /// Typed view of [`Response::product_schema`].
    pub fn product(&self) -> serde_json::Result<ProductSchema> {
        serde_json::from_value(Value::Object(self.product_schema.clone()))
    }
}

/// Page content returned by a [`crate::Fetcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    /// Readable page content handed to the extractor.
    pub content: String,
    /// Cost of the fetch in USD.
    pub cost: f64,
}

/// Schema returned by a [`crate::SchemaExtractor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    /// Parsed schema object.
    pub schema: Map<String, Value>,
    /// Cost of the extraction in USD.
    pub cost: f64,
    /// Token usage, when the provider reported it.
    pub usage: Option<TokenUsage>,
}

/// Token usage reported by the language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    pub completion_tokens: u64,
}

/// Per-token pricing for a model, in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Price per million prompt tokens.
    pub input_per_million: f64,
    /// Price per million completion tokens.
    pub output_per_million: f64,
}

impl ModelPricing {
    /// gpt-4o list pricing.
    pub const GPT_4O: ModelPricing = ModelPricing {
        input_per_million: 5.0,
        output_per_million: 15.0,
    };

    /// Monetary cost of the given usage.
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 * self.input_per_million
            + usage.completion_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self::GPT_4O
    }
}

/// Top-level shape the model is asked to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSchema {
    /// Whether the page is a product page at all.
    pub is_product_page: bool,
    /// Product details, absent for non-product pages.
    #[serde(default)]
    pub product_metadata: Option<Product>,
}

/// Product attributes extracted from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier for the product.
    #[serde(default)]
    pub product_id: Option<String>,
    /// Name of the product.
    pub product_name: String,
    /// Currency symbol of the prices.
    #[serde(default)]
    pub currency_symbol: Option<String>,
    /// Regular price.
    #[serde(default)]
    pub base_price: Option<f64>,
    /// Price for buying the product instantly.
    #[serde(default)]
    pub buy_now_price: Option<f64>,
    /// Full product description.
    #[serde(default)]
    pub full_description: Option<String>,
    /// User rating.
    #[serde(default)]
    pub product_rating: Option<f64>,
    /// Number of users who left reviews.
    #[serde(default)]
    pub product_review_count: Option<u64>,
    /// Brand name.
    #[serde(default)]
    pub brand_name: Option<String>,
    /// Units in stock.
    #[serde(default)]
    pub available_stock: Option<i64>,
    /// Categories the product belongs to.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    /// Available variations of the product.
    #[serde(default)]
    pub variants: Option<Vec<String>>,
    /// ISO 8601 date-time the product was added to the catalog.
    ///
    /// Kept as the model wrote it, but rejected unless it parses as an
    /// RFC 3339 date-time, a date-time without offset, or a plain date.
    #[serde(default, deserialize_with = "iso_date_time")]
    pub date_added: Option<String>,
}

fn iso_date_time<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    if let Some(s) = &raw {
        let valid = DateTime::parse_from_rfc3339(s).is_ok()
            || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok();
        if !valid {
            return Err(de::Error::custom(format!(
                "date_added is not an ISO 8601 date-time: {:?}",
                s
            )));
        }
    }
    Ok(raw)
}

/// JSON schema of [`ProductSchema`], embedded in the extraction prompt.
pub fn product_json_schema() -> Value {
    fn nullable(kind: &str, description: &str) -> Value {
        json!({
            "anyOf": [{"type": kind}, {"type": "null"}],
            "default": null,
            "description": description,
        })
    }

    fn nullable_list(description: &str) -> Value {
        json!({
            "anyOf": [{"type": "array", "items": {"type": "string"}}, {"type": "null"}],
            "default": null,
            "description": description,
        })
    }

    json!({
        "$defs": {
            "Product": {
                "type": "object",
                "title": "Product",
                "required": ["product_name"],
                "properties": {
                    "product_id": nullable("string", "A unique identifier for the product"),
                    "product_name": {"type": "string", "description": "The name of the product"},
                    "currency_symbol": nullable("string", "Currency Symbol of the price"),
                    "base_price": nullable("number", "The regular price of the product"),
                    "buy_now_price": nullable("number", "The price for buying the product instantly"),
                    "full_description": nullable("string", "Full description of the product"),
                    "product_rating": nullable("number", "Rating of the product given by users"),
                    "product_review_count": nullable("integer", "Number of users who have left reviews"),
                    "brand_name": nullable("string", "Name of the brand"),
                    "available_stock": nullable("integer", "The number of items in stock as INT"),
                    "categories": nullable_list("The category to which the product belongs"),
                    "variants": nullable_list("Different variations of the product if available"),
                    "date_added": {
                        "anyOf": [{"type": "string", "format": "date-time"}, {"type": "null"}],
                        "default": null,
                        "description": "The date and time the product was added to the catalog",
                    },
                },
            },
        },
        "type": "object",
        "title": "ProductSchema",
        "required": ["is_product_page"],
        "properties": {
            "is_product_page": {"type": "boolean"},
            "product_metadata": {
                "anyOf": [{"$ref": "#/$defs/Product"}, {"type": "null"}],
                "default": null,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_cost() {
        let usage = TokenUsage {
            prompt_tokens: 1_000,
            completion_tokens: 200,
        };
        let cost = ModelPricing::GPT_4O.cost(&usage);
        assert!((cost - 0.008).abs() < 1e-12);
        assert_eq!(ModelPricing::default().cost(&TokenUsage::default()), 0.0);
    }

    #[test]
    fn test_response_typed_view() {
        let schema = json!({
            "is_product_page": true,
            "product_metadata": {
                "product_name": "Tormore 1992",
                "currency_symbol": "£",
                "base_price": 349.0,
                "categories": ["whisky"],
            }
        });
        let response = Response {
            url: "https://example.com/p".into(),
            product_schema: schema.as_object().cloned().unwrap(),
            cost: 0.0,
        };

        let product = response.product().unwrap();
        assert!(product.is_product_page);
        let meta = product.product_metadata.unwrap();
        assert_eq!(meta.product_name, "Tormore 1992");
        assert_eq!(meta.base_price, Some(349.0));
        assert_eq!(meta.brand_name, None);
    }

    #[test]
    fn test_non_product_page() {
        let product: ProductSchema =
            serde_json::from_value(json!({"is_product_page": false})).unwrap();
        assert!(!product.is_product_page);
        assert!(product.product_metadata.is_none());
    }

    #[test]
    fn test_date_added_must_be_a_date() {
        let parse = |date: Value| {
            serde_json::from_value::<Product>(json!({
                "product_name": "Widget",
                "date_added": date,
            }))
        };

        for ok in [
            json!("2024-03-01T10:15:00Z"),
            json!("2024-03-01T10:15:00.250+01:00"),
            json!("2024-03-01T10:15:00"),
            json!("2024-03-01"),
            json!(null),
        ] {
            let product = parse(ok.clone()).unwrap();
            assert_eq!(product.date_added.as_deref(), ok.as_str());
        }

        for bad in ["sometime last week", "03/01/2024", ""] {
            assert!(parse(json!(bad)).is_err(), "{bad:?} should be rejected");
        }

        let product: Product = serde_json::from_value(json!({"product_name": "Widget"})).unwrap();
        assert_eq!(product.date_added, None);
    }

    #[test]
    fn test_json_schema_lists_required_fields() {
        let schema = product_json_schema();
        assert_eq!(schema["required"], json!(["is_product_page"]));
        assert_eq!(
            schema["$defs"]["Product"]["required"],
            json!(["product_name"])
        );
        assert!(schema
            .pointer("/$defs/Product/properties/date_added")
            .is_some());
    }
}
