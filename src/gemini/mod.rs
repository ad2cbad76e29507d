//! Recipe generation through the Gemini `generateContent` API

mod prompt;
mod types;

pub use prompt::{build_prompt, BASIC_SEASONINGS, RECIPES_PER_CALL};
pub use types::{response_schema, GenerateContentRequest, GenerateContentResponse};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::GeminiOptions;
use crate::error::Error;
use crate::fetch::Fetch;
use crate::recipe::{validate_recipes, Recipe};
use types::{Content, GenerationConfig, Part};

/// Anything that can turn an ingredient list into validated recipes
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Generate recipes for an already normalized ingredient list.
    ///
    /// The returned recipes have an empty `id`.
    async fn generate(&self, ingredients: &[String]) -> Result<Vec<Recipe>, Error>;
}

/// Client for the Gemini structured output endpoint
pub struct GeminiClient {
    options: GeminiOptions,
    client: Client,
}

impl GeminiClient {
    /// Create a new client; the HTTP client enforces the configured timeout
    pub fn new(options: GeminiOptions) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| Error::misconfigured(format!("failed to build HTTP client: {}", e)))?;

        if options.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            tracing::warn!("GEMINI_API_KEY is not set; recipe generation will be unavailable");
        }

        Ok(Self { options, client })
    }

    fn get_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.options.base_url.trim_end_matches('/'),
            self.options.model
        )
    }

    fn api_key(&self) -> Result<&str, Error> {
        match self.options.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::misconfigured("Gemini API key is not configured")),
        }
    }

    fn request_body(&self, ingredients: &[String]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(ingredients)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.options.temperature,
                max_output_tokens: self.options.max_output_tokens,
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        }
    }
}

#[async_trait]
impl RecipeGenerator for GeminiClient {
    async fn generate(&self, ingredients: &[String]) -> Result<Vec<Recipe>, Error> {
        let api_key = self.api_key()?;
        let url = self.get_url();

        let response = Fetch::post(&self.client, &url)
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(ingredients))?
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request failed");
                e
            })?;

        if response.status == StatusCode::TOO_MANY_REQUESTS {
            tracing::error!(
                retry_after = ?response.retry_after_secs,
                "Gemini rate limit exceeded"
            );
            return Err(Error::RateLimited {
                retry_after_secs: response.retry_after_secs,
            });
        }

        if !response.status.is_success() {
            tracing::error!(
                status = response.status.as_u16(),
                body = %truncate(&response.body, 300),
                "Gemini returned an error status"
            );
            return Err(Error::provider(format!(
                "Gemini returned status {}",
                response.status
            )));
        }

        let payload: GenerateContentResponse = serde_json::from_str(&response.body)
            .map_err(|e| Error::malformed(format!("unreadable Gemini envelope: {}", e)))?;

        let text = payload.text().unwrap_or_default();
        parse_recipes(&text).map_err(|e| {
            tracing::error!(error = %e, text = %truncate(&text, 300), "Invalid Gemini output");
            e
        })
    }
}

/// Slice out the outermost `[ ... ]` of a model reply
pub fn extract_json_array(text: &str) -> Result<&str, Error> {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if end > start => Ok(&text[start..=end]),
        _ => Err(Error::malformed("no JSON array found in model output")),
    }
}

/// Extract, parse and validate the recipes embedded in a model reply
pub fn parse_recipes(text: &str) -> Result<Vec<Recipe>, Error> {
    let json = extract_json_array(text)?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::malformed(format!("model output is not valid JSON: {}", e)))?;

    validate_recipes(&value)
        .map_err(|e| Error::malformed(format!("model output failed validation: {}", e)))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn recipes_json() -> Value {
        let recipe = |name: &str| {
            json!({
                "name": name,
                "description": "Simple and tasty.",
                "prepTime": "20 min",
                "difficulty": "Medium",
                "servings": 2,
                "ingredients": ["2 tomatoes", "1 onion"],
                "steps": ["Chop.", "Cook.", "Serve."],
                "tip": "Use ripe tomatoes."
            })
        };
        json!([recipe("Tomato Soup"), recipe("Salsa"), recipe("Roasted Tomato")])
    }

    fn envelope(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
        let mut options = GeminiOptions::default()
            .with_base_url(&server.uri())
            .with_model("gemini-test");
        options.api_key = api_key.map(str::to_string);
        GeminiClient::new(options).unwrap()
    }

    fn ingredients() -> Vec<String> {
        vec!["tomato".to_string(), "onion".to_string()]
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        let text = format!("Here you go:\n{}\n", recipes_json());

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&text)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let recipes = client.generate(&ingredients()).await.unwrap();

        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0].name, "Tomato Soup");
        assert!(recipes.iter().all(|r| r.id.is_empty()));
    }

    #[tokio::test]
    async fn test_request_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(&recipes_json().to_string())),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        client.generate(&ingredients()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["maxOutputTokens"], 4000);
        assert_eq!(config["responseSchema"]["type"], "ARRAY");
        assert_eq!(
            config["responseSchema"]["items"]["properties"]["difficulty"]["enum"],
            json!(["Easy", "Medium", "Hard"])
        );
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("tomato, onion"));
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("   "));
        let err = client.generate(&ingredients()).await.unwrap_err();

        assert!(matches!(err, Error::Misconfigured(_)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.generate(&ingredients()).await.unwrap_err();

        assert_eq!(
            err,
            Error::RateLimited {
                retry_after_secs: Some(30)
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_provider_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.generate(&ingredients()).await.unwrap_err();

        assert!(matches!(err, Error::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invalid_recipe_is_malformed() {
        let server = MockServer::start().await;
        let mut bad = recipes_json();
        bad[1]["difficulty"] = json!("Impossible");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&bad.to_string())))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.generate(&ingredients()).await.unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("test-key"));
        let err = client.generate(&ingredients()).await.unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_json_array() {
        assert_eq!(extract_json_array("xx [1, 2] yy").unwrap(), "[1, 2]");
        assert_eq!(extract_json_array("[[1], [2]]").unwrap(), "[[1], [2]]");
        assert!(extract_json_array("[ unterminated").is_err());
        assert!(extract_json_array("no array").is_err());
        assert!(extract_json_array("] backwards [").is_err());
    }

    #[test]
    fn test_parse_recipes_rejects_bad_json() {
        let err = parse_recipes("[{\"name\": }]").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
