//! Text generation client for the external completion service.
//!
//! The gateway is a direct pass-through: one non-streaming chat-completion
//! call per request, no retries. A failed or empty upstream response is
//! terminal for the request.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::TierGenerationConfig;
use crate::error::{Error, ErrorDetails};
use crate::prompt::ChatMessage;

const PROVIDER_TYPE: &str = "openai";

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&TierGenerationConfig> for CompletionParams {
    fn from(tier: &TierGenerationConfig) -> Self {
        Self {
            model: tier.model.clone(),
            max_tokens: tier.max_tokens,
            temperature: tier.temperature,
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion call and return the generated text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, Error>;
}

pub struct OpenAIProvider {
    api_base: Url,
    credentials: SecretString,
    http_client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(
        api_base: Url,
        credentials: SecretString,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            api_base,
            credentials,
            http_client,
        }
    }
}

/// Build the chat-completions URL, tolerating an `api_base` without a
/// trailing slash.
fn get_chat_url(api_base: &Url) -> Result<Url, Error> {
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join("chat/completions").map_err(|e| {
        Error::new(ErrorDetails::Config {
            message: format!("Failed to build completion URL from `{api_base}`: {e}"),
        })
    })
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String, Error> {
        let request_body = OpenAIChatRequest {
            model: &params.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        let request_url = get_chat_url(&self.api_base)?;

        let res = self
            .http_client
            .post(request_url)
            .header("Content-Type", "application/json")
            .bearer_auth(self.credentials.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                Error::new(ErrorDetails::InferenceClient {
                    message: format!("Error sending request: {e}"),
                    status_code: e.status(),
                    provider_type: PROVIDER_TYPE.to_string(),
                    raw_response: None,
                })
            })?;

        let status = res.status();
        let raw_response = res.text().await.map_err(|e| {
            Error::new(ErrorDetails::InferenceServer {
                message: format!("Error reading response body: {e}"),
                provider_type: PROVIDER_TYPE.to_string(),
                raw_response: None,
            })
        })?;

        if !status.is_success() {
            return Err(Error::new(ErrorDetails::InferenceClient {
                message: "Non-success status from completion call".to_string(),
                status_code: Some(status),
                provider_type: PROVIDER_TYPE.to_string(),
                raw_response: Some(raw_response),
            }));
        }

        let response_body: OpenAIChatResponse =
            serde_json::from_str(&raw_response).map_err(|e| {
                Error::new(ErrorDetails::InferenceServer {
                    message: format!("Error parsing response: {e}"),
                    provider_type: PROVIDER_TYPE.to_string(),
                    raw_response: Some(raw_response.clone()),
                })
            })?;

        let reply = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());

        reply.ok_or_else(|| {
            Error::new(ErrorDetails::EmptyCompletion {
                provider_type: PROVIDER_TYPE.to_string(),
            })
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_with_and_without_trailing_slash() {
        let base = Url::parse("https://api.openai.com/v1/").expect("valid URL");
        let url = get_chat_url(&base).expect("join should succeed");
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");

        let base = Url::parse("https://api.openai.com/v1").expect("valid URL");
        let url = get_chat_url(&base).expect("join should succeed");
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_params_from_tier_config() {
        let tier = TierGenerationConfig {
            model: "gpt-4.1".to_string(),
            max_tokens: 2000,
            temperature: 0.3,
            history_window: 12,
        };
        let params = CompletionParams::from(&tier);
        assert_eq!(params.model, "gpt-4.1");
        assert_eq!(params.max_tokens, 2000);
        assert_eq!(params.temperature, 0.3);
    }

    #[test]
    fn test_response_parse_extracts_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"  Labbayk.  "}}]}"#;
        let parsed: OpenAIChatResponse = serde_json::from_str(raw).expect("should parse");
        let content = parsed.choices[0]
            .message
            .content
            .as_deref()
            .map(str::trim);
        assert_eq!(content, Some("Labbayk."));
    }

    #[test]
    fn test_request_serialization_shape() {
        let messages = vec![ChatMessage::user("hello")];
        let request = OpenAIChatRequest {
            model: "gpt-4.1-mini",
            messages: &messages,
            max_tokens: 800,
            temperature: 0.3,
        };
        let value = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(value["model"], "gpt-4.1-mini");
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
