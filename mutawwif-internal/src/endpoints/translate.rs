//! Translation endpoint.

use axum::extract::State;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::completion::CompletionParams;
use crate::error::{Error, ErrorDetails};
use crate::gateway_util::{AppState, StructuredJson};
use crate::languages::language_name;

#[derive(Debug, Deserialize)]
pub struct TranslateParams {
    pub text: Option<String>,
    #[serde(rename = "targetLanguage")]
    pub target_language: Option<String>,
}

/// POST `/api/mutawwif/translate`
pub async fn translate_handler(
    State(state): AppState,
    StructuredJson(params): StructuredJson<TranslateParams>,
) -> Result<Json<Value>, Error> {
    let text = params
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            Error::new(ErrorDetails::InvalidRequest {
                message: "Text is required".to_string(),
            })
        })?;

    let language_name = language_name(params.target_language.as_deref().unwrap_or("en"));

    let translated = async {
        let messages = state.prompts.compose_translate(language_name, text)?;
        state
            .completion
            .complete(
                &messages,
                &CompletionParams::from(&state.config.tiers.translate),
            )
            .await
    }
    .await
    .map_err(|e| {
        // The cause was logged when the inner error was constructed
        let _ = e;
        Error::new_without_logging(ErrorDetails::CompletionFailed {
            context: "Translate".to_string(),
        })
    })?;

    Ok(Json(json!({
        "translated": translated,
        "language": language_name,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::completion::testing::MockCompletionProvider;
    use crate::endpoints::testing::test_state;

    #[tokio::test]
    async fn test_translate_happy_path() {
        let provider = Arc::new(MockCompletionProvider::replying("Selamat jalan"));
        let state = test_state(provider.clone());
        let params = TranslateParams {
            text: Some("Safe travels".to_string()),
            target_language: Some("ms".to_string()),
        };

        let Json(body) = translate_handler(State(state), StructuredJson(params))
            .await
            .expect("translate should succeed");
        assert_eq!(body["translated"], "Selamat jalan");
        assert_eq!(body["language"], "Melayu");

        let calls = provider.calls.lock().unwrap();
        let (messages, params) = &calls[0];
        assert_eq!(params.temperature, 0.2);
        assert!(messages[0].content.contains("into Melayu."));
        assert_eq!(messages[1].content, "Safe travels");
    }

    #[tokio::test]
    async fn test_missing_text_is_rejected() {
        let state = test_state(Arc::new(MockCompletionProvider::replying("unused")));
        let params = TranslateParams {
            text: None,
            target_language: None,
        };
        let err = translate_handler(State(state), StructuredJson(params))
            .await
            .expect_err("missing text must be rejected");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.get_details().client_message(), "Text is required");
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_translate_envelope() {
        let state = test_state(Arc::new(MockCompletionProvider::failing()));
        let params = TranslateParams {
            text: Some("Safe travels".to_string()),
            target_language: None,
        };
        let err = translate_handler(State(state), StructuredJson(params))
            .await
            .expect_err("provider failure must surface");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.get_details().client_message(), "Translate error");
    }
}
