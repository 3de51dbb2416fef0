//! Basic and Pro chat endpoints.

use axum::extract::{Extension, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::completion::CompletionParams;
use crate::config::TierGenerationConfig;
use crate::error::{Error, ErrorDetails};
use crate::gateway_util::{AppState, AppStateData, StructuredJson};
use crate::languages::language_name;
use crate::prompt::{ChatMessage, ChatTier};
use crate::subscriber::SubscriberRecord;

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    pub message: Option<String>,
    pub language: Option<String>,
    /// Conversation history as sent by the client. Entries that don't look
    /// like `{role, content}` objects cause the whole history to be dropped.
    pub history: Option<Value>,
}

/// POST `/api/mutawwif/basic`
pub async fn basic_chat_handler(
    State(state): AppState,
    StructuredJson(params): StructuredJson<ChatParams>,
) -> Result<Json<Value>, Error> {
    run_chat(&state, params, ChatTier::Basic, None).await
}

/// POST `/api/mutawwif/pro`
///
/// The subscriber record is placed in request extensions by the
/// `require_pro_subscriber` middleware.
pub async fn pro_chat_handler(
    State(state): AppState,
    Extension(subscriber): Extension<SubscriberRecord>,
    StructuredJson(params): StructuredJson<ChatParams>,
) -> Result<Json<Value>, Error> {
    run_chat(&state, params, ChatTier::Pro, Some(subscriber)).await
}

async fn run_chat(
    state: &AppStateData,
    params: ChatParams,
    tier: ChatTier,
    subscriber: Option<SubscriberRecord>,
) -> Result<Json<Value>, Error> {
    let message = params
        .message
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            Error::new(ErrorDetails::InvalidRequest {
                message: "Message is required".to_string(),
            })
        })?;

    let language_name = language_name(params.language.as_deref().unwrap_or("en"));
    let history = parse_history(params.history);
    let (tier_config, context): (&TierGenerationConfig, &str) = match tier {
        ChatTier::Basic => (&state.config.tiers.basic, "Basic mode"),
        ChatTier::Pro => (&state.config.tiers.pro, "Pro mode"),
    };

    let messages = state
        .prompts
        .compose_chat(
            tier,
            language_name,
            &history,
            message,
            subscriber.as_ref().map(|s| s.email.as_str()),
            tier_config.history_window,
        )
        .map_err(|e| completion_failed(e, context))?;

    let reply = state
        .completion
        .complete(&messages, &CompletionParams::from(tier_config))
        .await
        .map_err(|e| completion_failed(e, context))?;

    Ok(Json(json!({
        "reply": reply,
        "language": language_name,
        "mode": tier.mode(),
    })))
}

/// Lenient history parsing: anything that is not an array of `{role, content}`
/// objects is treated as no history at all.
fn parse_history(history: Option<Value>) -> Vec<ChatMessage> {
    history
        .and_then(|value| serde_json::from_value::<Vec<ChatMessage>>(value).ok())
        .unwrap_or_default()
}

/// Collapse an internal failure into the tier's generic error envelope. The
/// underlying cause was already logged when it was constructed.
fn completion_failed(source: Error, context: &str) -> Error {
    let _ = source;
    Error::new_without_logging(ErrorDetails::CompletionFailed {
        context: context.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use chrono::{Duration, Utc};

    use crate::completion::testing::MockCompletionProvider;
    use crate::endpoints::testing::test_state;

    fn pro_subscriber() -> SubscriberRecord {
        let now = Utc::now();
        SubscriberRecord {
            id: "0198b7e4-0000-7000-8000-000000000000".to_string(),
            email: "pilgrim@example.com".to_string(),
            name: Some("Pilgrim".to_string()),
            is_pro: true,
            pro_expires_at: Some(now + Duration::days(30)),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_basic_chat_happy_path() {
        let provider = Arc::new(MockCompletionProvider::replying("Labbayk Allahumma labbayk."));
        let state = test_state(provider.clone());
        let params = ChatParams {
            message: Some("When do I enter ihram?".to_string()),
            language: Some("ms".to_string()),
            history: None,
        };

        let Json(body) = run_chat(&state, params, ChatTier::Basic, None)
            .await
            .expect("basic chat should succeed");
        assert_eq!(body["reply"], "Labbayk Allahumma labbayk.");
        assert_eq!(body["language"], "Melayu");
        assert_eq!(body["mode"], "basic");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (messages, params) = &calls[0];
        assert_eq!(params.model, "gpt-4.1-mini");
        assert_eq!(params.max_tokens, 800);
        assert!(messages[0].content.contains("Mode: BASIC."));
    }

    #[tokio::test]
    async fn test_missing_message_is_rejected() {
        let state = test_state(Arc::new(MockCompletionProvider::replying("unused")));
        let params = ChatParams {
            message: None,
            language: None,
            history: None,
        };
        let err = run_chat(&state, params, ChatTier::Basic, None)
            .await
            .expect_err("missing message must be rejected");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.get_details().client_message(),
            "Message is required"
        );
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let state = test_state(Arc::new(MockCompletionProvider::replying("unused")));
        let params = ChatParams {
            message: Some(String::new()),
            language: None,
            history: None,
        };
        let err = run_chat(&state, params, ChatTier::Basic, None)
            .await
            .expect_err("empty message must be rejected");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_language_falls_back_to_english() {
        let provider = Arc::new(MockCompletionProvider::replying("ok"));
        let state = test_state(provider);
        let params = ChatParams {
            message: Some("hello".to_string()),
            language: Some("xx".to_string()),
            history: None,
        };
        let Json(body) = run_chat(&state, params, ChatTier::Basic, None)
            .await
            .expect("should succeed");
        assert_eq!(body["language"], "English");
    }

    #[tokio::test]
    async fn test_malformed_history_is_dropped() {
        let provider = Arc::new(MockCompletionProvider::replying("ok"));
        let state = test_state(provider.clone());
        let params = ChatParams {
            message: Some("hello".to_string()),
            language: None,
            history: Some(json!("not an array")),
        };
        run_chat(&state, params, ChatTier::Basic, None)
            .await
            .expect("malformed history must not fail the request");

        let calls = provider.calls.lock().unwrap();
        let (messages, _) = &calls[0];
        // system + new message only
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_pro_chat_embeds_subscriber_and_uses_pro_tier() {
        let provider = Arc::new(MockCompletionProvider::replying("detailed answer"));
        let state = test_state(provider.clone());
        let params = ChatParams {
            message: Some("Explain tawaf".to_string()),
            language: Some("id".to_string()),
            history: None,
        };

        let Json(body) = run_chat(&state, params, ChatTier::Pro, Some(pro_subscriber()))
            .await
            .expect("pro chat should succeed");
        assert_eq!(body["mode"], "pro");
        assert_eq!(body["language"], "Indonesia");

        let calls = provider.calls.lock().unwrap();
        let (messages, params) = &calls[0];
        assert_eq!(params.model, "gpt-4.1");
        assert_eq!(params.max_tokens, 2000);
        assert!(messages[1].content.contains("pilgrim@example.com"));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_tier_envelope() {
        let state = test_state(Arc::new(MockCompletionProvider::failing()));
        let params = ChatParams {
            message: Some("hello".to_string()),
            language: None,
            history: None,
        };
        let err = run_chat(&state, params, ChatTier::Pro, Some(pro_subscriber()))
            .await
            .expect_err("provider failure must surface");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.get_details().client_message(), "Pro mode error");
    }

    #[test]
    fn test_history_window_parsing() {
        let raw = json!([
            {"role": "user", "content": "q1"},
            {"role": "assistant", "content": "a1"}
        ]);
        let parsed = parse_history(Some(raw));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].role, "user");

        assert!(parse_history(None).is_empty());
        assert!(parse_history(Some(json!({"role": "user"}))).is_empty());
    }
}
