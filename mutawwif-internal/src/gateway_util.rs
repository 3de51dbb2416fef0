//! Shared state and utilities for the gateway.

use std::sync::Arc;

use axum::extract::{rejection::JsonRejection, FromRequest, Json, Request};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::auth::ProAuth;
use crate::completion::{CompletionProvider, OpenAIProvider};
use crate::config::Config;
use crate::error::{Error, ErrorDetails};
use crate::prompt::PromptComposer;
use crate::rate_limit::DailyUsageLimiter;
use crate::subscriber::{InMemorySubscriberStore, RedisSubscriberStore, SubscriberStore};

/// State for the API
#[derive(Clone)]
pub struct AppStateData {
    pub config: Arc<Config>,
    pub completion: Arc<dyn CompletionProvider>,
    pub subscribers: Arc<dyn SubscriberStore>,
    pub usage_limiter: Arc<DailyUsageLimiter>,
    pub prompts: Arc<PromptComposer>,
    pub auth: ProAuth,
}
pub type AppState = axum::extract::State<AppStateData>;

impl AppStateData {
    pub async fn new(config: Arc<Config>) -> Result<Self, Error> {
        let http_client = setup_http_client()?;
        let subscribers = setup_subscriber_store(&config).await?;
        let completion: Arc<dyn CompletionProvider> = Arc::new(OpenAIProvider::new(
            config.openai_api_base.clone(),
            config.openai_api_key.clone(),
            http_client,
        ));
        let usage_limiter = Arc::new(DailyUsageLimiter::new(config.basic_daily_limit));
        let prompts = Arc::new(PromptComposer::new()?);
        let auth = ProAuth::new(&config.jwt_secret, Arc::clone(&subscribers));

        Ok(Self {
            config,
            completion,
            subscribers,
            usage_limiter,
            prompts,
            auth,
        })
    }
}

async fn setup_subscriber_store(config: &Config) -> Result<Arc<dyn SubscriberStore>, Error> {
    match &config.database_url {
        Some(url) => {
            let store = RedisSubscriberStore::new(url).await?;
            tracing::info!("Subscriber store: redis");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!(
                "MUTAWWIF_DATABASE_URL is not set; using an in-memory subscriber store. \
                 Pro grants will be lost on restart."
            );
            Ok(Arc::new(InMemorySubscriberStore::new()))
        }
    }
}

// This is set high enough that it should never be hit for a normal completion
// call. The gateway defines no per-request deadline of its own.
pub const DEFAULT_HTTP_CLIENT_TIMEOUT: std::time::Duration =
    std::time::Duration::from_secs(20 * 60);

pub fn setup_http_client() -> Result<Client, Error> {
    Client::builder()
        .timeout(DEFAULT_HTTP_CLIENT_TIMEOUT)
        .build()
        .map_err(|e| {
            Error::new(ErrorDetails::AppState {
                message: format!("Failed to build HTTP client: {e}"),
            })
        })
}

/// A `Json` extractor that reports the path to the offending field on
/// deserialization failures.
#[derive(Debug)]
pub struct StructuredJson<T>(pub T);

impl<S, T> FromRequest<S> for StructuredJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: Send + Sync + DeserializeOwned,
{
    type Rejection = Error;

    #[instrument(skip_all, level = "trace", name = "StructuredJson::from_request")]
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Retrieve the request body as Bytes before deserializing it
        let bytes = bytes::Bytes::from_request(req, state).await.map_err(|e| {
            Error::new(ErrorDetails::JsonRequest {
                message: format!("{} ({})", e, e.status()),
            })
        })?;

        // Convert the entire body into `serde_json::Value`
        let value = Json::<serde_json::Value>::from_bytes(&bytes)
            .map_err(|e| {
                Error::new(ErrorDetails::JsonRequest {
                    message: format!("{} ({})", e, e.status()),
                })
            })?
            .0;

        // Now use `serde_path_to_error::deserialize` to attempt deserialization into `T`
        let deserialized: T = serde_path_to_error::deserialize(&value).map_err(|e| {
            Error::new(ErrorDetails::JsonRequest {
                message: e.to_string(),
            })
        })?;

        Ok(StructuredJson(deserialized))
    }
}
