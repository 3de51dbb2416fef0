use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug, PartialEq)]
// As long as the struct member is private, we force people to use the `new` method and log the error.
// We box `ErrorDetails` per the `clippy::result_large_err` lint
pub struct Error(Box<ErrorDetails>);

impl Error {
    pub fn new(details: ErrorDetails) -> Self {
        details.log();
        Error(Box::new(details))
    }

    pub fn new_without_logging(details: ErrorDetails) -> Self {
        Error(Box::new(details))
    }

    pub fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    pub fn get_details(&self) -> &ErrorDetails {
        &self.0
    }

    pub fn get_owned_details(self) -> ErrorDetails {
        *self.0
    }

    pub fn log(&self) {
        self.0.log();
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<ErrorDetails> for Error {
    fn from(details: ErrorDetails) -> Self {
        Error::new(details)
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorDetails {
    AdminKeyInvalid,
    AppState {
        message: String,
    },
    AuthInvalid {
        message: String,
    },
    AuthMissing,
    /// Generic failure envelope for a chat/translate request. The underlying
    /// cause is logged separately; only `{context} error` reaches the caller.
    CompletionFailed {
        context: String,
    },
    Config {
        message: String,
    },
    EmptyCompletion {
        provider_type: String,
    },
    EntitlementExpired,
    EntitlementInactive,
    GuideNotFound {
        key: String,
    },
    InferenceClient {
        message: String,
        status_code: Option<StatusCode>,
        provider_type: String,
        raw_response: Option<String>,
    },
    InferenceServer {
        message: String,
        provider_type: String,
        raw_response: Option<String>,
    },
    InternalError {
        message: String,
    },
    InvalidRequest {
        message: String,
    },
    JsonRequest {
        message: String,
    },
    PromptTemplate {
        message: String,
    },
    RateLimitExceeded,
    RouteNotFound {
        path: String,
        method: String,
    },
    Serialization {
        message: String,
    },
    SubscriberStore {
        message: String,
    },
    TokenIssue {
        message: String,
    },
}

impl ErrorDetails {
    /// Defines the log level for each error
    fn level(&self) -> tracing::Level {
        match self {
            ErrorDetails::AdminKeyInvalid => tracing::Level::WARN,
            ErrorDetails::AppState { .. } => tracing::Level::ERROR,
            ErrorDetails::AuthInvalid { .. } => tracing::Level::WARN,
            ErrorDetails::AuthMissing => tracing::Level::WARN,
            ErrorDetails::CompletionFailed { .. } => tracing::Level::ERROR,
            ErrorDetails::Config { .. } => tracing::Level::ERROR,
            ErrorDetails::EmptyCompletion { .. } => tracing::Level::ERROR,
            ErrorDetails::EntitlementExpired => tracing::Level::WARN,
            ErrorDetails::EntitlementInactive => tracing::Level::WARN,
            ErrorDetails::GuideNotFound { .. } => tracing::Level::DEBUG,
            ErrorDetails::InferenceClient { .. } => tracing::Level::ERROR,
            ErrorDetails::InferenceServer { .. } => tracing::Level::ERROR,
            ErrorDetails::InternalError { .. } => tracing::Level::ERROR,
            ErrorDetails::InvalidRequest { .. } => tracing::Level::DEBUG,
            ErrorDetails::JsonRequest { .. } => tracing::Level::DEBUG,
            ErrorDetails::PromptTemplate { .. } => tracing::Level::ERROR,
            ErrorDetails::RateLimitExceeded => tracing::Level::WARN,
            ErrorDetails::RouteNotFound { .. } => tracing::Level::DEBUG,
            ErrorDetails::Serialization { .. } => tracing::Level::ERROR,
            ErrorDetails::SubscriberStore { .. } => tracing::Level::ERROR,
            ErrorDetails::TokenIssue { .. } => tracing::Level::ERROR,
        }
    }

    /// Defines the HTTP status code for each error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorDetails::AdminKeyInvalid => StatusCode::FORBIDDEN,
            ErrorDetails::AppState { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::AuthInvalid { .. } => StatusCode::UNAUTHORIZED,
            ErrorDetails::AuthMissing => StatusCode::UNAUTHORIZED,
            ErrorDetails::CompletionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::EmptyCompletion { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::EntitlementExpired => StatusCode::FORBIDDEN,
            ErrorDetails::EntitlementInactive => StatusCode::FORBIDDEN,
            ErrorDetails::GuideNotFound { .. } => StatusCode::NOT_FOUND,
            ErrorDetails::InferenceClient { status_code, .. } => {
                // Upstream failures are always surfaced as a 500-class error to
                // the caller, regardless of the provider's own status.
                let _ = status_code;
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorDetails::InferenceServer { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ErrorDetails::JsonRequest { .. } => StatusCode::BAD_REQUEST,
            ErrorDetails::PromptTemplate { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorDetails::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ErrorDetails::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::SubscriberStore { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorDetails::TokenIssue { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the error using the `tracing` library
    pub fn log(&self) {
        match self.level() {
            tracing::Level::ERROR => tracing::error!("{self}"),
            tracing::Level::WARN => tracing::warn!("{self}"),
            tracing::Level::INFO => tracing::info!("{self}"),
            tracing::Level::DEBUG => tracing::debug!("{self}"),
            tracing::Level::TRACE => tracing::trace!("{self}"),
        }
    }

    /// The message placed in the JSON error envelope returned to the caller.
    ///
    /// Upstream provider details (raw responses, status codes) are logged via
    /// `Display` but never exposed here.
    pub fn client_message(&self) -> String {
        match self {
            ErrorDetails::AdminKeyInvalid => "Invalid admin key".to_string(),
            ErrorDetails::AuthInvalid { .. } => "Invalid or expired token".to_string(),
            ErrorDetails::AuthMissing => "Missing Pro token".to_string(),
            ErrorDetails::CompletionFailed { context } => format!("{context} error"),
            ErrorDetails::EntitlementExpired => "Pro subscription expired".to_string(),
            ErrorDetails::EntitlementInactive => "Pro subscription inactive".to_string(),
            ErrorDetails::GuideNotFound { .. } => "Ritual guide not found".to_string(),
            ErrorDetails::InvalidRequest { message } => message.clone(),
            ErrorDetails::JsonRequest { message } => message.clone(),
            ErrorDetails::RateLimitExceeded => {
                "Free daily limit reached. Upgrade to Mutawwif Pro.".to_string()
            }
            ErrorDetails::RouteNotFound { .. } => "Route not found".to_string(),
            ErrorDetails::TokenIssue { .. } => "Failed to issue Pro token".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorDetails::AdminKeyInvalid => {
                write!(f, "Invalid admin key")
            }
            ErrorDetails::AppState { message } => {
                write!(f, "Error initializing AppState: {message}")
            }
            ErrorDetails::AuthInvalid { message } => {
                write!(f, "Invalid Pro token: {message}")
            }
            ErrorDetails::AuthMissing => {
                write!(f, "Missing Pro token")
            }
            ErrorDetails::CompletionFailed { context } => {
                write!(f, "{context} error")
            }
            ErrorDetails::Config { message } => {
                write!(f, "{message}")
            }
            ErrorDetails::EmptyCompletion { provider_type } => {
                write!(f, "Empty completion from {provider_type} server")
            }
            ErrorDetails::EntitlementExpired => {
                write!(f, "Pro subscription expired")
            }
            ErrorDetails::EntitlementInactive => {
                write!(f, "Pro subscription inactive")
            }
            ErrorDetails::GuideNotFound { key } => {
                write!(f, "Ritual guide not found: {key}")
            }
            ErrorDetails::InferenceClient {
                message,
                status_code,
                provider_type,
                raw_response,
            } => {
                write!(
                    f,
                    "Error{} from {} client: {}{}",
                    status_code.map_or(String::new(), |s| format!(" {s}")),
                    provider_type,
                    message,
                    raw_response
                        .as_ref()
                        .map_or(String::new(), |r| format!("\nRaw response: {r}"))
                )
            }
            ErrorDetails::InferenceServer {
                message,
                provider_type,
                raw_response,
            } => {
                write!(
                    f,
                    "Error from {} server: {}{}",
                    provider_type,
                    message,
                    raw_response
                        .as_ref()
                        .map_or(String::new(), |r| format!("\nRaw response: {r}"))
                )
            }
            ErrorDetails::InternalError { message } => {
                write!(f, "Internal error: {message}")
            }
            ErrorDetails::InvalidRequest { message } => {
                write!(f, "{message}")
            }
            ErrorDetails::JsonRequest { message } => {
                write!(f, "{message}")
            }
            ErrorDetails::PromptTemplate { message } => {
                write!(f, "Error rendering prompt template: {message}")
            }
            ErrorDetails::RateLimitExceeded => {
                write!(f, "Free daily limit reached")
            }
            ErrorDetails::RouteNotFound { path, method } => {
                write!(f, "Route not found: {method} {path}")
            }
            ErrorDetails::Serialization { message } => {
                write!(f, "{message}")
            }
            ErrorDetails::SubscriberStore { message } => {
                write!(f, "Subscriber store error: {message}")
            }
            ErrorDetails::TokenIssue { message } => {
                write!(f, "Failed to issue Pro token: {message}")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = json!({"error": self.get_details().client_message()});
        (self.status_code(), Json(body)).into_response()
    }
}
