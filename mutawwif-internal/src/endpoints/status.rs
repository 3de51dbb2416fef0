//! Health check and language listing.

use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::languages::{all_languages, language_count};

pub const SERVICE_NAME: &str = "ElysianGo Mutawwif API";

/// GET `/`
pub async fn status_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "languages": language_count(),
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// GET `/api/languages`
pub async fn list_languages_handler() -> Json<Value> {
    Json(json!({ "languages": all_languages() }))
}
