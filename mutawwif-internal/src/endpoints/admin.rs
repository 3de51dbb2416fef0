//! Admin endpoint for granting Pro access and issuing tokens.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Error, ErrorDetails};
use crate::gateway_util::{AppState, StructuredJson};
use crate::subscriber::grant_pro;

const ADMIN_KEY_HEADER: &str = "x-admin-key";
const DEFAULT_PRO_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct IssueProTokenParams {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "proDays")]
    pub pro_days: Option<i64>,
}

/// POST `/api/admin/issue-pro-token`
///
/// Grants (or extends) a Pro entitlement for the given email and returns a
/// bearer token for it. When no admin key is configured the endpoint is open.
pub async fn issue_pro_token_handler(
    State(state): AppState,
    headers: HeaderMap,
    StructuredJson(params): StructuredJson<IssueProTokenParams>,
) -> Result<Json<Value>, Error> {
    verify_admin_key(state.config.admin_api_key.as_ref(), &headers)?;

    let email = params
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| {
            Error::new(ErrorDetails::InvalidRequest {
                message: "Email is required".to_string(),
            })
        })?;
    let pro_days = params.pro_days.unwrap_or(DEFAULT_PRO_DAYS);

    let now = Utc::now();
    let record = grant_pro(state.subscribers.as_ref(), email, params.name, pro_days, now)
        .await
        .map_err(|e| {
            // The store failure was logged when it was constructed
            let _ = e;
            Error::new_without_logging(ErrorDetails::TokenIssue {
                message: "subscriber store update failed".to_string(),
            })
        })?;
    let token = state.auth.issue_token(&record, pro_days, now)?;

    tracing::info!(email = %record.email, pro_days, "Issued Pro token");
    Ok(Json(json!({
        "email": record.email,
        "token": token,
        "expires": record.pro_expires_at,
    })))
}

fn verify_admin_key(
    configured: Option<&SecretString>,
    headers: &HeaderMap,
) -> Result<(), Error> {
    let Some(configured) = configured else {
        return Ok(());
    };
    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(configured.expose_secret()) {
        return Err(Error::new(ErrorDetails::AdminKeyInvalid));
    }
    Ok(())
}
