//! Static ritual guide lookup.

use axum::extract::Path;
use axum::response::Json;
use serde_json::{json, Value};

use crate::error::{Error, ErrorDetails};
use crate::guides::ritual_guide;

/// GET `/api/mutawwif/guide/{key}`
pub async fn guide_handler(Path(key): Path<String>) -> Result<Json<Value>, Error> {
    let guide = ritual_guide(&key).ok_or_else(|| {
        Error::new(ErrorDetails::GuideNotFound { key })
    })?;
    Ok(Json(json!({ "guide": guide })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_known_guide_is_wrapped() {
        let Json(body) = guide_handler(Path("tawaf".to_string()))
            .await
            .expect("tawaf guide exists");
        assert_eq!(body["guide"]["key"], "tawaf");
        assert!(body["guide"]["steps"].as_array().is_some());
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let Json(body) = guide_handler(Path("TAWAF".to_string()))
            .await
            .expect("case must not matter");
        assert_eq!(body["guide"]["key"], "tawaf");
    }

    #[tokio::test]
    async fn test_unknown_guide_is_404() {
        let err = guide_handler(Path("wukuf".to_string()))
            .await
            .expect_err("unknown guide must be rejected");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.get_details().client_message(), "Ritual guide not found");
    }
}
