//! Pro-tier credential verification.
//!
//! A Pro request carries a signed bearer token whose subject must resolve to a
//! currently-entitled subscriber record. This is a synchronous gate: no
//! request processing proceeds past it on any failure path.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorDetails};
use crate::subscriber::{Entitlement, SubscriberRecord, SubscriberStore};

#[derive(Debug, Serialize, Deserialize)]
struct ProTokenClaims {
    /// Subscriber record id
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct ProAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    store: Arc<dyn SubscriberStore>,
}

impl ProAuth {
    pub fn new(jwt_secret: &SecretString, store: Arc<dyn SubscriberStore>) -> Self {
        let secret = jwt_secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            store,
        }
    }

    /// Sign a Pro access token for `record`, valid for `pro_days` days.
    pub fn issue_token(
        &self,
        record: &SubscriberRecord,
        pro_days: i64,
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        let claims = ProTokenClaims {
            sub: record.id.clone(),
            email: record.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(pro_days)).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            Error::new(ErrorDetails::TokenIssue {
                message: e.to_string(),
            })
        })
    }

    /// Verify the `Authorization` header and resolve it to an entitled
    /// subscriber record.
    pub async fn verify_request(&self, headers: &HeaderMap) -> Result<SubscriberRecord, Error> {
        let token = bearer_token(headers).ok_or_else(|| Error::new(ErrorDetails::AuthMissing))?;

        let claims = jsonwebtoken::decode::<ProTokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| {
            Error::new(ErrorDetails::AuthInvalid {
                message: e.to_string(),
            })
        })?
        .claims;

        let record = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| Error::new(ErrorDetails::EntitlementInactive))?;

        match record.entitlement_at(Utc::now()) {
            Entitlement::Active => Ok(record),
            Entitlement::Inactive => Err(Error::new(ErrorDetails::EntitlementInactive)),
            Entitlement::Expired => Err(Error::new(ErrorDetails::EntitlementExpired)),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Middleware gating the Pro endpoint. On success the resolved subscriber
/// record is attached to the request extensions for the handler.
pub async fn require_pro_subscriber(
    State(auth): State<ProAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let subscriber = auth.verify_request(request.headers()).await?;
    request.extensions_mut().insert(subscriber);
    Ok(next.run(request).await)
}
