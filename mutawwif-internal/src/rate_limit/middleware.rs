//! Basic-tier rate limiting middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::{Error, ErrorDetails};
use crate::rate_limit::{DailyUsageLimiter, UsageDecision};

/// Gate a request on the per-identity daily counter.
///
/// Runs before the handler; a denied request never reaches it.
pub async fn basic_rate_limit_middleware(
    State(limiter): State<Arc<DailyUsageLimiter>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let identity_key = client_identity_key(request.headers(), peer);

    match limiter.admit(&identity_key) {
        UsageDecision::Admit { count } => {
            debug!(
                identity = identity_key,
                count,
                limit = limiter.limit(),
                "Basic usage check passed"
            );
            Ok(next.run(request).await)
        }
        UsageDecision::Deny { limit } => {
            debug!(identity = identity_key, limit, "Basic daily limit reached");
            Err(Error::new(ErrorDetails::RateLimitExceeded))
        }
    }
}

/// Derive the identity key for usage counting.
///
/// Prefers the first address in `x-forwarded-for`, which is client-supplied
/// and trivially spoofable; falls back to the transport peer address. The
/// trust level of the header is a documented limitation and is intentionally
/// not upgraded here.
pub fn client_identity_key(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.9:51234".parse().expect("valid socket address")
    }

    #[test]
    fn test_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 198.51.100.2"),
        );
        assert_eq!(client_identity_key(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn test_trims_whitespace_around_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  203.0.113.7 "));
        assert_eq!(client_identity_key(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let headers = HeaderMap::new();
        assert_eq!(client_identity_key(&headers, peer()), "10.0.0.9");
    }

    #[test]
    fn test_empty_forwarded_header_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_identity_key(&headers, peer()), "10.0.0.9");
    }
}
