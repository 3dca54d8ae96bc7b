//! Admin authentication.
//!
//! The admin routes are guarded by a single pre-shared key, compared in constant time.
//! Units never authenticate here; they sign in with their credential ID instead.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// PSK authentication layer. With no key configured every request passes (dev mode).
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    match provided_key(request.headers()) {
        Some(key) if constant_time_compare(key, &expected) => next.run(request).await,
        Some(_) => unauthorized("Invalid API key"),
        None => unauthorized("Missing API key"),
    }
}

/// The key from `x-api-key`, falling back to a bearer token.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

/// Perform constant-time string comparison.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized(message: &str) -> Response {
    tracing::debug!("Rejected admin request: {}", message);
    AppError::Unauthorized(message.to_string()).into_response()
}
