//! Middleware Components
//!
//! CORS, request tracking, and identity extraction.

use crate::games::types::AccountHandle;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer, ExposeHeaders};
use uuid::Uuid;

use super::errors::ApiError;

/// Request ID header key
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Set by the upstream identity provider after it has authenticated the caller
pub const ACCOUNT_HANDLE_HEADER: &str = "x-account-handle";

/// Shared secret for the administrative endpoints
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Create CORS middleware with configurable origins
pub fn create_cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let expose = ExposeHeaders::list([HeaderName::from_static(REQUEST_ID_HEADER)]);
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        // Development mode: allow all origins
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(expose)
    } else {
        CorsLayer::new()
            .allow_origin(
                allowed_origins
                    .into_iter()
                    .filter_map(|o| o.parse().ok())
                    .collect::<Vec<HeaderValue>>(),
            )
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers(Any)
            .expose_headers(expose)
    }
}

/// Middleware to add request ID to all requests
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    // Check if request already has an ID from client
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Request ID wrapper for extracting in handlers
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_parts(parts: &Parts) -> String {
        parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default()
    }
}

/// Account handle vouched for by the identity provider
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub AccountHandle);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::unauthorized(RequestId::from_parts(parts), "Unauthorized".to_string());

        let raw = parts
            .headers
            .get(ACCOUNT_HANDLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;

        AccountHandle::parse(raw)
            .map(AuthenticatedAccount)
            .map_err(|_| unauthorized())
    }
}

/// Constant-time comparison for the admin token
pub fn admin_token_matches(expected: &str, presented: Option<&str>) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
