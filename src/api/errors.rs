//! API Error Handling
//!
//! Structured error responses with proper HTTP status codes and request tracking.

use crate::errors::BetError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable kind (VALIDATION_ERROR, INSUFFICIENT_FUNDS, ...)
    pub code: String,
    pub message: String,
}

/// API error with the id of the request that produced it
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    /// A rejected bet or account operation
    Bet(BetError),
    Unauthorized(String),
    NotFound(String),
}

impl ApiError {
    pub fn bet(request_id: String, error: BetError) -> Self {
        Self {
            kind: ApiErrorKind::Bet(error),
            request_id,
        }
    }

    pub fn unauthorized(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized(message),
            request_id,
        }
    }

    pub fn not_found(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::NotFound(message),
            request_id,
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match &self.kind {
            ApiErrorKind::Bet(e) => {
                let status = match e {
                    BetError::Validation(_)
                    | BetError::InsufficientFunds { .. }
                    | BetError::ConcurrencyConflict => StatusCode::BAD_REQUEST,
                    BetError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                    BetError::AccountExists(_) => StatusCode::CONFLICT,
                    BetError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match e {
                    // Storage details stay in the logs
                    BetError::Persistence(_) => "server error".to_string(),
                    BetError::ConcurrencyConflict => "insufficient balance".to_string(),
                    other => other.to_string(),
                };
                (status, e.kind(), message)
            }
            ApiErrorKind::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            ApiErrorKind::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (status, code, message) = self.parts();
        write!(f, "[{}] {} {}: {}", self.request_id, status.as_u16(), code, message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
