// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing, malformed, or expired credentials. The cause is never exposed.
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid request ({code}): {detail:?}")]
    BadRequest {
        code: &'static str,
        detail: Option<String>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Client error with an error code and a human-readable detail.
    pub fn bad_request(code: &'static str, detail: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            detail: Some(detail.into()),
        }
    }

    /// Client error carrying only an error code.
    pub fn bad_request_code(code: &'static str) -> Self {
        AppError::BadRequest { code, detail: None }
    }

    /// Payload failed schema/shape checks.
    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        Self::bad_request("invalid_payload", detail)
    }

    /// Path identifier is not a well-formed id.
    pub fn bad_id() -> Self {
        Self::bad_request_code("bad_id")
    }

    /// Machine-readable error code sent to the client.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::BadRequest { code, .. } => code,
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(code) => code,
            AppError::Database(_) | AppError::Internal(_) => "server_error",
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::Unauthorized | AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, None)
            }
            AppError::BadRequest { detail, .. } => (StatusCode::BAD_REQUEST, detail.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Some(msg.clone())),
            AppError::Conflict(_) => (StatusCode::CONFLICT, None),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::invalid_payload(errors.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid_payload(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request("invalid_query", rejection.body_text())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
