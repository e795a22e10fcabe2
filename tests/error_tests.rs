// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use zone_de_grimpe::error::AppError;

async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_client_errors_carry_code() {
    let (status, body) = body_of(AppError::bad_id()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "bad_id" }));

    let (status, body) = body_of(AppError::bad_request("missing_fields", "email_and_password_required")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_fields");
    assert_eq!(body["detail"], "email_and_password_required");

    let (status, body) = body_of(AppError::Conflict("email_taken")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email_taken");

    let (status, body) = body_of(AppError::NotFound("gear item".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_credentials_errors_are_opaque() {
    let (status, unauthorized) = body_of(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(unauthorized.get("detail").is_none());

    let (status, invalid) = body_of(AppError::InvalidCredentials).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(invalid["error"], "invalid_credentials");
    assert!(invalid.get("detail").is_none());
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let (status, body) = body_of(AppError::Database("deadline exceeded on users/42".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "server_error" }));

    let (status, body) = body_of(AppError::Internal(anyhow::anyhow!("argon2 failure"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "server_error" }));
}
