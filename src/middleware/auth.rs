// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Session token lifetime.
pub const TOKEN_TTL_SECS: usize = 7 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validate a session token and return the user ID it carries.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &key, &validation).ok()?;
    let id = Uuid::parse_str(&data.claims.sub).ok()?;
    Some(id.to_string())
}

/// Middleware that requires valid JWT authentication.
///
/// Every failure is the same 401 response; callers cannot tell a missing
/// token from an expired or forged one.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = bearer_token(&request)
        .and_then(|token| verify_jwt(token, &state.config.jwt_signing_key))
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
