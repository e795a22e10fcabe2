// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidateEmail};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{Role, User};
use crate::routes::extract::{new_id, ValidatedJson};
use crate::routes::non_empty;
use crate::routes::users::{release_claim, UserResponse};
use crate::services::password::{hash_password, verify_password};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[validate(length(max = 80))]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Session token plus the public user.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Lower-cased email and password, or `missing_fields`.
fn credentials(email: Option<&str>, password: Option<&str>) -> Result<(String, String)> {
    let email = non_empty(email).map(|e| e.to_lowercase());
    let password = password.filter(|p| !p.is_empty()).map(str::to_string);
    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::bad_request(
            "missing_fields",
            "email_and_password_required",
        )),
    }
}

fn session(state: &AppState, user: User) -> Result<AuthResponse> {
    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Create an account, or set the password of a directory entry that has none.
async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (email, password) = credentials(req.email.as_deref(), req.password.as_deref())?;
    if !email.validate_email() {
        return Err(AppError::bad_request_code("invalid_email"));
    }
    let display_name = non_empty(req.display_name.as_deref())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let now = Utc::now();

    if let Some(mut existing) = state.db.find_user_by_email(&email).await? {
        if existing.password_hash.is_some() {
            return Err(AppError::Conflict("email_taken"));
        }

        existing.password_hash = Some(hash_password(&password)?);
        if existing.display_name.trim().is_empty() {
            existing.display_name = display_name;
        }
        if existing.roles.is_empty() {
            existing.roles = vec![Role::User];
        }
        existing.security.updated_at = Some(now);
        existing.security.last_login_at = None;
        state.db.upsert_user(&existing).await?;

        tracing::info!(user_id = %existing.id, "Initialized password for existing user");
        return Ok((StatusCode::OK, Json(session(&state, existing)?)));
    }

    let id = new_id();
    state.db.claim_email(&email, &id).await?;

    let mut user = User::new(id.clone(), email.clone(), display_name, vec![Role::User], now);
    user.password_hash = Some(hash_password(&password)?);
    if let Err(e) = state.db.upsert_user(&user).await {
        release_claim(&state, &email).await;
        return Err(e);
    }

    tracing::info!(user_id = %id, "Registered user");
    Ok((StatusCode::CREATED, Json(session(&state, user)?)))
}

/// Check credentials and issue a session token.
///
/// Unknown email, missing password hash and wrong password all give the
/// same `invalid_credentials` response.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (email, password) = credentials(req.email.as_deref(), req.password.as_deref())?;

    let mut user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    let hash = user
        .password_hash
        .as_deref()
        .ok_or(AppError::InvalidCredentials)?;

    let ok = verify_password(&password, hash).unwrap_or_else(|e| {
        tracing::warn!(user_id = %user.id, error = %e, "Stored password hash unreadable");
        false
    });
    if !ok {
        return Err(AppError::InvalidCredentials);
    }

    user.security.last_login_at = Some(Utc::now());
    state.db.upsert_user(&user).await?;

    Ok(Json(session(&state, user)?))
}

/// Current user, from the session token.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user(&caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_normalization() {
        let (email, password) = credentials(Some("  Bloc@Example.ORG "), Some("pw")).unwrap();
        assert_eq!(email, "bloc@example.org");
        assert_eq!(password, "pw");

        let err = credentials(Some("a@b.fr"), Some("")).unwrap_err();
        assert_eq!(err.code(), "missing_fields");
        let err = credentials(None, Some("pw")).unwrap_err();
        assert_eq!(err.code(), "missing_fields");
    }
}
