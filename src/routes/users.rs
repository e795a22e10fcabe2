// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory routes and the caller's own profile.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::UserProfile;
use crate::models::{ClimbingLevel, Role, User, UserStatus};
use crate::routes::extract::{new_id, parse_id, ApiQuery, ValidatedJson};
use crate::routes::{
    non_empty, page_limit, page_skip, CreatedResponse, DeletedResponse, Page, UpdatedResponse,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_LIST_LIMIT: usize = 20;
const MAX_LIST_LIMIT: usize = 200;

/// Directory routes (no authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Routes acting on the authenticated caller.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/users/me",
        get(get_me).patch(update_me).delete(delete_me),
    )
}

// ─── Public User ─────────────────────────────────────────────

/// User as sent to clients: no password hash, no security timestamps.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "Array<string>"))]
    pub roles: Vec<Role>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub status: UserStatus,
    pub email_verified: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "{ level: string | null }"))]
    pub profile: UserProfile,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            phone: user.phone,
            roles: user.roles,
            status: user.status,
            email_verified: user.email_verified,
            profile: user.profile,
        }
    }
}

/// Roles that can be assigned through the directory.
fn validate_directory_role(role: &Role) -> std::result::Result<(), ValidationError> {
    match role {
        Role::Member | Role::Admin => Ok(()),
        _ => Err(ValidationError::new("role_not_assignable")),
    }
}

// ─── Directory ───────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_directory_role"))]
    pub role: Option<Role>,
}

/// Create a directory entry. The account has no password until its owner
/// registers with the same email.
async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let name = non_empty(Some(&req.name)).ok_or_else(|| AppError::invalid_payload("name"))?;
    let email = req.email.trim().to_lowercase();
    let role = req.role.unwrap_or(Role::Member);

    let id = new_id();
    state.db.claim_email(&email, &id).await?;

    let user = User::new(id.clone(), email.clone(), name, vec![role], Utc::now());
    if let Err(e) = state.db.upsert_user(&user).await {
        release_claim(&state, &email).await;
        return Err(e);
    }

    tracing::info!(user_id = %id, "Created user");
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

/// Drop an email claim after a failed write.
pub(crate) async fn release_claim(state: &AppState, email: &str) {
    if let Err(e) = state.db.release_email(email).await {
        tracing::warn!(error = %e, "Failed to release email claim");
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// List users, newest first, with an optional substring search.
async fn list_users(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<Json<Page<UserResponse>>> {
    let limit = page_limit(query.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let skip = page_skip(query.skip);
    let needle = non_empty(query.search.as_deref()).map(|s| s.to_lowercase());

    let mut users: Vec<User> = state
        .db
        .list_users()
        .await?
        .into_iter()
        .filter(|u| match &needle {
            Some(n) => u.display_name.to_lowercase().contains(n) || u.email.contains(n),
            None => true,
        })
        .collect();
    users.sort_by(|a, b| {
        b.security
            .created_at
            .cmp(&a.security.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    Ok(Json(
        Page::from_sorted(users, limit, skip).map(UserResponse::from),
    ))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let id = parse_id(&id)?;
    let user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_directory_role"))]
    pub role: Option<Role>,
}

/// Partial update of a directory entry.
///
/// A new email is claimed before the user is written and the old claim is
/// released afterwards, so the user always holds at least one claim.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UpdatedResponse>> {
    let id = parse_id(&id)?;
    if req.name.is_none() && req.email.is_none() && req.role.is_none() {
        return Err(AppError::invalid_payload("empty_update"));
    }

    let mut user = state
        .db
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;
    let before = user.clone();

    if let Some(name) = non_empty(req.name.as_deref()) {
        user.display_name = name;
    }
    if let Some(role) = req.role {
        user.roles = vec![role];
    }

    let new_email = req
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| *e != user.email);
    if let Some(email) = &new_email {
        state.db.claim_email(email, &user.id).await?;
        user.email = email.clone();
    }

    let modified = user != before;
    if modified {
        user.security.updated_at = Some(Utc::now());
        if let Err(e) = state.db.upsert_user(&user).await {
            if let Some(email) = &new_email {
                release_claim(&state, email).await;
            }
            return Err(e);
        }
    }
    if new_email.is_some() {
        release_claim(&state, &before.email).await;
    }

    tracing::info!(user_id = %id, modified, "Updated user");
    Ok(Json(UpdatedResponse { ok: true, modified }))
}

/// Delete a user along with their email claim and gear.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let id = parse_id(&id)?;
    let Some(user) = state.db.get_user(&id).await? else {
        return Ok(Json(DeletedResponse { deleted: false }));
    };
    state.db.delete_user_data(&user).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

// ─── Current User ────────────────────────────────────────────

async fn load_caller(state: &AppState, caller: &AuthUser) -> Result<User> {
    state
        .db
        .get_user(&caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    Ok(Json(load_caller(&state, &caller).await?.into()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub level: Option<ClimbingLevel>,
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>> {
    if req.phone.is_none() && req.avatar_url.is_none() && req.level.is_none() {
        return Err(AppError::invalid_payload("empty_update"));
    }

    let mut user = load_caller(&state, &caller).await?;
    if let Some(phone) = req.phone {
        user.phone = non_empty(Some(&phone));
    }
    if let Some(url) = req.avatar_url {
        user.avatar_url = Some(url);
    }
    if let Some(level) = req.level {
        user.profile.level = Some(level);
    }
    user.security.updated_at = Some(Utc::now());
    state.db.upsert_user(&user).await?;

    Ok(Json(user.into()))
}

/// Delete the caller's account, email claim and gear.
async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
) -> Result<Json<DeletedResponse>> {
    tracing::info!(user_id = %caller.user_id, "User-initiated account deletion");
    let user = load_caller(&state, &caller).await?;
    state.db.delete_user_data(&user).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}
