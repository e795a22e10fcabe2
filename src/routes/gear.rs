// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gear inventory routes for the authenticated user.
//!
//! Every lookup is scoped to the caller: an item owned by someone else is
//! reported exactly like a missing one.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Condition, GearCategory, GearItem, GearSpecs, Lifecycle, Purchase};
use crate::routes::extract::{new_id, parse_id, ApiQuery, ValidatedJson};
use crate::routes::{
    non_empty, page_limit, page_skip, CreatedResponse, DeletedResponse, Page, UpdatedResponse,
};
use crate::time_utils::{format_utc_rfc3339, parse_client_date};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

/// Gear routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user_materiel", get(list_gear).post(create_gear))
        .route(
            "/api/user_materiel/{id}",
            get(get_gear).patch(update_gear).delete(delete_gear),
        )
        .route("/api/user_materiel/{id}/inspections", post(record_inspection))
        .route("/api/user_materiel/{id}/usage", post(adjust_usage))
        .route("/api/user_materiel/{id}/retire", post(retire_gear))
}

// ─── Response ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub date: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub condition: Option<Condition>,
    pub usage_count: u32,
    pub last_inspection_at: Option<String>,
    pub next_inspection_at: Option<String>,
    pub retired_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GearResponse {
    pub id: String,
    pub owner_id: String,
    pub category: String,
    /// Category the label was classified into
    pub kind: GearCategory,
    pub specs: GearSpecs,
    pub purchase: Option<PurchaseResponse>,
    pub lifecycle: LifecycleResponse,
    pub meta: MetaResponse,
}

impl From<GearItem> for GearResponse {
    fn from(item: GearItem) -> Self {
        let kind = item.category_kind();
        let lc = item.lifecycle;
        Self {
            id: item.id,
            owner_id: item.owner_id,
            category: item.category,
            kind,
            specs: item.specs,
            purchase: item.purchase.map(|p| PurchaseResponse {
                date: p.date.map(format_utc_rfc3339),
                price: p.price,
            }),
            lifecycle: LifecycleResponse {
                condition: lc.condition,
                usage_count: lc.usage_count,
                last_inspection_at: lc.last_inspection_at.map(format_utc_rfc3339),
                next_inspection_at: lc.next_inspection_at.map(format_utc_rfc3339),
                retired_at: lc.retired_at.map(format_utc_rfc3339),
            },
            meta: MetaResponse {
                created_at: format_utc_rfc3339(item.meta.created_at),
                updated_at: item.meta.updated_at.map(format_utc_rfc3339),
            },
        }
    }
}

// ─── Input Normalization ─────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseInput {
    pub date: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleInput {
    pub condition: Option<String>,
    #[serde(alias = "usage_count")]
    pub usage_count: Option<u32>,
    #[serde(alias = "last_inspection_at")]
    pub last_inspection_at: Option<String>,
    #[serde(alias = "next_inspection_at")]
    pub next_inspection_at: Option<String>,
    #[serde(alias = "retired_at")]
    pub retired_at: Option<String>,
}

/// Create and update payload. Owner fields sent by the client are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct GearInput {
    #[validate(length(max = 80))]
    pub category: Option<String>,
    pub specs: Option<serde_json::Map<String, serde_json::Value>>,
    #[validate(nested)]
    pub purchase: Option<PurchaseInput>,
    #[validate(nested)]
    pub lifecycle: Option<LifecycleInput>,
}

impl GearInput {
    fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.specs.is_none()
            && self.purchase.is_none()
            && self.lifecycle.is_none()
    }
}

fn client_date(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    match non_empty(raw) {
        Some(s) => parse_client_date(&s)
            .map(Some)
            .ok_or_else(|| AppError::invalid_payload(format!("invalid date in '{field}'"))),
        None => Ok(None),
    }
}

fn category_label(raw: Option<&str>) -> Result<String> {
    non_empty(raw).ok_or_else(|| AppError::invalid_payload("Invalid 'category'"))
}

fn purchase_from(input: &PurchaseInput) -> Result<Purchase> {
    Ok(Purchase {
        date: client_date(input.date.as_deref(), "purchase.date")?,
        price: input.price,
    })
}

/// Build a lifecycle, scheduling the next inspection when only the last
/// one is given.
fn lifecycle_from(input: &LifecycleInput, category: GearCategory) -> Result<Lifecycle> {
    let mut lifecycle = Lifecycle {
        condition: input.condition.as_deref().map(Condition::normalize),
        usage_count: input.usage_count.unwrap_or(0),
        last_inspection_at: client_date(
            input.last_inspection_at.as_deref(),
            "lifecycle.lastInspectionAt",
        )?,
        next_inspection_at: client_date(
            input.next_inspection_at.as_deref(),
            "lifecycle.nextInspectionAt",
        )?,
        retired_at: client_date(input.retired_at.as_deref(), "lifecycle.retiredAt")?,
    };
    lifecycle.schedule_next_inspection(category);
    Ok(lifecycle)
}

/// The purchase price is also kept in the specs.
fn mirror_price(item: &mut GearItem) {
    if let Some(price) = item.purchase.as_ref().and_then(|p| p.price) {
        item.specs.price = Some(price);
    }
}

async fn load_owned(state: &AppState, id: &str, caller: &AuthUser) -> Result<GearItem> {
    state
        .db
        .get_gear(id, &caller.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("gear".to_string()))
}

// ─── CRUD ────────────────────────────────────────────────────

/// Create an item owned by the caller.
async fn create_gear(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<GearInput>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let category = category_label(req.category.as_deref())?;

    let id = new_id();
    let mut item = GearItem::new(id.clone(), caller.user_id.clone(), category, Utc::now());
    if let Some(specs) = &req.specs {
        item.specs = GearSpecs::from_json(specs);
    }
    if let Some(purchase) = &req.purchase {
        item.purchase = Some(purchase_from(purchase)?);
    }
    if let Some(lifecycle) = &req.lifecycle {
        item.lifecycle = lifecycle_from(lifecycle, item.category_kind())?;
    }
    mirror_price(&mut item);

    state.db.upsert_gear(&item).await?;

    tracing::info!(gear_id = %id, owner_id = %caller.user_id, "Created gear item");
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

#[derive(Debug, Deserialize)]
pub struct ListGearQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// The caller's items, newest first.
async fn list_gear(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListGearQuery>,
) -> Result<Json<Page<GearResponse>>> {
    let limit = page_limit(query.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let skip = page_skip(query.skip);
    let category = non_empty(query.category.as_deref());

    let mut items = state
        .db
        .list_gear_for_owner(&caller.user_id, category.as_deref())
        .await?;
    items.sort_by(|a, b| {
        b.meta
            .created_at
            .cmp(&a.meta.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    Ok(Json(
        Page::from_sorted(items, limit, skip).map(GearResponse::from),
    ))
}

async fn get_gear(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<GearResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(load_owned(&state, &id, &caller).await?.into()))
}

/// Partial update. Each given section replaces the stored one.
async fn update_gear(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<GearInput>,
) -> Result<Json<UpdatedResponse>> {
    let id = parse_id(&id)?;
    if req.is_empty() {
        return Err(AppError::invalid_payload("empty_update"));
    }

    let mut item = load_owned(&state, &id, &caller).await?;
    let before = item.clone();

    if req.category.is_some() {
        item.category = category_label(req.category.as_deref())?;
    }
    if let Some(specs) = &req.specs {
        item.specs = GearSpecs::from_json(specs);
    }
    if let Some(purchase) = &req.purchase {
        item.purchase = Some(purchase_from(purchase)?);
    }
    if let Some(lifecycle) = &req.lifecycle {
        item.lifecycle = lifecycle_from(lifecycle, item.category_kind())?;
    }
    if req.purchase.is_some() {
        mirror_price(&mut item);
    }

    let modified = item != before;
    if modified {
        item.meta.updated_at = Some(Utc::now());
        state.db.upsert_gear(&item).await?;
        tracing::info!(gear_id = %id, owner_id = %caller.user_id, "Updated gear item");
    }
    Ok(Json(UpdatedResponse { ok: true, modified }))
}

/// Hard delete of an owned item.
async fn delete_gear(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let id = parse_id(&id)?;
    if !state.db.delete_gear(&id, &caller.user_id).await? {
        return Err(AppError::NotFound("gear".to_string()));
    }
    tracing::info!(gear_id = %id, owner_id = %caller.user_id, "Deleted gear item");
    Ok(Json(DeletedResponse { deleted: true }))
}

// ─── Lifecycle Actions ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct InspectionRequest {
    pub at: Option<String>,
}

/// Record an inspection, now unless `at` is given. The body is optional.
async fn record_inspection(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<GearResponse>> {
    let id = parse_id(&id)?;
    let req: InspectionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        InspectionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::invalid_payload(e.to_string()))?
    };
    let at = client_date(req.at.as_deref(), "at")?.unwrap_or_else(Utc::now);

    let mut item = load_owned(&state, &id, &caller).await?;
    item.record_inspection(at);
    item.meta.updated_at = Some(Utc::now());
    state.db.upsert_gear(&item).await?;

    tracing::info!(gear_id = %id, at = %at, "Recorded inspection");
    Ok(Json(item.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UsageRequest {
    pub delta: i64,
}

/// Add uses to an item (negative to correct), floored at zero.
async fn adjust_usage(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UsageRequest>,
) -> Result<Json<GearResponse>> {
    let id = parse_id(&id)?;
    let mut item = load_owned(&state, &id, &caller).await?;
    item.adjust_usage(req.delta);
    item.meta.updated_at = Some(Utc::now());
    state.db.upsert_gear(&item).await?;

    tracing::debug!(gear_id = %id, delta = req.delta, usage = item.lifecycle.usage_count, "Adjusted usage");
    Ok(Json(item.into()))
}

/// Retire an item. Retiring twice keeps the first date.
async fn retire_gear(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<GearResponse>> {
    let id = parse_id(&id)?;
    let mut item = load_owned(&state, &id, &caller).await?;
    if item.is_active() {
        let now = Utc::now();
        item.retire(now);
        item.meta.updated_at = Some(now);
        state.db.upsert_gear(&item).await?;
        tracing::info!(gear_id = %id, owner_id = %caller.user_id, "Retired gear item");
    }
    Ok(Json(item.into()))
}
