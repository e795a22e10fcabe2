// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gear catalog routes.

use crate::error::{AppError, Result};
use crate::models::GearSpec;
use crate::routes::extract::{new_id, parse_id, ApiQuery, ValidatedJson};
use crate::routes::{
    non_empty, page_limit, page_skip, CreatedResponse, DeletedResponse, Page, UpdatedResponse,
};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/materiel_specs", get(list_specs).post(create_spec))
        .route(
            "/api/materiel_specs/{id}",
            get(get_spec).patch(update_spec).delete(delete_spec),
        )
}

#[derive(Debug, Serialize)]
pub struct GearSpecResponse {
    pub id: String,
    pub category: String,
    pub brand: String,
    pub model: String,
    #[serde(rename = "type")]
    pub spec_type: Option<String>,
    pub description: Option<String>,
    pub recommended_max_usage: Option<u32>,
    pub inspection_interval_months: Option<u32>,
    pub specs: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<GearSpec> for GearSpecResponse {
    fn from(s: GearSpec) -> Self {
        Self {
            id: s.id,
            category: s.category,
            brand: s.brand,
            model: s.model,
            spec_type: s.spec_type,
            description: s.description,
            recommended_max_usage: s.recommended_max_usage,
            inspection_interval_months: s.inspection_interval_months,
            specs: s.specs,
            created_at: format_utc_rfc3339(s.created_at),
            updated_at: s.updated_at.map(format_utc_rfc3339),
        }
    }
}

/// Create and update payload. `category`, `brand` and `model` are required
/// on create and must not be blank when given.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GearSpecInput {
    #[validate(length(max = 80))]
    pub category: Option<String>,
    #[validate(length(max = 80))]
    pub brand: Option<String>,
    #[validate(length(max = 120))]
    pub model: Option<String>,
    #[serde(rename = "type")]
    #[validate(length(max = 50))]
    pub spec_type: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(alias = "recommended_max_usage")]
    pub recommended_max_usage: Option<u32>,
    #[serde(alias = "inspection_interval_months")]
    #[validate(range(min = 1, max = 120))]
    pub inspection_interval_months: Option<u32>,
    pub specs: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GearSpecInput {
    fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.brand.is_none()
            && self.model.is_none()
            && self.spec_type.is_none()
            && self.description.is_none()
            && self.recommended_max_usage.is_none()
            && self.inspection_interval_months.is_none()
            && self.specs.is_none()
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| AppError::invalid_payload(format!("Invalid '{field}'")))
}

/// Free-form catalog attributes, stringified. Nulls are dropped.
fn spec_attributes(raw: &serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, String> {
    raw.iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key.clone(), s.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

/// Apply the optional fields of `req` to `spec`.
fn apply_optional(spec: &mut GearSpec, req: &GearSpecInput) {
    if let Some(t) = &req.spec_type {
        spec.spec_type = non_empty(Some(t));
    }
    if let Some(d) = &req.description {
        spec.description = non_empty(Some(d));
    }
    if req.recommended_max_usage.is_some() {
        spec.recommended_max_usage = req.recommended_max_usage;
    }
    if req.inspection_interval_months.is_some() {
        spec.inspection_interval_months = req.inspection_interval_months;
    }
    if let Some(attrs) = &req.specs {
        spec.specs = spec_attributes(attrs);
    }
}

async fn create_spec(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<GearSpecInput>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let mut spec = GearSpec {
        id: new_id(),
        category: required(req.category.as_deref(), "category")?,
        brand: required(req.brand.as_deref(), "brand")?,
        model: required(req.model.as_deref(), "model")?,
        spec_type: None,
        description: None,
        recommended_max_usage: None,
        inspection_interval_months: None,
        specs: BTreeMap::new(),
        created_at: Utc::now(),
        updated_at: None,
    };
    apply_optional(&mut spec, &req);

    state.db.upsert_gear_spec(&spec).await?;

    tracing::info!(spec_id = %spec.id, category = %spec.category, "Created catalog entry");
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(spec.id))))
}

#[derive(Debug, Deserialize)]
pub struct ListSpecsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

fn matches_search(spec: &GearSpec, needle: &str) -> bool {
    spec.brand.to_lowercase().contains(needle)
        || spec.model.to_lowercase().contains(needle)
        || spec
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

/// Catalog listing sorted by category, then brand.
async fn list_specs(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListSpecsQuery>,
) -> Result<Json<Page<GearSpecResponse>>> {
    let limit = page_limit(query.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let skip = page_skip(query.skip);
    let category = non_empty(query.category.as_deref());
    let needle = non_empty(query.search.as_deref()).map(|s| s.to_lowercase());

    let mut specs: Vec<GearSpec> = state
        .db
        .list_gear_specs(category.as_deref())
        .await?
        .into_iter()
        .filter(|s| needle.as_deref().is_none_or(|n| matches_search(s, n)))
        .collect();
    specs.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.brand.cmp(&b.brand))
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(Json(
        Page::from_sorted(specs, limit, skip).map(GearSpecResponse::from),
    ))
}

async fn get_spec(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GearSpecResponse>> {
    let id = parse_id(&id)?;
    let spec = state
        .db
        .get_gear_spec(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("catalog entry".to_string()))?;
    Ok(Json(spec.into()))
}

async fn update_spec(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<GearSpecInput>,
) -> Result<Json<UpdatedResponse>> {
    let id = parse_id(&id)?;
    if req.is_empty() {
        return Err(AppError::invalid_payload("empty_update"));
    }

    let mut spec = state
        .db
        .get_gear_spec(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("catalog entry".to_string()))?;
    let before = spec.clone();

    if req.category.is_some() {
        spec.category = required(req.category.as_deref(), "category")?;
    }
    if req.brand.is_some() {
        spec.brand = required(req.brand.as_deref(), "brand")?;
    }
    if req.model.is_some() {
        spec.model = required(req.model.as_deref(), "model")?;
    }
    apply_optional(&mut spec, &req);

    let modified = spec != before;
    if modified {
        spec.updated_at = Some(Utc::now());
        state.db.upsert_gear_spec(&spec).await?;
        tracing::info!(spec_id = %id, "Updated catalog entry");
    }
    Ok(Json(UpdatedResponse { ok: true, modified }))
}

async fn delete_spec(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let id = parse_id(&id)?;
    let deleted = state.db.delete_gear_spec(&id).await?;
    Ok(Json(DeletedResponse { deleted }))
}
