// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Climbing spot directory routes.

use crate::error::{AppError, Result};
use crate::models::spot::SpotSource;
use crate::models::{ClimbingSpot, Orientation, SpotLocation};
use crate::routes::extract::{new_id, parse_id, ApiQuery, ValidatedJson};
use crate::routes::{non_empty, page_limit, CreatedResponse, DeletedResponse, UpdatedResponse};
use crate::services::geometry::{latitude_band, rank_by_distance, BoundingBox};
use crate::services::{normalize_grade, normalize_point};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

const DEFAULT_LIST_LIMIT: usize = 1000;
const MAX_LIST_LIMIT: usize = 5000;
const DEFAULT_NEAR_RADIUS_M: f64 = 5000.0;
const MAX_NEAR_RADIUS_M: f64 = 100_000.0;
const DEFAULT_NEAR_LIMIT: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/spots", get(list_spots).post(create_spot))
        .route("/api/spots/near", get(near_spots))
        .route(
            "/api/spots/{id}",
            get(get_spot).patch(update_spot).delete(delete_spot),
        )
}

// ─── Representations ─────────────────────────────────────────

/// Full spot, as returned by `GET /api/spots/{id}`.
#[derive(Debug, Serialize)]
pub struct SpotResponse {
    pub id: String,
    pub osm_id: Option<String>,
    pub name: String,
    pub location: SpotLocation,
    #[serde(rename = "type")]
    pub spot_type: Option<String>,
    pub soustype: Option<String>,
    pub niveau_min: Option<String>,
    pub niveau_max: Option<String>,
    pub orientation: Option<Orientation>,
    pub grade: Option<String>,
    pub grade_mean: Option<String>,
    pub grade_mean_num: Option<f64>,
    pub required_rope_m: Option<f64>,
    pub required_qd: Option<u32>,
    pub tags: Vec<String>,
    pub id_voix: Vec<String>,
    pub url: Option<String>,
    pub info: Option<String>,
    pub info_complementaires: Option<String>,
    pub source: Option<SpotSource>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<ClimbingSpot> for SpotResponse {
    fn from(s: ClimbingSpot) -> Self {
        Self {
            id: s.id,
            osm_id: s.osm_id,
            name: s.name,
            location: s.location,
            spot_type: s.spot_type,
            soustype: s.soustype,
            niveau_min: s.niveau_min,
            niveau_max: s.niveau_max,
            orientation: s.orientation,
            grade: s.grade,
            grade_mean: s.grade_mean,
            grade_mean_num: s.grade_mean_num,
            required_rope_m: s.required_rope_m,
            required_qd: s.required_qd,
            tags: s.tags,
            id_voix: s.id_voix,
            url: s.url,
            info: s.info,
            info_complementaires: s.info_complementaires,
            source: s.source,
            created_at: format_utc_rfc3339(s.created_at),
            updated_at: s.updated_at.map(format_utc_rfc3339),
        }
    }
}

/// Map-client row used by `format=flat`.
#[derive(Debug, Serialize)]
pub struct FlatSpot {
    pub id: String,
    pub osm_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub spot_type: Option<String>,
    pub soustype: Option<String>,
    pub niveau_min: Option<String>,
    pub niveau_max: Option<String>,
    pub id_voix: Vec<String>,
    pub location: SpotLocation,
    pub url: Option<String>,
    pub info_complementaires: Option<String>,
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist_m: Option<f64>,
}

impl FlatSpot {
    fn new(s: ClimbingSpot, dist_m: Option<f64>) -> Self {
        Self {
            id: s.id,
            osm_id: s.osm_id,
            name: s.name,
            spot_type: s.spot_type,
            soustype: s.soustype,
            niveau_min: s.niveau_min,
            niveau_max: s.niveau_max,
            id_voix: s.id_voix,
            location: s.location,
            url: s.url,
            info_complementaires: s.info_complementaires,
            orientation: s.orientation,
            dist_m,
        }
    }

    fn into_feature(self) -> Feature {
        let geometry = Geometry::new(geojson::Value::Point(vec![
            self.location.lng(),
            self.location.lat(),
        ]));

        let mut properties = JsonObject::new();
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(&self) {
            for (key, value) in fields {
                if key != "location" {
                    properties.insert(key, value);
                }
            }
        }

        Feature {
            bbox: None,
            geometry: Some(geometry),
            id: Some(geojson::feature::Id::String(self.id)),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Render spots as a GeoJSON FeatureCollection (default) or a flat array.
fn render(spots: Vec<(ClimbingSpot, Option<f64>)>, format: Option<&str>) -> Response {
    let rows = spots.into_iter().map(|(s, d)| FlatSpot::new(s, d));
    if format == Some("flat") {
        return Json(rows.collect::<Vec<_>>()).into_response();
    }
    Json(FeatureCollection {
        bbox: None,
        features: rows.map(FlatSpot::into_feature).collect(),
        foreign_members: None,
    })
    .into_response()
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GeometryInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SourceInput {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(url)]
    pub url: Option<String>,
}

fn validate_name(name: &str) -> std::result::Result<(), ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::new("blank_name"))
    } else {
        Ok(())
    }
}

fn validate_tags(tags: &[String]) -> std::result::Result<(), ValidationError> {
    if tags.iter().all(|t| (1..=30).contains(&t.chars().count())) {
        Ok(())
    } else {
        Err(ValidationError::new("tag_length"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSpotRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_name"))]
    pub name: String,
    pub geometry: GeometryInput,
    #[validate(length(max = 20))]
    pub grade: Option<String>,
    #[validate(length(max = 2000))]
    pub info: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    #[validate(nested)]
    pub source: Option<SourceInput>,
    #[serde(rename = "type")]
    #[validate(length(max = 50))]
    pub spot_type: Option<String>,
    #[validate(length(max = 50))]
    pub soustype: Option<String>,
    #[validate(length(max = 10))]
    pub niveau_min: Option<String>,
    #[validate(length(max = 10))]
    pub niveau_max: Option<String>,
    pub orientation: Option<String>,
    #[validate(length(max = 10))]
    pub grade_mean: Option<String>,
    #[validate(range(min = 0.0))]
    pub required_rope_m: Option<f64>,
    pub required_qd: Option<u32>,
    #[validate(url)]
    pub url: Option<String>,
    #[validate(length(max = 2000))]
    pub info_complementaires: Option<String>,
    pub osm_id: Option<String>,
}

fn parse_orientation(raw: Option<&str>) -> Result<Option<Orientation>> {
    non_empty(raw)
        .map(|o| {
            o.parse::<Orientation>()
                .map_err(|e| AppError::invalid_payload(e.to_string()))
        })
        .transpose()
}

async fn create_spot(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateSpotRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let location = normalize_point(&req.geometry.kind, &req.geometry.coordinates)
        .map_err(|e| AppError::invalid_payload(e.to_string()))?;
    let orientation = parse_orientation(req.orientation.as_deref())?;

    let id = new_id();
    let mut spot = ClimbingSpot::new(id.clone(), req.name.trim().to_string(), location, Utc::now());
    spot.osm_id = non_empty(req.osm_id.as_deref());
    spot.spot_type = non_empty(req.spot_type.as_deref());
    spot.soustype = non_empty(req.soustype.as_deref());
    spot.niveau_min = non_empty(req.niveau_min.as_deref());
    spot.niveau_max = non_empty(req.niveau_max.as_deref());
    spot.orientation = orientation;
    spot.grade = non_empty(req.grade.as_deref());
    spot.grade_mean_num = req.grade_mean.as_deref().and_then(normalize_grade);
    spot.grade_mean = non_empty(req.grade_mean.as_deref());
    spot.required_rope_m = req.required_rope_m;
    spot.required_qd = req.required_qd;
    spot.tags = req.tags;
    spot.url = req.url;
    spot.info = req.info;
    spot.info_complementaires = req.info_complementaires;
    spot.source = req.source.map(|s| SpotSource {
        name: s.name,
        url: s.url,
    });

    state.db.upsert_spot(&spot).await?;

    tracing::info!(spot_id = %id, "Created spot");
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(id))))
}

// ─── Listing and Proximity ───────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSpotsQuery {
    pub format: Option<String>,
    pub min_lng: Option<f64>,
    pub min_lat: Option<f64>,
    pub max_lng: Option<f64>,
    pub max_lat: Option<f64>,
    pub limit: Option<i64>,
}

/// List spots, optionally inside a bounding box.
async fn list_spots(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListSpotsQuery>,
) -> Result<Response> {
    let limit = page_limit(query.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let bbox = BoundingBox::from_parts(query.min_lng, query.min_lat, query.max_lng, query.max_lat)
        .map_err(|e| AppError::bad_request("invalid_query", e.to_string()))?;

    let spots = match bbox {
        Some(bbox) => state
            .db
            .list_spots_in_lat_band(bbox.min_lat(), bbox.max_lat(), false)
            .await?
            .into_iter()
            .filter(|s| bbox.contains(&s.location))
            .take(limit)
            .collect(),
        None => state.db.list_spots(Some(limit as u32)).await?,
    };

    Ok(render(
        spots.into_iter().map(|s| (s, None)).collect(),
        query.format.as_deref(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub radius: Option<f64>,
    pub limit: Option<i64>,
    pub format: Option<String>,
}

/// Spots within `radius` meters of a point, nearest first.
async fn near_spots(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<NearQuery>,
) -> Result<Response> {
    let (Some(lng), Some(lat)) = (query.lng, query.lat) else {
        return Err(AppError::bad_request_code("missing_params"));
    };
    let origin = normalize_point("Point", &[lng, lat])
        .map_err(|e| AppError::bad_request("invalid_query", e.to_string()))?;
    let radius = query
        .radius
        .filter(|r| r.is_finite())
        .unwrap_or(DEFAULT_NEAR_RADIUS_M)
        .clamp(1.0, MAX_NEAR_RADIUS_M);
    let limit = page_limit(query.limit, DEFAULT_NEAR_LIMIT, MAX_LIST_LIMIT);

    let (min_lat, max_lat) = latitude_band(origin.lat(), radius);
    let candidates = state
        .db
        .list_spots_in_lat_band(min_lat, max_lat, false)
        .await?;
    let ranked = rank_by_distance(candidates, &origin, radius, limit);

    tracing::debug!(lng, lat, radius, count = ranked.len(), "Proximity query");
    Ok(render(
        ranked.into_iter().map(|(s, d)| (s, Some(d))).collect(),
        query.format.as_deref(),
    ))
}

// ─── Single Spot ─────────────────────────────────────────────

async fn get_spot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SpotResponse>> {
    let id = parse_id(&id)?;
    let spot = state
        .db
        .get_spot(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("spot".to_string()))?;
    Ok(Json(spot.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSpotRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_name"))]
    pub name: Option<String>,
    #[validate(length(max = 50))]
    pub soustype: Option<String>,
    #[validate(length(max = 10))]
    pub niveau_min: Option<String>,
    #[validate(length(max = 10))]
    pub niveau_max: Option<String>,
    #[validate(length(max = 10))]
    pub orientation: Option<String>,
}

impl UpdateSpotRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.soustype.is_none()
            && self.niveau_min.is_none()
            && self.niveau_max.is_none()
            && self.orientation.is_none()
    }
}

/// Partial update limited to descriptive fields.
async fn update_spot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateSpotRequest>,
) -> Result<Json<UpdatedResponse>> {
    let id = parse_id(&id)?;
    if req.is_empty() {
        return Err(AppError::invalid_payload("empty_update"));
    }
    let orientation = parse_orientation(req.orientation.as_deref())?;

    let mut spot = state
        .db
        .get_spot(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("spot".to_string()))?;
    let before = spot.clone();

    if let Some(name) = non_empty(req.name.as_deref()) {
        spot.name = name;
    }
    if let Some(soustype) = req.soustype {
        spot.soustype = non_empty(Some(&soustype));
    }
    if let Some(niveau_min) = req.niveau_min {
        spot.niveau_min = non_empty(Some(&niveau_min));
    }
    if let Some(niveau_max) = req.niveau_max {
        spot.niveau_max = non_empty(Some(&niveau_max));
    }
    if req.orientation.is_some() {
        spot.orientation = orientation;
    }

    let modified = spot != before;
    if modified {
        spot.updated_at = Some(Utc::now());
        state.db.upsert_spot(&spot).await?;
        tracing::info!(spot_id = %id, "Updated spot");
    }
    Ok(Json(UpdatedResponse { ok: true, modified }))
}

async fn delete_spot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    let id = parse_id(&id)?;
    let deleted = state.db.delete_spot(&id).await?;
    if deleted {
        tracing::info!(spot_id = %id, "Deleted spot");
    }
    Ok(Json(DeletedResponse { deleted }))
}
