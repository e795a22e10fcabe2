// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gear advisory routes.

use crate::error::{AppError, Result};
use crate::models::{Orientation, SpotLocation};
use crate::routes::extract::{parse_id, ApiQuery};
use crate::services::advice::{filter_candidates, sample_crags, HaveGear};
use crate::services::geometry::{latitude_band, rank_by_distance};
use crate::services::{
    material_advice, normalize_grade, normalize_point, partition_spots, summarize_user_gear,
    AdviceScope, GearSummary, MaterialAdvice, SpotPartition,
};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MIN_RADIUS_KM: f64 = 5.0;
const DEFAULT_MATERIAL_RADIUS_KM: f64 = 30.0;
const DEFAULT_SPOTS_RADIUS_KM: f64 = 40.0;
const DEFAULT_SPOTS_LIMIT: usize = 30;
const MAX_SPOTS_LIMIT: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/advice/material", get(material))
        .route("/api/advice/spots", get(spots))
}

/// Advice query. Numbers are kept as text so that an unparseable value
/// behaves like a missing one.
#[derive(Debug, Deserialize)]
pub struct AdviceQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    #[serde(rename = "maxKm")]
    pub max_km: Option<String>,
    pub niveau_min: Option<String>,
    pub exposition: Option<String>,
    pub limit: Option<String>,
}

fn number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl AdviceQuery {
    fn user_id(&self) -> Result<String> {
        parse_id(self.user_id.as_deref().unwrap_or_default())
            .map_err(|_| AppError::bad_request_code("invalid_userId"))
    }

    /// Origin point, if both coordinates parse. Out-of-range coordinates
    /// are an error.
    fn origin(&self) -> Result<Option<SpotLocation>> {
        match (number(self.lng.as_deref()), number(self.lat.as_deref())) {
            (Some(lng), Some(lat)) => normalize_point("Point", &[lng, lat])
                .map(Some)
                .map_err(|e| AppError::bad_request("invalid_coords", e.to_string())),
            _ => Ok(None),
        }
    }

    /// Search radius in km, never below 5.
    fn radius_km(&self, default: f64) -> f64 {
        number(self.max_km.as_deref())
            .unwrap_or(default)
            .max(MIN_RADIUS_KM)
    }
}

async fn load_inventory(state: &AppState, user_id: &str) -> Result<GearSummary> {
    let items = state.db.list_gear_for_owner(user_id, None).await?;
    Ok(summarize_user_gear(&items))
}

/// What to buy next, judged against nearby crags or a random sample.
async fn material(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<AdviceQuery>,
) -> Result<Json<MaterialAdvice>> {
    let user_id = query.user_id()?;
    let origin = query.origin()?;
    let inventory = load_inventory(&state, &user_id).await?;

    let (population, scope) = match origin {
        Some(origin) => {
            let max_km = query.radius_km(DEFAULT_MATERIAL_RADIUS_KM);
            let radius_m = max_km * 1000.0;
            let (min_lat, max_lat) = latitude_band(origin.lat(), radius_m);
            let crags = state
                .db
                .list_spots_in_lat_band(min_lat, max_lat, true)
                .await?;
            let nearby: Vec<_> = rank_by_distance(crags, &origin, radius_m, usize::MAX)
                .into_iter()
                .map(|(spot, _)| spot)
                .collect();
            (nearby, AdviceScope::nearby(max_km))
        }
        None => {
            let crags = state.db.list_crags().await?;
            let sample = sample_crags(crags, &mut rand::thread_rng());
            (sample, AdviceScope::sample())
        }
    };

    tracing::debug!(
        user_id = %user_id,
        analysed = population.len(),
        "Computed material advice"
    );
    Ok(Json(material_advice(inventory, &population, scope)))
}

#[derive(Debug, Serialize)]
pub struct SpotAdviceParams {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "maxKm")]
    pub max_km: f64,
    pub exposition: Option<Vec<Orientation>>,
    pub niveau_min: Option<String>,
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SpotAdviceResponse {
    pub params: SpotAdviceParams,
    pub inventory: HaveGear,
    #[serde(flatten)]
    pub partition: SpotPartition,
}

/// Spot suggestion limit: at most 100, at least 1.
fn spots_limit(raw: Option<&str>) -> usize {
    match number(raw) {
        Some(n) => (n.trunc() as i64).clamp(1, MAX_SPOTS_LIMIT as i64) as usize,
        None => DEFAULT_SPOTS_LIMIT,
    }
}

/// Nearby crags split into compatible, challenge and gear-blocked.
async fn spots(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<AdviceQuery>,
) -> Result<Json<SpotAdviceResponse>> {
    let user_id = query.user_id()?;
    let origin = query
        .origin()?
        .ok_or_else(|| AppError::bad_request_code("invalid_coords"))?;
    let max_km = query.radius_km(DEFAULT_SPOTS_RADIUS_KM);
    let limit = spots_limit(query.limit.as_deref());
    let orientations = query.exposition.as_deref().and_then(Orientation::parse_list);
    let min_grade = query.niveau_min.as_deref().and_then(normalize_grade);

    let inventory = load_inventory(&state, &user_id).await?;

    let radius_m = max_km * 1000.0;
    let (min_lat, max_lat) = latitude_band(origin.lat(), radius_m);
    let crags = state
        .db
        .list_spots_in_lat_band(min_lat, max_lat, true)
        .await?;
    let candidates = filter_candidates(crags, orientations.as_deref());
    let ranked = rank_by_distance(candidates, &origin, radius_m, limit);
    let partition = partition_spots(&inventory, ranked, min_grade);

    tracing::debug!(
        user_id = %user_id,
        compatible = partition.counts.compatible,
        challenge = partition.counts.challenge,
        gear_blocked = partition.counts.gear_blocked,
        "Computed spot suggestions"
    );

    Ok(Json(SpotAdviceResponse {
        params: SpotAdviceParams {
            user_id,
            max_km,
            exposition: orientations,
            niveau_min: query.niveau_min,
            limit,
        },
        inventory: HaveGear {
            rope_m: inventory.rope_m,
            qd_count: inventory.qd_count,
        },
        partition,
    }))
}
