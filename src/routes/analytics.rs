// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maintenance and spot analytics routes.

use crate::error::{AppError, Result};
use crate::routes::extract::ApiQuery;
use crate::services::maintenance::{
    attach_owner_emails, inspections_due, owner_ids, retire_soon, retire_threshold, within_days,
    InspectionDue, RetireSoon,
};
use crate::services::search::{
    creation_series, text_search, MonthCount, TextHit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
use crate::time_utils::{format_utc_rfc3339, parse_client_date};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analytics/gear/inspections/due", get(due_inspections))
        .route("/api/analytics/gear/retire-soon", get(retiring_gear))
        .route("/api/analytics/spots/textsearch", get(spot_text_search))
        .route("/api/analytics/spots/leaderboard", get(spot_leaderboard))
}

fn parsed<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

// ─── Gear Maintenance ────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DueQuery {
    #[serde(rename = "withinDays")]
    pub within_days: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DueResponse {
    #[serde(rename = "withinDays")]
    pub within_days: i64,
    pub count: usize,
    pub items: Vec<InspectionDue>,
}

/// Active gear whose next inspection falls within the window.
async fn due_inspections(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DueQuery>,
) -> Result<Json<DueResponse>> {
    let days = within_days(parsed(query.within_days.as_deref()));

    let gear = state.db.list_all_gear().await?;
    let mut items = inspections_due(&gear, Utc::now(), days);
    let emails = state.db.get_user_emails(owner_ids(&items)).await?;
    attach_owner_emails(&mut items, &emails);

    Ok(Json(DueResponse {
        within_days: days,
        count: items.len(),
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RetireQuery {
    #[serde(rename = "thresholdPct")]
    pub threshold_pct: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RetireResponse {
    #[serde(rename = "thresholdPct")]
    pub threshold_pct: f64,
    pub count: usize,
    pub items: Vec<RetireSoon>,
}

/// Active gear close to the catalog's recommended maximum usage.
async fn retiring_gear(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RetireQuery>,
) -> Result<Json<RetireResponse>> {
    let threshold = retire_threshold(parsed(query.threshold_pct.as_deref()));

    let (gear, catalog) = tokio::try_join!(state.db.list_all_gear(), state.db.list_gear_specs(None))?;
    let items = retire_soon(&gear, &catalog, threshold);

    Ok(Json(RetireResponse {
        threshold_pct: threshold,
        count: items.len(),
        items,
    }))
}

// ─── Spots ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextSearchQuery {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextSearchResponse {
    pub q: String,
    pub count: usize,
    pub items: Vec<TextHit>,
}

/// Rank spots by name and tag relevance.
async fn spot_text_search(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<TextSearchQuery>,
) -> Result<Json<TextSearchResponse>> {
    let q = query.q.as_deref().unwrap_or_default().trim().to_string();
    let limit = parsed::<i64>(query.limit.as_deref())
        .map(|n| n.clamp(1, MAX_SEARCH_LIMIT as i64) as usize)
        .unwrap_or(DEFAULT_SEARCH_LIMIT);

    let items = if q.is_empty() {
        Vec::new()
    } else {
        let spots = state.db.list_spots(None).await?;
        text_search(&spots, &q, limit)
    };

    Ok(Json(TextSearchResponse {
        q,
        count: items.len(),
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub from: Option<String>,
    pub to: Option<String>,
    pub series: Vec<MonthCount>,
}

fn bound(raw: Option<&str>, name: &str) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_client_date(s)
            .map(Some)
            .ok_or_else(|| AppError::bad_request("invalid_query", format!("invalid '{name}' date"))),
        None => Ok(None),
    }
}

/// Spots created per month.
async fn spot_leaderboard(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let from = bound(query.from.as_deref(), "from")?;
    let to = bound(query.to.as_deref(), "to")?;

    let spots = state.db.list_spots(None).await?;
    let series = creation_series(spots.iter().map(|s| s.created_at), from, to);

    Ok(Json(LeaderboardResponse {
        from: from.map(format_utc_rfc3339),
        to: to.map(format_utc_rfc3339),
        series,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(parsed::<i64>(Some(" 14 ")), Some(14));
        assert_eq!(parsed::<i64>(Some("soon")), None);
        assert_eq!(parsed::<f64>(Some("0.5")), Some(0.5));
        assert_eq!(within_days(parsed(Some("-3"))), 1);
    }

    #[test]
    fn test_leaderboard_bounds() {
        assert!(bound(None, "from").unwrap().is_none());
        assert!(bound(Some("2025-01-01"), "from").unwrap().is_some());
        assert_eq!(
            bound(Some("janvier"), "from").unwrap_err().code(),
            "invalid_query"
        );
    }
}
