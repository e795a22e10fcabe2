// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod advice;
pub mod analytics;
pub mod auth;
pub mod extract;
pub mod gear;
pub mod gear_specs;
pub mod spots;
pub mod users;

use crate::middleware::auth::require_auth;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Response for a created document.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatedResponse {
    pub ok: bool,
    pub id: String,
}

impl CreatedResponse {
    pub fn new(id: String) -> Self {
        Self { ok: true, id }
    }
}

/// Response for a partial update.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdatedResponse {
    pub ok: bool,
    pub modified: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeletedResponse {
    pub deleted: bool,
}

/// One page of a listing.
#[derive(Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub skip: usize,
}

impl<T> Page<T> {
    /// Slice a fully sorted listing.
    pub fn from_sorted(all: Vec<T>, limit: usize, skip: usize) -> Self {
        let total = all.len();
        let items = all.into_iter().skip(skip).take(limit).collect();
        Self {
            items,
            total,
            limit,
            skip,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            skip: self.skip,
        }
    }
}

/// Page size: `default` when absent, clamped to `[1, max]`.
pub fn page_limit(requested: Option<i64>, default: usize, max: usize) -> usize {
    match requested {
        Some(n) => n.clamp(1, max as i64) as usize,
        None => default,
    }
}

/// Offset: negative values count as zero.
pub fn page_skip(requested: Option<i64>) -> usize {
    requested.unwrap_or(0).max(0) as usize
}

/// Trimmed, non-empty text.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .map(|o| config.is_allowed_origin(o))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
        .route("/ping", get(health_check))
        .merge(auth::routes())
        .merge(users::routes())
        .merge(spots::routes())
        .merge(gear_specs::routes())
        .merge(advice::routes())
        .merge(analytics::routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::protected_routes())
        .merge(gear::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit_clamping() {
        assert_eq!(page_limit(None, 20, 200), 20);
        assert_eq!(page_limit(Some(0), 20, 200), 1);
        assert_eq!(page_limit(Some(-3), 20, 200), 1);
        assert_eq!(page_limit(Some(5000), 20, 200), 200);
        assert_eq!(page_skip(Some(-1)), 0);
        assert_eq!(page_skip(None), 0);
    }

    #[test]
    fn test_page_from_sorted() {
        let page = Page::from_sorted((0..10).collect::<Vec<i32>>(), 3, 8);
        assert_eq!(page.items, vec![8, 9]);
        assert_eq!(page.total, 10);

        let page = page.map(|n| n * 2);
        assert_eq!(page.items, vec![16, 18]);
    }
}
