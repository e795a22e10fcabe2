// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use std::sync::Arc;
use zone_de_grimpe::config::Config;
use zone_de_grimpe::db::FirestoreDb;
use zone_de_grimpe::middleware::auth::create_jwt;
use zone_de_grimpe::routes::create_router;
use zone_de_grimpe::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project", "(default)")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app with an offline database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: FirestoreDb::new_mock(),
    });
    (create_router(state.clone()), state)
}

/// Create a test app backed by the emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: test_db().await,
    });
    (create_router(state.clone()), state)
}

/// Create a session token for a user ID.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key).expect("Failed to create JWT")
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
