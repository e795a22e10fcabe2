// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zone de Grimpe API Server
//!
//! Serves the climbing spot directory, user accounts, personal gear
//! inventories and gear advice over HTTP.

use zone_de_grimpe::{config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Zone de Grimpe API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.firestore_project_id, &config.firestore_database_id).await?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
    });

    // Build router
    let app = zone_de_grimpe::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zone_de_grimpe=debug,info")),
        )
        .with(format)
        .init();
}
