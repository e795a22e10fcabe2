// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Zone de Grimpe: climbing spot directory and gear management
//!
//! This crate provides the backend API for browsing climbing spots,
//! tracking personal climbing gear, and suggesting what to buy or where
//! to climb next.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
