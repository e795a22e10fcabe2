// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.
//!
//! Everything here is synchronous and storage-agnostic; handlers load the
//! documents and pass them in.

pub mod advice;
pub mod geometry;
pub mod grade;
pub mod inventory;
pub mod maintenance;
pub mod password;
pub mod search;

pub use advice::{material_advice, partition_spots, AdviceScope, MaterialAdvice, SpotPartition};
pub use geometry::{normalize_point, BoundingBox, GeometryError};
pub use grade::normalize_grade;
pub use inventory::{summarize_user_gear, GearSummary};
