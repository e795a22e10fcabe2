// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.
//!
//! These are the stored document shapes. Request payloads are normalized
//! into them in the route layer, and responses are built from them.

pub mod gear;
pub mod gear_spec;
pub mod spot;
pub mod user;

pub use gear::{Condition, GearCategory, GearItem, GearSpecs, Lifecycle, Purchase};
pub use gear_spec::GearSpec;
pub use spot::{ClimbingSpot, Orientation, SpotLocation};
pub use user::{ClimbingLevel, EmailClaim, Role, User, UserStatus};
