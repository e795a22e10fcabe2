// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gear catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog entry (`Materiel_Specs` collection).
///
/// `recommended_max_usage` is what the retire-soon report compares usage
/// counts against, matched on exact `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearSpec {
    pub id: String,
    pub category: String,
    pub brand: String,
    pub model: String,
    #[serde(rename = "type", default)]
    pub spec_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recommended_max_usage: Option<u32>,
    #[serde(default)]
    pub inspection_interval_months: Option<u32>,
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}
