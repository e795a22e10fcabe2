// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Climbing spot model and point geometry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rope length assumed for a spot that does not state one (meters).
pub const DEFAULT_REQUIRED_ROPE_M: f64 = 60.0;
/// Quickdraw count assumed for a spot that does not state one.
pub const DEFAULT_REQUIRED_QD: u32 = 12;
/// Spot type used for crags (sport climbing cliffs).
pub const CRAG_TYPE: &str = "falaise";

/// GeoJSON geometry tag. Only points are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
}

/// A GeoJSON Point, `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLocation {
    #[serde(rename = "type")]
    pub kind: GeometryType,
    pub coordinates: [f64; 2],
}

impl SpotLocation {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: GeometryType::Point,
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lng(), self.lat())
    }
}

/// 8-point compass orientation of a crag face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::N,
        Orientation::NE,
        Orientation::E,
        Orientation::SE,
        Orientation::S,
        Orientation::SW,
        Orientation::W,
        Orientation::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::N => "N",
            Orientation::NE => "NE",
            Orientation::E => "E",
            Orientation::SE => "SE",
            Orientation::S => "S",
            Orientation::SW => "SW",
            Orientation::W => "W",
            Orientation::NW => "NW",
        }
    }

    /// Parse a comma-separated list such as `"se, SW"`.
    ///
    /// Unknown entries are dropped. Returns `None` when nothing valid remains,
    /// which callers treat as "no orientation filter".
    pub fn parse_list(input: &str) -> Option<Vec<Orientation>> {
        let mut list: Vec<Orientation> = Vec::new();
        for parsed in input.split(',').filter_map(|s| s.parse::<Orientation>().ok()) {
            if !list.contains(&parsed) {
                list.push(parsed);
            }
        }
        if list.is_empty() {
            None
        } else {
            Some(list)
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown orientation: {0}")]
pub struct UnknownOrientation(pub String);

impl FromStr for Orientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Orientation::ALL
            .into_iter()
            .find(|o| o.as_str() == upper)
            .ok_or_else(|| UnknownOrientation(s.to_string()))
    }
}

/// Where a spot record was imported from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotSource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Stored climbing spot (`climbing_spot` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimbingSpot {
    /// Spot ID (also used as document ID)
    pub id: String,
    /// Identifier from the OpenStreetMap import, if any
    #[serde(default)]
    pub osm_id: Option<String>,
    pub name: String,
    pub location: SpotLocation,
    /// Mirrors `location` latitude so Firestore can range-filter on it
    pub latitude: f64,
    /// Spot type ("falaise", "bloc", ...)
    #[serde(rename = "type", default)]
    pub spot_type: Option<String>,
    #[serde(default)]
    pub soustype: Option<String>,
    #[serde(default)]
    pub niveau_min: Option<String>,
    #[serde(default)]
    pub niveau_max: Option<String>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub grade: Option<String>,
    /// Typical grade of the routes, e.g. "6a+"
    #[serde(default)]
    pub grade_mean: Option<String>,
    /// Precomputed numeric form of `grade_mean`
    #[serde(default)]
    pub grade_mean_num: Option<f64>,
    #[serde(default)]
    pub required_rope_m: Option<f64>,
    #[serde(default)]
    pub required_qd: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub id_voix: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub info_complementaires: Option<String>,
    #[serde(default)]
    pub source: Option<SpotSource>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClimbingSpot {
    /// Create a spot at the given location with every optional field empty.
    pub fn new(id: String, name: String, location: SpotLocation, now: DateTime<Utc>) -> Self {
        Self {
            id,
            osm_id: None,
            name,
            latitude: location.lat(),
            location,
            spot_type: None,
            soustype: None,
            niveau_min: None,
            niveau_max: None,
            orientation: None,
            grade: None,
            grade_mean: None,
            grade_mean_num: None,
            required_rope_m: None,
            required_qd: None,
            tags: Vec::new(),
            id_voix: Vec::new(),
            url: None,
            info: None,
            info_complementaires: None,
            source: None,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn is_crag(&self) -> bool {
        self.spot_type.as_deref() == Some(CRAG_TYPE)
    }

    /// Rope length needed at this spot, defaulting to 60 m.
    pub fn rope_requirement(&self) -> f64 {
        self.required_rope_m.unwrap_or(DEFAULT_REQUIRED_ROPE_M)
    }

    /// Quickdraws needed at this spot, defaulting to 12.
    pub fn quickdraw_requirement(&self) -> u32 {
        self.required_qd.unwrap_or(DEFAULT_REQUIRED_QD)
    }

    /// Numeric grade of the spot, preferring the precomputed value.
    pub fn grade_value(&self) -> Option<f64> {
        self.grade_mean_num.or_else(|| {
            self.grade_mean
                .as_deref()
                .and_then(crate::services::grade::normalize_grade)
        })
    }
}
