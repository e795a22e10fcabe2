// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point normalization, bounding boxes and proximity ranking for spots.

use crate::models::{ClimbingSpot, SpotLocation};
use geo::{Coord, Distance, Haversine, Intersects, Rect};

/// Meters per degree of latitude (mean).
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Round a coordinate to 6 decimal places (about 10 cm).
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Errors from geometry validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    #[error("geometry type must be \"Point\", got {0:?}")]
    NotAPoint(String),

    #[error("coordinates must be [lng, lat]")]
    Arity,

    #[error("longitude {0} out of range [-180, 180]")]
    Longitude(f64),

    #[error("latitude {0} out of range [-90, 90]")]
    Latitude(f64),

    #[error("bbox incomplete: give minLng, minLat, maxLng, maxLat or none")]
    IncompleteBbox,
}

fn check_lng(lng: f64) -> Result<f64, GeometryError> {
    if lng.is_finite() && (-180.0..=180.0).contains(&lng) {
        Ok(lng)
    } else {
        Err(GeometryError::Longitude(lng))
    }
}

fn check_lat(lat: f64) -> Result<f64, GeometryError> {
    if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(GeometryError::Latitude(lat))
    }
}

/// Validate a GeoJSON point and round its coordinates.
pub fn normalize_point(kind: &str, coordinates: &[f64]) -> Result<SpotLocation, GeometryError> {
    if kind != "Point" {
        return Err(GeometryError::NotAPoint(kind.to_string()));
    }
    let [lng, lat] = coordinates else {
        return Err(GeometryError::Arity);
    };
    Ok(SpotLocation::new(
        round6(check_lng(*lng)?),
        round6(check_lat(*lat)?),
    ))
}

/// Axis-aligned lng/lat box used to filter spots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Result<Self, GeometryError> {
        let min = Coord {
            x: check_lng(min_lng)?,
            y: check_lat(min_lat)?,
        };
        let max = Coord {
            x: check_lng(max_lng)?,
            y: check_lat(max_lat)?,
        };
        Ok(Self {
            rect: Rect::new(min, max),
        })
    }

    /// Build a box from four optional bounds: all or none.
    pub fn from_parts(
        min_lng: Option<f64>,
        min_lat: Option<f64>,
        max_lng: Option<f64>,
        max_lat: Option<f64>,
    ) -> Result<Option<Self>, GeometryError> {
        match (min_lng, min_lat, max_lng, max_lat) {
            (None, None, None, None) => Ok(None),
            (Some(a), Some(b), Some(c), Some(d)) => Self::new(a, b, c, d).map(Some),
            _ => Err(GeometryError::IncompleteBbox),
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    /// Boundary points count as inside.
    pub fn contains(&self, location: &SpotLocation) -> bool {
        self.rect.intersects(&location.point())
    }
}

/// Latitude band `[min, max]` that contains every point within `radius_m`
/// of `lat`. Used as a coarse store-side filter before exact distances.
pub fn latitude_band(lat: f64, radius_m: f64) -> (f64, f64) {
    let delta = radius_m / METERS_PER_DEGREE_LAT;
    ((lat - delta).max(-90.0), (lat + delta).min(90.0))
}

/// Great-circle distance in meters.
pub fn distance_m(a: &SpotLocation, b: &SpotLocation) -> f64 {
    Haversine.distance(a.point(), b.point())
}

/// Spots within `radius_m` of `origin`, nearest first, with their distance.
pub fn rank_by_distance(
    spots: Vec<ClimbingSpot>,
    origin: &SpotLocation,
    radius_m: f64,
    limit: usize,
) -> Vec<(ClimbingSpot, f64)> {
    let mut ranked: Vec<(ClimbingSpot, f64)> = spots
        .into_iter()
        .map(|spot| {
            let d = distance_m(origin, &spot.location);
            (spot, d)
        })
        .filter(|(_, d)| *d <= radius_m)
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn spot(name: &str, lng: f64, lat: f64) -> ClimbingSpot {
        ClimbingSpot::new(
            name.to_string(),
            name.to_string(),
            SpotLocation::new(lng, lat),
            Utc::now(),
        )
    }

    #[test]
    fn test_normalize_point_rounds_to_six_decimals() {
        let loc = normalize_point("Point", &[2.1234567, 48.7654321]).unwrap();
        assert_eq!(loc.coordinates, [2.123457, 48.765432]);
    }

    #[test]
    fn test_normalize_point_rejects_bad_input() {
        assert_eq!(
            normalize_point("LineString", &[0.0, 0.0]),
            Err(GeometryError::NotAPoint("LineString".to_string()))
        );
        assert_eq!(normalize_point("Point", &[1.0]), Err(GeometryError::Arity));
        assert_eq!(
            normalize_point("Point", &[181.0, 0.0]),
            Err(GeometryError::Longitude(181.0))
        );
        assert_eq!(
            normalize_point("Point", &[0.0, -91.0]),
            Err(GeometryError::Latitude(-91.0))
        );
    }

    #[test]
    fn test_bbox_all_or_nothing() {
        assert_eq!(BoundingBox::from_parts(None, None, None, None), Ok(None));
        assert_eq!(
            BoundingBox::from_parts(Some(1.0), None, Some(2.0), Some(3.0)),
            Err(GeometryError::IncompleteBbox)
        );

        let bbox = BoundingBox::from_parts(Some(2.0), Some(48.0), Some(3.0), Some(49.0))
            .unwrap()
            .unwrap();
        assert!(bbox.contains(&SpotLocation::new(2.5, 48.5)));
        assert!(bbox.contains(&SpotLocation::new(2.0, 48.0)));
        assert!(!bbox.contains(&SpotLocation::new(3.5, 48.5)));
    }

    #[test]
    fn test_rank_by_distance() {
        // Fontainebleau area
        let origin = SpotLocation::new(2.6, 48.4);
        let spots = vec![
            spot("far", 5.37, 43.83),
            spot("near", 2.61, 48.41),
            spot("nearer", 2.6, 48.401),
        ];

        let ranked = rank_by_distance(spots, &origin, 50_000.0, 10);
        let names: Vec<&str> = ranked.iter().map(|(s, _)| s.name.as_str()).collect();
        assert_eq!(names, vec!["nearer", "near"]);
        assert!(ranked[0].1 < 200.0);
    }

    #[test]
    fn test_latitude_band_covers_radius() {
        let (min, max) = latitude_band(45.0, 111_320.0);
        assert!((min - 44.0).abs() < 1e-9);
        assert!((max - 46.0).abs() < 1e-9);

        let (min, max) = latitude_band(89.9, 1_000_000.0);
        assert_eq!(max, 90.0);
        assert!(min < 89.9);
    }
}
