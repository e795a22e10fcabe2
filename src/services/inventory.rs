// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregation of a user's active gear into a fixed-shape summary.

use crate::models::{GearCategory, GearItem};
use serde::Serialize;

/// What a climber currently owns, as far as route requirements go.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GearSummary {
    /// Longest rope owned (meters); ropes are not additive
    pub rope_m: f64,
    /// Total quickdraws across all quickdraw sets
    pub qd_count: u32,
    #[serde(rename = "hasHelmet")]
    pub has_helmet: bool,
    #[serde(rename = "hasAdjustableLanyard")]
    pub has_adjustable_lanyard: bool,
    /// Total locking carabiners
    #[serde(rename = "lockingBiners")]
    pub locking_biners: u32,
}

/// Non-negative numeric spec value; missing or unusable values count as 0.
fn amount(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Whole pieces in a set; fractions are dropped and huge values saturate.
fn pieces(value: Option<f64>) -> u32 {
    amount(value).floor() as u32
}

/// Summarize the non-retired items of an inventory.
///
/// Each category test is an independent substring match on the lower-cased
/// label, so a label such as "Longe + mousqueton" counts for both.
pub fn summarize_user_gear<'a, I>(items: I) -> GearSummary
where
    I: IntoIterator<Item = &'a GearItem>,
{
    let mut summary = GearSummary::default();

    for item in items.into_iter().filter(|g| g.is_active()) {
        let label = item.category.to_lowercase();
        let specs = &item.specs;

        if GearCategory::Rope.matches(&label) {
            summary.rope_m = summary.rope_m.max(amount(specs.length_m));
        }
        if GearCategory::Quickdraws.matches(&label) {
            summary.qd_count = summary
                .qd_count
                .saturating_add(pieces(specs.count.or(specs.qty)));
        }
        if GearCategory::Helmet.matches(&label) {
            summary.has_helmet = true;
        }
        if GearCategory::Lanyard.matches(&label) {
            summary.has_adjustable_lanyard = true;
        }
        if GearCategory::Carabiners.matches(&label) {
            summary.locking_biners = summary
                .locking_biners
                .saturating_add(pieces(specs.locking.or(specs.count).or(specs.qty)));
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GearSpecs;
    use chrono::Utc;

    fn item(category: &str, specs: GearSpecs) -> GearItem {
        let mut g = GearItem::new(
            uuid::Uuid::new_v4().to_string(),
            "owner".to_string(),
            category.to_string(),
            Utc::now(),
        );
        g.specs = specs;
        g
    }

    #[test]
    fn test_summary_takes_longest_rope_and_sums_quickdraws() {
        let items = vec![
            item(
                "Corde",
                GearSpecs {
                    length_m: Some(60.0),
                    ..Default::default()
                },
            ),
            item(
                "Corde à simple",
                GearSpecs {
                    length_m: Some(80.0),
                    ..Default::default()
                },
            ),
            item(
                "Dégaines",
                GearSpecs {
                    count: Some(8.0),
                    ..Default::default()
                },
            ),
            item(
                "degaines alpi",
                GearSpecs {
                    qty: Some(4.0),
                    ..Default::default()
                },
            ),
            item("Casque", GearSpecs::default()),
        ];

        let summary = summarize_user_gear(&items);
        assert_eq!(summary.rope_m, 80.0);
        assert_eq!(summary.qd_count, 12);
        assert!(summary.has_helmet);
        assert!(!summary.has_adjustable_lanyard);
        assert_eq!(summary.locking_biners, 0);
    }

    #[test]
    fn test_retired_items_are_excluded_from_every_field() {
        let now = Utc::now();
        let mut items = vec![
            item(
                "Corde",
                GearSpecs {
                    length_m: Some(70.0),
                    ..Default::default()
                },
            ),
            item(
                "Dégaines",
                GearSpecs {
                    count: Some(12.0),
                    ..Default::default()
                },
            ),
            item("Casque", GearSpecs::default()),
            item("Longe", GearSpecs::default()),
            item(
                "Mousquetons",
                GearSpecs {
                    locking: Some(3.0),
                    ..Default::default()
                },
            ),
        ];
        for g in &mut items {
            g.retire(now);
        }

        assert_eq!(summarize_user_gear(&items), GearSummary::default());
    }

    #[test]
    fn test_label_can_count_in_several_categories() {
        let items = vec![item(
            "Longe + mousqueton",
            GearSpecs {
                count: Some(2.0),
                ..Default::default()
            },
        )];

        let summary = summarize_user_gear(&items);
        assert!(summary.has_adjustable_lanyard);
        assert_eq!(summary.locking_biners, 2);
    }

    #[test]
    fn test_missing_numbers_count_as_zero() {
        let items = vec![
            item("Corde", GearSpecs::default()),
            item(
                "Dégaines",
                GearSpecs {
                    count: Some(f64::NAN),
                    ..Default::default()
                },
            ),
        ];

        let summary = summarize_user_gear(&items);
        assert_eq!(summary.rope_m, 0.0);
        assert_eq!(summary.qd_count, 0);
    }

    #[test]
    fn test_counts_are_whole_pieces() {
        let items = vec![
            item(
                "Dégaines",
                GearSpecs {
                    count: Some(8.7),
                    ..Default::default()
                },
            ),
            item(
                "Dégaines",
                GearSpecs {
                    count: Some(1e12),
                    ..Default::default()
                },
            ),
        ];

        let summary = summarize_user_gear(&items);
        assert_eq!(summary.qd_count, u32::MAX);

        let json = serde_json::to_value(summarize_user_gear(&items[..1])).unwrap();
        assert_eq!(json["qd_count"], serde_json::json!(8));
        assert_eq!(json["lockingBiners"], serde_json::json!(0));
    }
}
