// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gear items owned by users, with lifecycle tracking.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gear category, derived from the free-text category label.
///
/// Labels are matched by lower-cased substring (the labels users type are
/// French, e.g. "Corde à simple", "Dégaines"), so one label can match
/// several categories. [`GearCategory::classify`] picks the first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearCategory {
    Rope,
    Quickdraws,
    Helmet,
    Harness,
    Shoes,
    Carabiners,
    Lanyard,
    Other,
}

impl GearCategory {
    const CLASSIFY_ORDER: [GearCategory; 7] = [
        GearCategory::Rope,
        GearCategory::Quickdraws,
        GearCategory::Helmet,
        GearCategory::Harness,
        GearCategory::Shoes,
        GearCategory::Carabiners,
        GearCategory::Lanyard,
    ];

    /// Substrings of a lower-cased label that select this category.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            GearCategory::Rope => &["corde"],
            GearCategory::Quickdraws => &["dégaine", "degaine"],
            GearCategory::Helmet => &["casque"],
            GearCategory::Harness => &["baudrier"],
            GearCategory::Shoes => &["chausson"],
            GearCategory::Carabiners => &["mousqueton"],
            GearCategory::Lanyard => &["longe", "vache"],
            GearCategory::Other => &[],
        }
    }

    /// Whether an already lower-cased label falls in this category.
    pub fn matches(&self, label_lower: &str) -> bool {
        self.keywords().iter().any(|k| label_lower.contains(k))
    }

    /// Classify a category label. Labels matching nothing are `Other`.
    pub fn classify(label: &str) -> GearCategory {
        let lower = label.to_lowercase();
        Self::CLASSIFY_ORDER
            .into_iter()
            .find(|c| c.matches(&lower))
            .unwrap_or(GearCategory::Other)
    }

    /// Default months between two inspections.
    pub fn inspection_interval_months(&self) -> u32 {
        match self {
            GearCategory::Quickdraws
            | GearCategory::Helmet
            | GearCategory::Harness
            | GearCategory::Carabiners => 12,
            GearCategory::Rope
            | GearCategory::Shoes
            | GearCategory::Lanyard
            | GearCategory::Other => 6,
        }
    }
}

/// Wear state of a gear item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    Good,
    Worn,
    RetireSoon,
    Retired,
}

impl Condition {
    /// Map a client-supplied condition onto the enumeration.
    ///
    /// Legacy "used" becomes `Worn`; any other unknown value becomes `Good`.
    pub fn normalize(raw: &str) -> Condition {
        match raw.trim().to_lowercase().as_str() {
            "new" => Condition::New,
            "good" => Condition::Good,
            "worn" | "used" => Condition::Worn,
            "retire-soon" => Condition::RetireSoon,
            "retired" => Condition::Retired,
            _ => Condition::Good,
        }
    }
}

/// Attributes of a gear item. Numeric fields are absent when the client
/// sent nothing usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GearSpecs {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Rope length in meters
    #[serde(default)]
    pub length_m: Option<f64>,
    /// Number of pieces in a set (quickdraws, carabiners)
    #[serde(default)]
    pub count: Option<f64>,
    /// Older spelling of `count`
    #[serde(default)]
    pub qty: Option<f64>,
    /// Number of locking carabiners
    #[serde(default)]
    pub locking: Option<f64>,
    #[serde(default)]
    pub diameter_mm: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Any other attribute, stringified
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// Number from a JSON number or a numeric string; anything else is absent.
fn json_number(value: &serde_json::Value) -> Option<f64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

impl GearSpecs {
    /// Normalize a free-form specs object sent by a client.
    pub fn from_json(raw: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut specs = GearSpecs::default();
        for (key, value) in raw {
            match key.as_str() {
                "name" => specs.name = json_text(value),
                "brand" => specs.brand = json_text(value),
                "model" => specs.model = json_text(value),
                "length_m" => specs.length_m = json_number(value),
                "count" => specs.count = json_number(value),
                "qty" => specs.qty = json_number(value),
                "locking" => specs.locking = json_number(value),
                "diameter_mm" => specs.diameter_mm = json_number(value),
                "price" => specs.price = json_number(value),
                _ => {
                    if let Some(text) = json_text(value) {
                        specs.extra.insert(key.clone(), text);
                    }
                }
            }
        }
        specs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Mutable lifecycle state of a gear item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub last_inspection_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub next_inspection_at: Option<DateTime<Utc>>,
    /// Set once the item is retired; retired items leave every active aggregate
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub retired_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    /// Fill `next_inspection_at` from `last_inspection_at` if it is missing.
    pub fn schedule_next_inspection(&mut self, category: GearCategory) {
        if self.next_inspection_at.is_none() {
            if let Some(last) = self.last_inspection_at {
                self.next_inspection_at = next_inspection_after(last, category);
            }
        }
    }
}

/// Due date of the inspection following one done at `last`.
pub fn next_inspection_after(last: DateTime<Utc>, category: GearCategory) -> Option<DateTime<Utc>> {
    last.checked_add_months(Months::new(category.inspection_interval_months()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearMeta {
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stored gear item (`User_Materiel` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearItem {
    /// Item ID (also used as document ID)
    pub id: String,
    /// Owning user ID, taken from the session at creation
    pub owner_id: String,
    /// Category label as entered by the owner
    pub category: String,
    #[serde(default)]
    pub specs: GearSpecs,
    #[serde(default)]
    pub purchase: Option<Purchase>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    pub meta: GearMeta,
}

impl GearItem {
    pub fn new(id: String, owner_id: String, category: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            category,
            specs: GearSpecs::default(),
            purchase: None,
            lifecycle: Lifecycle::default(),
            meta: GearMeta {
                created_at: now,
                updated_at: None,
            },
        }
    }

    /// Not retired.
    pub fn is_active(&self) -> bool {
        self.lifecycle.retired_at.is_none()
    }

    pub fn category_kind(&self) -> GearCategory {
        GearCategory::classify(&self.category)
    }

    /// Record an inspection done at `at` and schedule the next one.
    pub fn record_inspection(&mut self, at: DateTime<Utc>) {
        self.lifecycle.last_inspection_at = Some(at);
        self.lifecycle.next_inspection_at = next_inspection_after(at, self.category_kind());
    }

    /// Add `delta` uses (negative to correct), never going below zero.
    pub fn adjust_usage(&mut self, delta: i64) {
        let updated = (self.lifecycle.usage_count as i64).saturating_add(delta);
        self.lifecycle.usage_count = updated.clamp(0, u32::MAX as i64) as u32;
    }

    /// Permanently retire the item.
    pub fn retire(&mut self, at: DateTime<Utc>) {
        self.lifecycle.retired_at = Some(at);
        self.lifecycle.condition = Some(Condition::Retired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classify_by_substring() {
        assert_eq!(GearCategory::classify("Corde à simple"), GearCategory::Rope);
        assert_eq!(GearCategory::classify("Dégaines"), GearCategory::Quickdraws);
        assert_eq!(GearCategory::classify("degaines sport"), GearCategory::Quickdraws);
        assert_eq!(GearCategory::classify("CASQUE"), GearCategory::Helmet);
        assert_eq!(GearCategory::classify("Mousquetons"), GearCategory::Carabiners);
        assert_eq!(GearCategory::classify("Longe"), GearCategory::Lanyard);
        assert_eq!(GearCategory::classify("Vache dynamique"), GearCategory::Lanyard);
        assert_eq!(GearCategory::classify("Baudrier"), GearCategory::Harness);
        assert_eq!(GearCategory::classify("Chaussons"), GearCategory::Shoes);
        assert_eq!(GearCategory::classify("Rope"), GearCategory::Other);
    }

    #[test]
    fn test_specs_from_json() {
        let raw = serde_json::json!({
            "brand": "Beal",
            "length_m": "70",
            "count": 12,
            "qty": "douze",
            "price": null,
            "color": "rouge",
            "dry": true
        });
        let specs = GearSpecs::from_json(raw.as_object().unwrap());

        assert_eq!(specs.brand.as_deref(), Some("Beal"));
        assert_eq!(specs.length_m, Some(70.0));
        assert_eq!(specs.count, Some(12.0));
        assert_eq!(specs.qty, None);
        assert_eq!(specs.price, None);
        assert_eq!(specs.extra.get("color").map(String::as_str), Some("rouge"));
        assert_eq!(specs.extra.get("dry").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_condition_normalize() {
        assert_eq!(Condition::normalize("retire-soon"), Condition::RetireSoon);
        assert_eq!(Condition::normalize("USED"), Condition::Worn);
        assert_eq!(Condition::normalize("shiny"), Condition::Good);
    }

    #[test]
    fn test_record_inspection_uses_category_interval() {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();

        let mut rope = GearItem::new("g1".into(), "u1".into(), "Corde".into(), at);
        rope.record_inspection(at);
        assert_eq!(
            rope.lifecycle.next_inspection_at,
            Some(Utc.with_ymd_and_hms(2025, 7, 31, 12, 0, 0).unwrap())
        );

        let mut helmet = GearItem::new("g2".into(), "u1".into(), "Casque".into(), at);
        helmet.record_inspection(at);
        assert_eq!(
            helmet.lifecycle.next_inspection_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_schedule_keeps_explicit_next_date() {
        let last = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let explicit = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        let mut lifecycle = Lifecycle {
            last_inspection_at: Some(last),
            next_inspection_at: Some(explicit),
            ..Default::default()
        };
        lifecycle.schedule_next_inspection(GearCategory::Rope);
        assert_eq!(lifecycle.next_inspection_at, Some(explicit));

        lifecycle.next_inspection_at = None;
        lifecycle.schedule_next_inspection(GearCategory::Rope);
        assert_eq!(
            lifecycle.next_inspection_at,
            Some(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_usage_never_negative() {
        let now = Utc::now();
        let mut item = GearItem::new("g".into(), "u".into(), "Corde".into(), now);
        item.adjust_usage(3);
        item.adjust_usage(-5);
        assert_eq!(item.lifecycle.usage_count, 0);
        item.adjust_usage(7);
        assert_eq!(item.lifecycle.usage_count, 7);
    }

    #[test]
    fn test_retire() {
        let now = Utc::now();
        let mut item = GearItem::new("g".into(), "u".into(), "Casque".into(), now);
        assert!(item.is_active());
        item.retire(now);
        assert!(!item.is_active());
        assert_eq!(item.lifecycle.condition, Some(Condition::Retired));
    }
}
