// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gear maintenance reports: inspections coming due and items near the end
//! of their recommended usage.

use crate::models::{GearItem, GearSpec, GearSpecs};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_WITHIN_DAYS: i64 = 30;
pub const MAX_WITHIN_DAYS: i64 = 36_500;
pub const DEFAULT_RETIRE_THRESHOLD: f64 = 0.8;

/// Days ahead to look for due inspections, clamped to [1, 36500].
pub fn within_days(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_WITHIN_DAYS)
        .clamp(1, MAX_WITHIN_DAYS)
}

/// Usage ratio threshold, clamped to [0.1, 0.99].
pub fn retire_threshold(requested: Option<f64>) -> f64 {
    requested
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_RETIRE_THRESHOLD)
        .clamp(0.1, 0.99)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionDue {
    pub id: String,
    pub owner_id: String,
    /// Owner email, if the owner still exists
    pub owner_email: Option<String>,
    pub category: String,
    pub specs: GearSpecs,
    pub usage_count: u32,
    pub last_inspection_at: Option<String>,
    pub next_inspection_at: String,
}

/// Active items whose next inspection is due by `now + days`, soonest
/// first. Overdue items are included; `owner_email` is left empty for
/// [`attach_owner_emails`]. A window past the end of the calendar has no
/// upper bound.
pub fn inspections_due<'a, I>(items: I, now: DateTime<Utc>, days: i64) -> Vec<InspectionDue>
where
    I: IntoIterator<Item = &'a GearItem>,
{
    let until = Duration::try_days(days).and_then(|d| now.checked_add_signed(d));

    let mut due: Vec<(DateTime<Utc>, &GearItem)> = items
        .into_iter()
        .filter(|g| g.is_active())
        .filter_map(|g| g.lifecycle.next_inspection_at.map(|next| (next, g)))
        .filter(|(next, _)| until.is_none_or(|u| *next <= u))
        .collect();
    due.sort_by_key(|(next, _)| *next);

    due.into_iter()
        .map(|(next, g)| InspectionDue {
            id: g.id.clone(),
            owner_id: g.owner_id.clone(),
            owner_email: None,
            category: g.category.clone(),
            specs: g.specs.clone(),
            usage_count: g.lifecycle.usage_count,
            last_inspection_at: g.lifecycle.last_inspection_at.map(format_utc_rfc3339),
            next_inspection_at: format_utc_rfc3339(next),
        })
        .collect()
}

/// Owners of the rows, deduplicated, for the email lookup.
pub fn owner_ids(rows: &[InspectionDue]) -> Vec<String> {
    let mut ids: Vec<String> = rows.iter().map(|r| r.owner_id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Fill in owner emails. Owners missing from `emails` keep `None`.
pub fn attach_owner_emails(rows: &mut [InspectionDue], emails: &HashMap<String, String>) {
    for row in rows {
        row.owner_email = emails.get(&row.owner_id).cloned();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetireSoon {
    pub id: String,
    pub owner_id: String,
    pub category: String,
    pub specs: GearSpecs,
    pub usage_count: u32,
    pub max_usage: u32,
    pub usage_ratio: f64,
}

/// Recommended maximum usage per exact category label.
///
/// The first catalog entry for a category wins, as does a missing or zero
/// maximum (such categories get no ratio at all).
fn max_usage_by_category(catalog: &[GearSpec]) -> HashMap<&str, u32> {
    let mut out: HashMap<&str, Option<u32>> = HashMap::new();
    for spec in catalog {
        out.entry(spec.category.as_str())
            .or_insert(spec.recommended_max_usage);
    }
    out.into_iter()
        .filter_map(|(category, max)| max.filter(|m| *m > 0).map(|m| (category, m)))
        .collect()
}

/// Active items whose `usage / max` meets `threshold`, highest ratio first.
pub fn retire_soon<'a, I>(items: I, catalog: &[GearSpec], threshold: f64) -> Vec<RetireSoon>
where
    I: IntoIterator<Item = &'a GearItem>,
{
    let max_usage = max_usage_by_category(catalog);

    let mut out: Vec<RetireSoon> = items
        .into_iter()
        .filter(|g| g.is_active())
        .filter_map(|g| {
            let max = *max_usage.get(g.category.as_str())?;
            let ratio = g.lifecycle.usage_count as f64 / max as f64;
            (ratio >= threshold).then(|| RetireSoon {
                id: g.id.clone(),
                owner_id: g.owner_id.clone(),
                category: g.category.clone(),
                specs: g.specs.clone(),
                usage_count: g.lifecycle.usage_count,
                max_usage: max,
                usage_ratio: ratio,
            })
        })
        .collect();

    out.sort_by(|a, b| b.usage_ratio.total_cmp(&a.usage_ratio));
    out
}
