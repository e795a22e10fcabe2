// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot text search and creation statistics.

use crate::models::ClimbingSpot;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Score for each query term found among the words of the name.
const NAME_WEIGHT: f64 = 1.0;
/// Score for each query term found among the tags.
const TAG_WEIGHT: f64 = 0.5;

/// Lower-cased alphanumeric words of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextHit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub spot_type: Option<String>,
    pub tags: Vec<String>,
    pub score: f64,
}

/// Relevance of a spot for the given query terms.
pub fn score_spot(spot: &ClimbingSpot, terms: &[String]) -> f64 {
    let name_words = tokenize(&spot.name);
    let tag_words: Vec<Vec<String>> = spot.tags.iter().map(|t| tokenize(t)).collect();

    terms
        .iter()
        .map(|term| {
            let in_name = name_words.iter().filter(|w| *w == term).count() as f64;
            let in_tags = tag_words.iter().filter(|t| t.contains(term)).count() as f64;
            in_name * NAME_WEIGHT + in_tags * TAG_WEIGHT
        })
        .sum()
}

/// Spots matching `query`, best first. Spots that score zero are dropped.
pub fn text_search<'a, I>(spots: I, query: &str, limit: usize) -> Vec<TextHit>
where
    I: IntoIterator<Item = &'a ClimbingSpot>,
{
    let mut terms = tokenize(query);
    terms.sort();
    terms.dedup();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<TextHit> = spots
        .into_iter()
        .filter_map(|spot| {
            let score = score_spot(spot, &terms);
            (score > 0.0).then(|| TextHit {
                id: spot.id.clone(),
                name: spot.name.clone(),
                spot_type: spot.spot_type.clone(),
                tags: spot.tags.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    hits.truncate(limit.min(MAX_SEARCH_LIMIT));
    hits
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`, UTC
    pub month: String,
    pub count: usize,
}

/// Number of spots created per UTC month, oldest month first.
///
/// `from` is inclusive and `to` exclusive.
pub fn creation_series<I>(
    created: I,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<MonthCount>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for at in created {
        if from.is_some_and(|f| at < f) || to.is_some_and(|t| at >= t) {
            continue;
        }
        *months.entry((at.year(), at.month())).or_default() += 1;
    }

    months
        .into_iter()
        .map(|((year, month), count)| MonthCount {
            month: format!("{year:04}-{month:02}"),
            count,
        })
        .collect()
}
