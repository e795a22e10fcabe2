// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gear advisory: what to buy next, and which crags the current gear allows.
//!
//! Both computations are pure. The route layer fetches the user's gear and
//! the candidate spots, then hands them here.

use crate::models::{ClimbingSpot, Orientation, SpotLocation};
use crate::services::grade::{grade_band, GradeBand};
use crate::services::inventory::GearSummary;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Size of the random crag sample used when no coordinates are given.
pub const SAMPLE_SIZE: usize = 200;

/// Rope length most crags are equipped for.
const VERSATILE_ROPE_M: f64 = 70.0;
/// Quickdraws needed on most sport routes.
const STANDARD_QD: u32 = 12;
/// Locking carabiners needed at an anchor.
const MIN_LOCKING_BINERS: u32 = 2;

/// Which crags the material advice was computed against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdviceScope {
    Nearby {
        nearby: bool,
        #[serde(rename = "maxKm")]
        max_km: f64,
    },
    Sample {
        nearby: bool,
        sample: usize,
    },
}

impl AdviceScope {
    pub fn nearby(max_km: f64) -> Self {
        AdviceScope::Nearby {
            nearby: true,
            max_km,
        }
    }

    pub fn sample() -> Self {
        AdviceScope::Sample {
            nearby: false,
            sample: SAMPLE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaxRequired {
    pub rope_m: Option<f64>,
    pub qd: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Shortfall {
    pub count: usize,
    /// Rounded percentage of analysed spots
    pub pct: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insufficient {
    pub rope: Shortfall,
    pub qd: Shortfall,
}

/// Requirements observed over a population of crags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservedNeeds {
    #[serde(rename = "totalSpotsAnalyses")]
    pub total: usize,
    #[serde(rename = "maxRequired")]
    pub max_required: MaxRequired,
    #[serde(rename = "insuffisant")]
    pub insufficient: Insufficient,
}

/// One piece of advice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: &'static str,
    pub reason: String,
    pub suggestion: String,
}

/// Response body of the material advice endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialAdvice {
    pub scope: AdviceScope,
    #[serde(rename = "summaryInventaire")]
    pub inventory: GearSummary,
    #[serde(rename = "besoinsObserves")]
    pub needs: ObservedNeeds,
    #[serde(rename = "recommandations")]
    pub recommendations: Vec<Recommendation>,
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Compare the inventory against every spot of the population.
pub fn observe_needs(inventory: &GearSummary, spots: &[ClimbingSpot]) -> ObservedNeeds {
    let mut max_rope: f64 = 0.0;
    let mut max_qd: u32 = 0;
    let mut short_rope = 0;
    let mut short_qd = 0;

    for spot in spots {
        let rope = spot.rope_requirement();
        let qd = spot.quickdraw_requirement();
        max_rope = max_rope.max(rope);
        max_qd = max_qd.max(qd);
        if inventory.rope_m < rope {
            short_rope += 1;
        }
        if inventory.qd_count < qd {
            short_qd += 1;
        }
    }

    let total = spots.len();
    ObservedNeeds {
        total,
        max_required: MaxRequired {
            rope_m: (max_rope > 0.0).then_some(max_rope),
            qd: (max_qd > 0).then_some(max_qd),
        },
        insufficient: Insufficient {
            rope: Shortfall {
                count: short_rope,
                pct: percent(short_rope, total),
            },
            qd: Shortfall {
                count: short_qd,
                pct: percent(short_qd, total),
            },
        },
    }
}

/// Ordered recommendations: rope, quickdraws, helmet, lanyard, carabiners.
pub fn recommend(inventory: &GearSummary, needs: &ObservedNeeds) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let max_rope = needs.max_required.rope_m.unwrap_or(0.0);
    let max_qd = needs.max_required.qd.unwrap_or(0);

    if inventory.rope_m < VERSATILE_ROPE_M && max_rope >= VERSATILE_ROPE_M {
        out.push(Recommendation {
            category: "Corde",
            reason: "Beaucoup de falaises autour exigent ≥70 m".to_string(),
            suggestion: "Corde à simple 70 m (≈9.7–9.8mm) pour polyvalence falaise".to_string(),
        });
    } else if inventory.rope_m < max_rope && max_rope > 0.0 {
        out.push(Recommendation {
            category: "Corde",
            reason: format!("Certaines voies demandent {max_rope} m"),
            suggestion: format!("Envisage une corde {max_rope} m pour élargir tes options"),
        });
    }

    if inventory.qd_count < STANDARD_QD && max_qd >= STANDARD_QD {
        out.push(Recommendation {
            category: "Dégaines",
            reason: "La plupart des voies sportives demandent 12–16 dégaines".to_string(),
            suggestion: "Complète ton jeu à 12–16 dégaines".to_string(),
        });
    } else if inventory.qd_count < max_qd && max_qd > 0 {
        out.push(Recommendation {
            category: "Dégaines",
            reason: format!("Des secteurs exigent jusqu’à {max_qd} dégaines"),
            suggestion: format!("Ajoute quelques dégaines pour atteindre {max_qd}"),
        });
    }

    if !inventory.has_helmet {
        out.push(Recommendation {
            category: "Casque",
            reason: "Sécurité pierres/écailles + relais".to_string(),
            suggestion: "Casque léger type 'alpi/esc' (bon maintien et ventilation)".to_string(),
        });
    }
    if !inventory.has_adjustable_lanyard {
        out.push(Recommendation {
            category: "Longe",
            reason: "Confort/manips aux relais".to_string(),
            suggestion: "Longe réglable ou vache en sangle dynamique".to_string(),
        });
    }
    if inventory.locking_biners < MIN_LOCKING_BINERS {
        out.push(Recommendation {
            category: "Mousquetons à vis",
            reason: "Relais & sécurité moulinette".to_string(),
            suggestion: "Avoir au moins 2–3 mousquetons à vis".to_string(),
        });
    }

    out
}

/// Full material advice for an inventory against a crag population.
pub fn material_advice(
    inventory: GearSummary,
    population: &[ClimbingSpot],
    scope: AdviceScope,
) -> MaterialAdvice {
    let needs = observe_needs(&inventory, population);
    let recommendations = recommend(&inventory, &needs);
    MaterialAdvice {
        scope,
        inventory,
        needs,
        recommendations,
    }
}

/// Random sample of at most [`SAMPLE_SIZE`] crags.
pub fn sample_crags<R: Rng + ?Sized>(spots: Vec<ClimbingSpot>, rng: &mut R) -> Vec<ClimbingSpot> {
    let crags: Vec<ClimbingSpot> = spots.into_iter().filter(|s| s.is_crag()).collect();
    if crags.len() <= SAMPLE_SIZE {
        return crags;
    }
    crags.choose_multiple(rng, SAMPLE_SIZE).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HaveGear {
    pub rope_m: f64,
    pub qd_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GearCheck {
    pub ok: bool,
    pub have: HaveGear,
    /// Only present on blocked spots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

/// A candidate crag with the gear check applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotSuggestion {
    pub id: String,
    pub name: String,
    pub dist_m: f64,
    pub orientation: Option<Orientation>,
    pub grade_mean: Option<String>,
    pub grade_mean_num: Option<f64>,
    pub required_rope_m: f64,
    pub required_qd: u32,
    pub gear: GearCheck,
    pub location: SpotLocation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PartitionCounts {
    pub compatible: usize,
    pub challenge: usize,
    pub gear_blocked: usize,
}

/// Candidates split into three disjoint lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpotPartition {
    pub counts: PartitionCounts,
    pub compatible: Vec<SpotSuggestion>,
    pub challenge: Vec<SpotSuggestion>,
    pub gear_blocked: Vec<SpotSuggestion>,
}

/// Keep crags, optionally restricted to the given orientations.
pub fn filter_candidates(
    spots: Vec<ClimbingSpot>,
    orientations: Option<&[Orientation]>,
) -> Vec<ClimbingSpot> {
    spots
        .into_iter()
        .filter(|s| s.is_crag())
        .filter(|s| match orientations {
            Some(list) => s.orientation.is_some_and(|o| list.contains(&o)),
            None => true,
        })
        .collect()
}

/// Partition distance-ranked candidates.
///
/// A spot the gear cannot handle is `gear_blocked` whatever its grade.
/// Otherwise it is `challenge` when its grade lies in (min+0.5, min+0.9],
/// and `compatible` in every other case.
pub fn partition_spots(
    inventory: &GearSummary,
    ranked: Vec<(ClimbingSpot, f64)>,
    min_grade: Option<f64>,
) -> SpotPartition {
    let mut out = SpotPartition::default();

    for (spot, dist_m) in ranked {
        let rope_req = spot.rope_requirement();
        let qd_req = spot.quickdraw_requirement();
        let grade = spot.grade_value();

        let rope_short = inventory.rope_m < rope_req;
        let qd_short = inventory.qd_count < qd_req;
        let ok = !rope_short && !qd_short;

        let mut suggestion = SpotSuggestion {
            id: spot.id,
            name: spot.name,
            dist_m,
            orientation: spot.orientation,
            grade_mean: spot.grade_mean,
            grade_mean_num: grade,
            required_rope_m: rope_req,
            required_qd: qd_req,
            gear: GearCheck {
                ok,
                have: HaveGear {
                    rope_m: inventory.rope_m,
                    qd_count: inventory.qd_count,
                },
                missing: None,
            },
            location: spot.location,
        };

        if !ok {
            let mut missing = Vec::new();
            if rope_short {
                missing.push(format!("Corde {rope_req}m"));
            }
            if qd_short {
                missing.push(format!("Dégaines x{qd_req}"));
            }
            suggestion.gear.missing = Some(missing);
            out.gear_blocked.push(suggestion);
            continue;
        }

        match grade_band(grade, min_grade) {
            GradeBand::Challenge => out.challenge.push(suggestion),
            GradeBand::Match | GradeBand::Any => out.compatible.push(suggestion),
        }
    }

    out.counts = PartitionCounts {
        compatible: out.compatible.len(),
        challenge: out.challenge.len(),
        gear_blocked: out.gear_blocked.len(),
    };
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::spot::CRAG_TYPE;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn crag(id: &str, rope: Option<f64>, qd: Option<u32>, grade: Option<&str>) -> ClimbingSpot {
        let mut s = ClimbingSpot::new(
            id.to_string(),
            format!("Falaise {id}"),
            SpotLocation::new(5.0, 44.0),
            Utc::now(),
        );
        s.spot_type = Some(CRAG_TYPE.to_string());
        s.required_rope_m = rope;
        s.required_qd = qd;
        s.grade_mean = grade.map(str::to_string);
        s
    }

    fn full_kit() -> GearSummary {
        GearSummary {
            rope_m: 80.0,
            qd_count: 16,
            has_helmet: true,
            has_adjustable_lanyard: true,
            locking_biners: 3,
        }
    }

    #[test]
    fn test_short_rope_gets_70m_recommendation() {
        let inventory = GearSummary {
            rope_m: 50.0,
            ..full_kit()
        };
        let spots = vec![crag("a", Some(70.0), None, None), crag("b", None, None, None)];

        let advice = material_advice(inventory, &spots, AdviceScope::sample());

        assert_eq!(advice.needs.max_required.rope_m, Some(70.0));
        assert_eq!(advice.needs.insufficient.rope.count, 2);
        assert_eq!(advice.needs.insufficient.rope.pct, 100);
        assert_eq!(advice.recommendations.len(), 1);
        let rec = &advice.recommendations[0];
        assert_eq!(rec.category, "Corde");
        assert!(rec.suggestion.contains("70 m"));
    }

    #[test]
    fn test_rope_matching_population_max() {
        let inventory = GearSummary {
            rope_m: 50.0,
            ..full_kit()
        };
        let spots = vec![crag("a", Some(60.0), None, None)];
        let recs = recommend(&inventory, &observe_needs(&inventory, &spots));
        assert_eq!(recs[0].category, "Corde");
        assert!(recs[0].reason.contains("60 m"));
    }

    #[test]
    fn test_empty_inventory_gets_every_recommendation() {
        let spots = vec![crag("a", None, None, None)];
        let advice = material_advice(GearSummary::default(), &spots, AdviceScope::nearby(30.0));
        let categories: Vec<&str> = advice.recommendations.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec!["Corde", "Dégaines", "Casque", "Longe", "Mousquetons à vis"]
        );
    }

    #[test]
    fn test_empty_population_reports_nulls() {
        let needs = observe_needs(&full_kit(), &[]);
        assert_eq!(needs.total, 0);
        assert_eq!(needs.max_required, MaxRequired::default());
        assert_eq!(needs.insufficient.rope.pct, 0);
        assert!(recommend(&full_kit(), &needs).is_empty());
    }

    #[test]
    fn test_percentages_are_rounded() {
        let inventory = GearSummary {
            rope_m: 60.0,
            ..full_kit()
        };
        let spots = vec![
            crag("a", Some(80.0), None, None),
            crag("b", None, None, None),
            crag("c", None, None, None),
        ];
        let needs = observe_needs(&inventory, &spots);
        assert_eq!(needs.insufficient.rope.count, 1);
        assert_eq!(needs.insufficient.rope.pct, 33);
    }

    #[test]
    fn test_partition_is_strict() {
        let inventory = GearSummary {
            rope_m: 60.0,
            qd_count: 12,
            ..full_kit()
        };
        let ranked: Vec<(ClimbingSpot, f64)> = vec![
            crag("easy", None, None, Some("6a")),
            crag("hard", None, None, Some("6c")),
            crag("long", Some(80.0), None, Some("6a")),
            crag("steep", None, Some(16), Some("6c")),
            crag("ungraded", None, None, None),
            crag("way-hard", None, None, Some("8a")),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, s)| (s, i as f64 * 100.0))
        .collect();
        let total = ranked.len();

        let p = partition_spots(&inventory, ranked, Some(6.0));

        let ids = |v: &[SpotSuggestion]| v.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&p.compatible), vec!["easy", "ungraded", "way-hard"]);
        assert_eq!(ids(&p.challenge), vec!["hard"]);
        assert_eq!(ids(&p.gear_blocked), vec!["long", "steep"]);
        assert_eq!(
            p.counts.compatible + p.counts.challenge + p.counts.gear_blocked,
            total
        );

        assert_eq!(
            p.gear_blocked[0].gear.missing,
            Some(vec!["Corde 80m".to_string()])
        );
        assert_eq!(
            p.gear_blocked[1].gear.missing,
            Some(vec!["Dégaines x16".to_string()])
        );
        assert!(p.compatible[0].gear.missing.is_none());
    }

    #[test]
    fn test_no_min_grade_means_no_challenge() {
        let ranked = vec![(crag("hard", None, None, Some("6c")), 10.0)];
        let p = partition_spots(&full_kit(), ranked, None);
        assert_eq!(p.counts.compatible, 1);
        assert_eq!(p.counts.challenge, 0);
    }

    #[test]
    fn test_filter_candidates_by_orientation() {
        let mut south = crag("south", None, None, None);
        south.orientation = Some(Orientation::S);
        let mut north = crag("north", None, None, None);
        north.orientation = Some(Orientation::N);
        let unknown = crag("unknown", None, None, None);
        let mut boulder = crag("bloc", None, None, None);
        boulder.spot_type = Some("bloc".to_string());

        let spots = vec![south, north, unknown, boulder];
        assert_eq!(filter_candidates(spots.clone(), None).len(), 3);

        let filtered = filter_candidates(spots, Some(&[Orientation::S, Orientation::SE]));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "south");
    }

    #[test]
    fn test_sample_crags_caps_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let spots: Vec<ClimbingSpot> = (0..250)
            .map(|i| crag(&i.to_string(), None, None, None))
            .collect();
        assert_eq!(sample_crags(spots, &mut rng).len(), SAMPLE_SIZE);

        let few = vec![crag("a", None, None, None)];
        assert_eq!(sample_crags(few, &mut rng).len(), 1);
    }
}
