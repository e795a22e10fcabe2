use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use zone_de_grimpe::models::spot::CRAG_TYPE;
use zone_de_grimpe::models::{ClimbingSpot, GearItem, Orientation, SpotLocation};
use zone_de_grimpe::services::advice::filter_candidates;
use zone_de_grimpe::services::geometry::rank_by_distance;
use zone_de_grimpe::services::{material_advice, partition_spots, summarize_user_gear, AdviceScope};

/// A deterministic grid of crags around Buis-les-Baronnies.
fn crag_grid(count: usize) -> Vec<ClimbingSpot> {
    let grades = ["5c", "6a", "6a+", "6b", "6c+", "7a", "7b+"];
    let now = Utc::now();
    (0..count)
        .map(|i| {
            let lng = 5.27 + (i % 50) as f64 * 0.01;
            let lat = 44.27 + (i / 50) as f64 * 0.01;
            let mut spot = ClimbingSpot::new(
                format!("spot-{i}"),
                format!("Secteur {i}"),
                SpotLocation::new(lng, lat),
                now,
            );
            spot.spot_type = Some(CRAG_TYPE.to_string());
            spot.orientation = Some(Orientation::ALL[i % Orientation::ALL.len()]);
            spot.grade_mean = Some(grades[i % grades.len()].to_string());
            spot.required_rope_m = Some(if i % 3 == 0 { 80.0 } else { 60.0 });
            spot.required_qd = Some(10 + (i % 8) as u32);
            spot
        })
        .collect()
}

fn inventory() -> Vec<GearItem> {
    let now = Utc::now();
    let mut rope = GearItem::new("g1".into(), "u1".into(), "Corde".into(), now);
    rope.specs.length_m = Some(70.0);
    let mut quickdraws = GearItem::new("g2".into(), "u1".into(), "Dégaines".into(), now);
    quickdraws.specs.count = Some(14.0);
    let helmet = GearItem::new("g3".into(), "u1".into(), "Casque".into(), now);
    vec![rope, quickdraws, helmet]
}

fn benchmark_advice(c: &mut Criterion) {
    let crags = crag_grid(2500);
    let summary = summarize_user_gear(&inventory());
    let origin = SpotLocation::new(5.5, 44.4);
    let south = [Orientation::S, Orientation::SE];

    let mut group = c.benchmark_group("advice");

    group.bench_function("material_advice_2500_crags", |b| {
        b.iter(|| {
            material_advice(
                black_box(summary.clone()),
                black_box(&crags),
                AdviceScope::nearby(30.0),
            )
        })
    });

    group.bench_function("spot_partition_40km", |b| {
        b.iter(|| {
            let candidates = filter_candidates(black_box(crags.clone()), Some(&south[..]));
            let ranked = rank_by_distance(candidates, &origin, 40_000.0, 100);
            partition_spots(&summary, ranked, Some(6.0))
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_advice);
criterion_main!(benches);
