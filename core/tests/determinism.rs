//! Two engines, same snapshots, same clock.
//! They must produce identical plans and identical diagnostics.
//! Any divergence is a blocker.

use chrono::{TimeZone, Utc};
use fieldplan_core::{
    clock::PlanClock,
    engine::DistributionEngine,
    model::{Region, Researcher, ResearcherStatus},
    types::GeoPoint,
};
use std::collections::HashMap;

fn fixed_clock() -> PlanClock {
    PlanClock::Fixed(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap())
}

fn roster() -> Vec<Researcher> {
    vec![
        Researcher::new("r-01", "Ana", 0.92, GeoPoint::new(-23.5505, -46.6333), ResearcherStatus::Available),
        Researcher::new("r-02", "Bruno", 0.78, GeoPoint::new(-23.4810, -46.6110), ResearcherStatus::Available).with_load(12),
        Researcher::new("r-03", "Carla", 0.65, GeoPoint::new(-23.6450, -46.7280), ResearcherStatus::Busy).with_load(5),
        Researcher::new("r-04", "Diego", 0.85, GeoPoint::new(-23.5400, -46.4700), ResearcherStatus::Available).with_load(30),
        Researcher::new("r-05", "Elisa", 0.70, GeoPoint::new(-23.6000, -46.6600), ResearcherStatus::Offline),
    ]
}

fn regions() -> Vec<Region> {
    vec![
        Region::new("z-centro", "Centro", 60, 4, 2, GeoPoint::new(-23.5489, -46.6388)).with_completed(20),
        Region::new("z-norte", "Zona Norte", 80, 5, 3, GeoPoint::new(-23.4800, -46.6200)).with_completed(10),
        Region::new("z-sul", "Zona Sul", 70, 3, 4, GeoPoint::new(-23.6500, -46.7000)).with_completed(45),
        Region::new("z-leste", "Zona Leste", 50, 2, 3, GeoPoint::new(-23.5450, -46.4800)).with_completed(50),
    ]
}

fn build_engine() -> DistributionEngine {
    DistributionEngine::new(roster(), regions()).with_clock(fixed_clock())
}

#[test]
fn same_inputs_produce_identical_plans() {
    let mut engine_a = build_engine();
    let mut engine_b = build_engine();

    let plan_a = engine_a.auto_distribute(165);
    let plan_b = engine_b.auto_distribute(165);

    assert!(!plan_a.is_empty(), "Expected a non-empty plan");
    assert_eq!(plan_a, plan_b, "Plans diverged for identical inputs");

    let json_a = serde_json::to_string(&plan_a).unwrap();
    let json_b = serde_json::to_string(&plan_b).unwrap();
    assert_eq!(json_a, json_b);

    assert_eq!(engine_a.events(), engine_b.events(), "Diagnostics diverged");
    assert_eq!(engine_a.researchers(), engine_b.researchers(), "Roster loads diverged");
}

/// Without a reset, load accumulates and each call plans less.
#[test]
fn repeated_calls_accumulate_load() {
    let researchers = vec![
        Researcher::new("r-01", "Ana", 1.0, GeoPoint::new(0.0, 0.0), ResearcherStatus::Available),
    ];
    let regions = vec![Region::new("z1", "Centro", 100, 5, 3, GeoPoint::new(0.0, 0.0))];
    let mut engine = DistributionEngine::new(researchers, regions).with_clock(fixed_clock());

    let totals: Vec<u32> = (0..4)
        .map(|_| engine.auto_distribute(100).iter().map(|a| a.target_interviews).sum())
        .collect();

    // cap floor(1.0 × 20) = 20 per call until the 50-load ceiling bites
    assert_eq!(totals, vec![20, 20, 10, 0]);
    assert_eq!(engine.researchers()[0].current_load, 50);
}

#[test]
fn resetting_loads_restores_the_first_plan() {
    let mut engine = build_engine();
    let baselines: HashMap<String, u32> = roster().into_iter().map(|r| (r.id, r.current_load)).collect();

    let first = engine.auto_distribute(165);
    engine.reset_loads(&baselines);
    let again = engine.auto_distribute(165);

    assert_eq!(first, again, "Same epoch baseline should reproduce the plan");
}
