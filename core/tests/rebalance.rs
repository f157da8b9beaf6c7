//! Rebalancing when a researcher's status changes.

use chrono::{TimeZone, Utc};
use fieldplan_core::{
    clock::PlanClock,
    engine::DistributionEngine,
    event::PlanEvent,
    model::{Region, Researcher, ResearcherStatus},
    types::GeoPoint,
};
use std::collections::HashMap;

fn build_engine() -> DistributionEngine {
    let origin = GeoPoint::new(0.0, 0.0);
    let researchers = vec![
        Researcher::new("a", "Ana", 1.0, origin, ResearcherStatus::Available),
        Researcher::new("b", "Bruno", 0.9, origin, ResearcherStatus::Available),
        Researcher::new("c", "Carla", 0.8, origin, ResearcherStatus::Busy),
    ];
    let regions = vec![Region::new("z1", "Centro", 60, 5, 3, origin)];
    DistributionEngine::new(researchers, regions)
        .with_clock(PlanClock::Fixed(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()))
}

#[test]
fn non_offline_change_returns_input_unchanged() {
    let mut engine = build_engine();
    let plan = engine.auto_distribute(60);

    engine.set_researcher_status("b", ResearcherStatus::Busy).unwrap();
    let rebalanced = engine.rebalance_assignments(&plan, "b");

    assert_eq!(rebalanced, plan);
    assert!(matches!(
        engine.events().last().map(|d| &d.event),
        Some(PlanEvent::RebalanceSkipped { .. })
    ));
}

#[test]
fn unknown_researcher_returns_input_unchanged() {
    let mut engine = build_engine();
    let plan = engine.auto_distribute(60);

    let rebalanced = engine.rebalance_assignments(&plan, "nobody");

    assert_eq!(rebalanced, plan);
}

#[test]
fn offline_researcher_quota_is_redistributed() {
    let mut engine = build_engine();
    let plan = engine.auto_distribute(60);

    let dropped: u32 = plan
        .iter()
        .filter(|a| a.researcher_id == "b")
        .map(|a| a.target_interviews)
        .sum();
    assert!(dropped > 0, "b should hold quota before going offline: {plan:?}");

    engine.set_researcher_status("b", ResearcherStatus::Offline).unwrap();
    let rebalanced = engine.rebalance_assignments(&plan, "b");

    let kept: Vec<_> = plan.iter().filter(|a| a.researcher_id != "b").cloned().collect();
    assert_eq!(&rebalanced[..kept.len()], &kept[..], "Kept assignments must lead, unchanged");

    let replacements = &rebalanced[kept.len()..];
    assert!(!replacements.is_empty(), "Dropped quota should be re-planned");
    assert!(
        rebalanced.iter().all(|a| a.researcher_id != "b"),
        "Offline researcher still present: {rebalanced:?}"
    );

    let completed = engine
        .events()
        .iter()
        .find_map(|d| match &d.event {
            PlanEvent::RebalanceCompleted { redistributed_interviews, new_assignments, .. } => {
                Some((*redistributed_interviews, *new_assignments))
            }
            _ => None,
        })
        .expect("rebalance_completed recorded");
    assert_eq!(completed, (dropped, replacements.len()));
}

#[test]
fn rebalance_does_not_credit_completed_work() {
    let mut engine = build_engine();
    let plan = engine.auto_distribute(60);

    engine.set_researcher_status("b", ResearcherStatus::Offline).unwrap();
    engine.rebalance_assignments(&plan, "b");

    assert_eq!(engine.regions()[0].completed_interviews, 0);
}

#[test]
fn status_change_for_unknown_researcher_errors() {
    let mut engine = build_engine();
    let err = engine
        .set_researcher_status("ghost", ResearcherStatus::Offline)
        .unwrap_err();
    assert!(err.to_string().contains("ghost"), "Unexpected error: {err}");
}

/// Synced completion counts only ever move forward.
#[test]
fn completed_counts_are_monotonic() {
    let mut engine = build_engine();

    let forward: HashMap<String, u32> = [("z1".to_string(), 25u32)].into_iter().collect();
    assert_eq!(engine.record_completed(&forward).changed, 1);
    assert_eq!(engine.regions()[0].completed_interviews, 25);

    let backward: HashMap<String, u32> = [("z1".to_string(), 10u32)].into_iter().collect();
    assert_eq!(engine.record_completed(&backward).changed, 0);
    assert_eq!(engine.regions()[0].completed_interviews, 25);

    // 35 left: a takes min(35, 20, 50) capped at ceil(35 / 2) = 18
    let plan = engine.auto_distribute(35);
    assert_eq!(plan[0].researcher_id, "a");
    assert_eq!(plan[0].target_interviews, 18);
}
