//! Researcher ↔ region compatibility score.
//!
//! Weighted sum of five normalized components (weights in `ScoreWeights`):
//!   - distance      max(0, 1 − km / cutoff)
//!   - efficiency    researcher.efficiency
//!   - load balance  1 − load / max_load   (1 when every load is zero)
//!   - priority      region.priority / max_priority
//!   - availability  1.0 available, 0.5 busy, 0.0 offline
//!
//! The result is always within [0, 1].

use crate::{
    config::EngineConfig,
    geo::haversine_km,
    model::{Region, Researcher},
};

/// Breakdown of one score, kept for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub distance_km: f64,
    pub distance: f64,
    pub efficiency: f64,
    pub load_balance: f64,
    pub priority: f64,
    pub availability: f64,
    pub total: f64,
}

/// Highest load across the whole roster, offline researchers included.
pub fn max_load(loads: impl IntoIterator<Item = u32>) -> u32 {
    loads.into_iter().max().unwrap_or(0)
}

pub fn score_breakdown(
    researcher: &Researcher,
    load: u32,
    region: &Region,
    max_load: u32,
    config: &EngineConfig,
) -> ScoreBreakdown {
    let w = &config.weights;
    let limits = &config.limits;

    let distance_km = haversine_km(researcher.location, region.coordinates);
    let distance = if limits.distance_cutoff_km > 0.0 {
        unit(1.0 - distance_km / limits.distance_cutoff_km)
    } else {
        0.0
    };

    let efficiency = unit(researcher.efficiency);

    let load_balance = if max_load > 0 {
        unit(1.0 - load as f64 / max_load as f64)
    } else {
        1.0
    };

    let priority = if limits.max_priority > 0 {
        unit(region.priority as f64 / limits.max_priority as f64)
    } else {
        0.0
    };

    let availability = researcher.status.availability_score();

    let total = unit(
        distance * w.distance
            + efficiency * w.efficiency
            + load_balance * w.load_balance
            + priority * w.priority
            + availability * w.availability,
    );

    ScoreBreakdown {
        distance_km,
        distance,
        efficiency,
        load_balance,
        priority,
        availability,
        total,
    }
}

/// Compatibility of `researcher` (carrying `load` interviews) with `region`.
pub fn assignment_score(
    researcher: &Researcher,
    load: u32,
    region: &Region,
    max_load: u32,
    config: &EngineConfig,
) -> f64 {
    score_breakdown(researcher, load, region, max_load, config).total
}

/// Clamp into [0, 1]; NaN collapses to 0.
fn unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::ResearcherStatus, types::GeoPoint};

    fn region_at(lat: f64, lng: f64, priority: u8) -> Region {
        Region::new("z1", "Zona Norte", 40, priority, 3, GeoPoint::new(lat, lng))
    }

    #[test]
    fn colocated_idle_available_researcher_scores_full() {
        let config = EngineConfig::default();
        let r = Researcher::new("r1", "Ana", 1.0, GeoPoint::new(0.0, 0.0), ResearcherStatus::Available);
        let score = assignment_score(&r, 0, &region_at(0.0, 0.0, 5), 0, &config);
        assert!((score - 1.0).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn far_away_researcher_gets_no_distance_credit() {
        let config = EngineConfig::default();
        let r = Researcher::new("r1", "Ana", 0.5, GeoPoint::new(0.0, 0.0), ResearcherStatus::Available);
        // ~111 km north
        let b = score_breakdown(&r, 0, &region_at(1.0, 0.0, 5), 0, &config);
        assert_eq!(b.distance, 0.0);
        assert!(b.distance_km > 100.0);
    }

    #[test]
    fn busiest_researcher_gets_no_load_credit() {
        let config = EngineConfig::default();
        let r = Researcher::new("r1", "Ana", 0.5, GeoPoint::new(0.0, 0.0), ResearcherStatus::Busy);
        let b = score_breakdown(&r, 30, &region_at(0.0, 0.0, 1), 30, &config);
        assert_eq!(b.load_balance, 0.0);
        assert_eq!(b.availability, 0.5);
        assert!((b.priority - 0.2).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_inputs_stay_in_bounds() {
        let config = EngineConfig::default();
        let mut r = Researcher::new("r1", "Ana", 7.5, GeoPoint::new(0.0, 0.0), ResearcherStatus::Available);
        let hi = assignment_score(&r, 0, &region_at(0.0, 0.0, 9), 0, &config);
        assert!((0.0..=1.0).contains(&hi), "got {hi}");

        r.efficiency = f64::NAN;
        let nan = assignment_score(&r, 0, &region_at(0.0, 0.0, 5), 0, &config);
        assert!((0.0..=1.0).contains(&nan), "got {nan}");
    }
}
