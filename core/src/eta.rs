//! Completion-time estimate for one assignment.

use crate::{
    config::EtaModel,
    model::{Region, Researcher},
};
use chrono::{DateTime, Duration, Utc};

/// Minutes of fieldwork (buffer included) for `interviews` in `region`.
/// Lower efficiency and higher difficulty both inflate the per-interview time.
pub fn estimated_minutes(
    researcher: &Researcher,
    interviews: u32,
    region: &Region,
    model: &EtaModel,
) -> f64 {
    let adjusted = model.base_minutes_per_interview
        * (2.0 - researcher.efficiency)
        * (region.difficulty as f64 / model.difficulty_pivot);
    interviews as f64 * adjusted * model.buffer_factor
}

pub fn estimated_completion(
    now: DateTime<Utc>,
    researcher: &Researcher,
    interviews: u32,
    region: &Region,
    model: &EtaModel,
) -> DateTime<Utc> {
    let minutes = estimated_minutes(researcher, interviews, region, model);
    let millis = (minutes * 60_000.0).round();
    if !millis.is_finite() || millis <= 0.0 {
        return now;
    }
    // Out-of-range inputs can push past chrono's range; saturate there.
    let span = Duration::milliseconds(millis.min(i64::MAX as f64) as i64);
    now.checked_add_signed(span).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResearcherStatus;
    use crate::types::GeoPoint;
    use chrono::TimeZone;

    fn at_origin() -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    #[test]
    fn perfect_researcher_on_pivot_difficulty() {
        let r = Researcher::new("r1", "Ana", 1.0, at_origin(), ResearcherStatus::Available);
        let region = Region::new("z1", "Centro", 10, 3, 3, at_origin());
        // 10 × 15 × 1.0 × 1.0 × 1.2
        let minutes = estimated_minutes(&r, 10, &region, &EtaModel::default());
        assert!((minutes - 180.0).abs() < 1e-9, "got {minutes}");
    }

    #[test]
    fn slow_researcher_in_hard_region_takes_longer() {
        let r = Researcher::new("r1", "Bia", 0.5, at_origin(), ResearcherStatus::Available);
        let region = Region::new("z1", "Periferia", 10, 3, 5, at_origin());
        // 10 × 15 × 1.5 × (5/3) × 1.2 = 450
        let minutes = estimated_minutes(&r, 10, &region, &EtaModel::default());
        assert!((minutes - 450.0).abs() < 1e-9, "got {minutes}");
    }

    #[test]
    fn completion_is_now_plus_minutes() {
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let r = Researcher::new("r1", "Ana", 1.0, at_origin(), ResearcherStatus::Available);
        let region = Region::new("z1", "Centro", 10, 3, 3, at_origin());
        let done = estimated_completion(now, &r, 10, &region, &EtaModel::default());
        assert_eq!(done, Utc.with_ymd_and_hms(2024, 9, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn absurd_efficiency_saturates_instead_of_panicking() {
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        let r = Researcher::new("r1", "Ana", -1e15, at_origin(), ResearcherStatus::Available);
        let region = Region::new("z1", "Centro", 10, 3, 3, at_origin());
        let done = estimated_completion(now, &r, 10, &region, &EtaModel::default());
        assert_eq!(done, DateTime::<Utc>::MAX_UTC);
    }
}
