//! Scenario files: the snapshot a caller feeds the engine.
//!
//! The engine itself trusts its inputs. Range checks live here, at the
//! boundary where snapshots enter from JSON.

use crate::{
    error::{PlanError, PlanResult},
    model::{Region, Researcher},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Campaign label, shown by the runner.
    #[serde(default)]
    pub name: String,
    /// Campaign deadline, used for quota-risk detection.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub researchers: Vec<Researcher>,
    pub regions: Vec<Region>,
}

impl Scenario {
    pub fn load(path: &str) -> PlanResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> PlanResult<Self> {
        let scenario: Scenario = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Move the deadline to `days` whole days after `now`.
    pub fn set_deadline_in(&mut self, now: DateTime<Utc>, days: i64) {
        self.deadline = Some(now + Duration::days(days));
    }

    /// Sum of remaining need over every region.
    pub fn total_remaining(&self) -> u32 {
        self.regions.iter().map(|r| r.remaining_interviews()).sum()
    }

    pub fn validate(&self) -> PlanResult<()> {
        let mut seen = HashSet::new();
        for r in &self.researchers {
            if !seen.insert(r.id.as_str()) {
                return Err(invalid(format!("duplicate researcher id {}", r.id)));
            }
            if !(0.0..=1.0).contains(&r.efficiency) {
                return Err(invalid(format!(
                    "researcher {} efficiency {} outside [0, 1]",
                    r.id, r.efficiency
                )));
            }
            if !valid_coordinate(r.location.lat, r.location.lng) {
                return Err(invalid(format!("researcher {} has invalid coordinates", r.id)));
            }
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.id.as_str()) {
                return Err(invalid(format!("duplicate region id {}", region.id)));
            }
            if !(1..=5).contains(&region.priority) {
                return Err(invalid(format!(
                    "region {} priority {} outside 1..=5",
                    region.id, region.priority
                )));
            }
            if !(1..=5).contains(&region.difficulty) {
                return Err(invalid(format!(
                    "region {} difficulty {} outside 1..=5",
                    region.id, region.difficulty
                )));
            }
            if !valid_coordinate(region.coordinates.lat, region.coordinates.lng) {
                return Err(invalid(format!("region {} has invalid coordinates", region.id)));
            }
        }
        Ok(())
    }
}

fn valid_coordinate(lat: f64, lng: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

fn invalid(reason: String) -> PlanError {
    PlanError::InvalidScenario { reason }
}
