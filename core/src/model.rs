//! Researchers, regions and the assignments the engine hands back.
//!
//! Researchers and regions are snapshots supplied by the caller on every
//! engine construction. Assignments are immutable values produced per call.

use crate::types::{GeoPoint, RegionId, ResearcherId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResearcherStatus {
    Available,
    Busy,
    Offline,
}

impl ResearcherStatus {
    pub fn availability_score(&self) -> f64 {
        match self {
            Self::Available => 1.0,
            Self::Busy      => 0.5,
            Self::Offline   => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy      => "busy",
            Self::Offline   => "offline",
        }
    }
}

/// A field researcher as seen by the planner.
/// - `efficiency`: productivity proxy in [0, 1], smoothed by the optimizer.
/// - `current_load`: interviews already assigned across all regions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Researcher {
    pub id: ResearcherId,
    pub name: String,
    pub efficiency: f64,
    #[serde(default)]
    pub current_load: u32,
    /// Topic tags. Not used in scoring yet.
    #[serde(default)]
    pub expertise: Vec<String>,
    pub location: GeoPoint,
    pub status: ResearcherStatus,
}

impl Researcher {
    pub fn new(
        id: impl Into<ResearcherId>,
        name: impl Into<String>,
        efficiency: f64,
        location: GeoPoint,
        status: ResearcherStatus,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            efficiency,
            current_load: 0,
            expertise: Vec::new(),
            location,
            status,
        }
    }

    pub fn with_load(mut self, current_load: u32) -> Self {
        self.current_load = current_load;
        self
    }

    /// Offline researchers never receive new work.
    pub fn is_assignable(&self) -> bool {
        self.status != ResearcherStatus::Offline
    }
}

/// A geographic subdivision with its own interview quota.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub target_interviews: u32,
    #[serde(default)]
    pub completed_interviews: u32,
    /// 1–5, higher = more urgent.
    pub priority: u8,
    /// 1–5, higher = slower fieldwork.
    pub difficulty: u8,
    pub coordinates: GeoPoint,
}

impl Region {
    pub fn new(
        id: impl Into<RegionId>,
        name: impl Into<String>,
        target_interviews: u32,
        priority: u8,
        difficulty: u8,
        coordinates: GeoPoint,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_interviews,
            completed_interviews: 0,
            priority,
            difficulty,
            coordinates,
        }
    }

    pub fn with_completed(mut self, completed_interviews: u32) -> Self {
        self.completed_interviews = completed_interviews;
        self
    }

    /// Interviews still needed. Zero once the target is met or exceeded.
    pub fn remaining_interviews(&self) -> u32 {
        self.target_interviews.saturating_sub(self.completed_interviews)
    }

    /// Completed / target. A region with no target counts as complete.
    pub fn completion_ratio(&self) -> f64 {
        if self.target_interviews == 0 {
            return 1.0;
        }
        self.completed_interviews as f64 / self.target_interviews as f64
    }

    /// Sort key for the allocator: high priority and far from target first.
    pub fn urgency(&self) -> f64 {
        self.priority as f64 * (1.0 - self.completion_ratio())
    }
}

/// One quota granted to one researcher in one region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub researcher_id: ResearcherId,
    pub region_id: RegionId,
    pub target_interviews: u32,
    pub estimated_completion: DateTime<Utc>,
    /// Scorer output in [0, 1]. A plan-quality indicator, not a probability.
    pub confidence: f64,
}

/// Total planned interviews across a list of assignments.
pub fn total_planned(assignments: &[Assignment]) -> u32 {
    assignments.iter().map(|a| a.target_interviews).sum()
}

/// Mean confidence across a list of assignments, 0 when empty.
pub fn mean_confidence(assignments: &[Assignment]) -> f64 {
    if assignments.is_empty() {
        return 0.0;
    }
    assignments.iter().map(|a| a.confidence).sum::<f64>() / assignments.len() as f64
}
