//! Engine diagnostics as structured records.
//!
//! Every notable planning step is mirrored to the `log` facade and
//! recorded as a `Diagnostic` in the engine's event log, so callers and
//! tests can assert on what happened without scraping text.

use crate::{
    analysis::DistributionRow,
    types::{RegionId, ResearcherId, RunId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
}

impl DiagnosticLevel {
    pub fn as_log_level(&self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info  => log::Level::Info,
            Self::Warn  => log::Level::Warn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info  => "info",
            Self::Warn  => "warn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debug" => Some(Self::Debug),
            "info"  => Some(Self::Info),
            "warn"  => Some(Self::Warn),
            _       => None,
        }
    }
}

/// Context payload of a diagnostic.
/// Variants may be appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanEvent {
    // ── Allocator ──────────────────────────────────
    DistributionStarted {
        total_interviews_hint: u32,
        available_researchers: usize,
        regions: usize,
    },
    NoResearchersAvailable {
        total_interviews_hint: u32,
    },
    AssignmentMade {
        researcher_id: ResearcherId,
        region_id: RegionId,
        target_interviews: u32,
        confidence: f64,
    },
    RegionUnderQuota {
        region_id: RegionId,
        unassigned: u32,
    },
    DistributionCompleted {
        assignments: usize,
        total_assigned: u32,
        mean_confidence: f64,
        /// Per-researcher summary of the plan, one row per roster entry.
        table: Vec<DistributionRow>,
    },

    // ── Rebalancer ─────────────────────────────────
    RebalanceSkipped {
        researcher_id: ResearcherId,
        reason: String,
    },
    RebalanceCompleted {
        researcher_id: ResearcherId,
        dropped_assignments: usize,
        redistributed_interviews: u32,
        new_assignments: usize,
    },

    // ── Optimizer ──────────────────────────────────
    EfficiencyUpdated {
        researcher_id: ResearcherId,
        old_efficiency: f64,
        new_efficiency: f64,
    },
    OptimizationCompleted {
        updated_researchers: usize,
        total_interviews_hint: u32,
    },

    // ── Sync ───────────────────────────────────────
    RegionCompleted {
        region_id: RegionId,
        completed_interviews: u32,
        target_interviews: u32,
    },
}

impl PlanEvent {
    /// Stable name, used for the event_type column in the plan log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DistributionStarted { .. }    => "distribution_started",
            Self::NoResearchersAvailable { .. } => "no_researchers_available",
            Self::AssignmentMade { .. }         => "assignment_made",
            Self::RegionUnderQuota { .. }       => "region_under_quota",
            Self::DistributionCompleted { .. }  => "distribution_completed",
            Self::RebalanceSkipped { .. }       => "rebalance_skipped",
            Self::RebalanceCompleted { .. }     => "rebalance_completed",
            Self::EfficiencyUpdated { .. }      => "efficiency_updated",
            Self::OptimizationCompleted { .. }  => "optimization_completed",
            Self::RegionCompleted { .. }        => "region_completed",
        }
    }
}

/// One `{level, message, context}` record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub event: PlanEvent,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>, event: PlanEvent) -> Self {
        Self { level, message: message.into(), event }
    }

    pub fn debug(message: impl Into<String>, event: PlanEvent) -> Self {
        Self::new(DiagnosticLevel::Debug, message, event)
    }

    pub fn info(message: impl Into<String>, event: PlanEvent) -> Self {
        Self::new(DiagnosticLevel::Info, message, event)
    }

    pub fn warn(message: impl Into<String>, event: PlanEvent) -> Self {
        Self::new(DiagnosticLevel::Warn, message, event)
    }

    /// Forward to the `log` facade under the engine's target.
    pub fn emit(&self) {
        log::log!(
            target: "fieldplan::engine",
            self.level.as_log_level(),
            "{} [{}]",
            self.message,
            self.event.type_name()
        );
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub seq: u64,
    pub level: DiagnosticLevel,
    pub event_type: String,
    pub message: String,
    pub payload: String, // JSON-serialized PlanEvent
}
