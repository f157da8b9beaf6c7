//! The distribution engine: planning core of the field survey.
//!
//! ENTRY POINTS:
//!   - auto_distribute       full plan from current researcher/region state
//!   - rebalance_assignments drop an offline researcher's quota and re-plan it
//!   - optimize_assignments  fold performance feedback into efficiency, re-plan
//!
//! RULES:
//!   - Calls are synchronous and run to completion. `&mut self` gives one
//!     call exclusive use of the roster.
//!   - Load grants go through a `LoadLedger` and land on the roster only
//!     after the allocator returns.
//!   - Ordinary data conditions never error. They show up in the event log.
//!   - No state survives between calls except the roster the caller fed in.

use crate::{
    allocator::{distribute, Allocation},
    clock::PlanClock,
    config::EngineConfig,
    error::{PlanError, PlanResult},
    event::{Diagnostic, PlanEvent},
    model::{total_planned, Assignment, Region, Researcher, ResearcherStatus},
    types::RegionId,
};
use std::collections::HashMap;

/// Outcome of one completed-count sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSync {
    /// Regions whose count moved forward.
    pub changed: usize,
    /// Regions that reached their target with this sync, in region order.
    pub reached_target: Vec<RegionId>,
}

pub struct DistributionEngine {
    researchers: Vec<Researcher>,
    regions:     Vec<Region>,
    config:      EngineConfig,
    clock:       PlanClock,
    events:      Vec<Diagnostic>,
}

impl DistributionEngine {
    /// Engine over fresh snapshots with default config and the wall clock.
    pub fn new(researchers: Vec<Researcher>, regions: Vec<Region>) -> Self {
        Self {
            researchers,
            regions,
            config: EngineConfig::default(),
            clock:  PlanClock::System,
            events: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: PlanClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn researchers(&self) -> &[Researcher] { &self.researchers }
    pub fn regions(&self) -> &[Region] { &self.regions }
    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn clock(&self) -> PlanClock { self.clock }

    pub fn researcher(&self, id: &str) -> Option<&Researcher> {
        self.researchers.iter().find(|r| r.id == id)
    }

    /// Give the roster and regions back to the caller.
    pub fn into_parts(self) -> (Vec<Researcher>, Vec<Region>) {
        (self.researchers, self.regions)
    }

    // ── Event log ──────────────────────────────────────────────

    /// Diagnostics recorded since construction or the last take.
    pub fn events(&self) -> &[Diagnostic] { &self.events }

    pub fn take_events(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.events.push(diagnostic);
    }

    // ── Collaborator hooks ─────────────────────────────────────

    /// Status change observed by the caller (geolocation / presence feed).
    pub fn set_researcher_status(
        &mut self,
        researcher_id: &str,
        status: ResearcherStatus,
    ) -> PlanResult<()> {
        let researcher = self
            .researchers
            .iter_mut()
            .find(|r| r.id == researcher_id)
            .ok_or_else(|| PlanError::ResearcherNotFound { id: researcher_id.to_string() })?;
        log::debug!(
            "researcher {researcher_id} status {} -> {}",
            researcher.status.as_str(),
            status.as_str()
        );
        researcher.status = status;
        Ok(())
    }

    /// Start a fresh planning epoch from the caller's true baselines.
    /// Ids missing from `baselines` are reset to zero.
    pub fn reset_loads(&mut self, baselines: &HashMap<String, u32>) {
        for researcher in &mut self.researchers {
            researcher.current_load = baselines.get(&researcher.id).copied().unwrap_or(0);
        }
    }

    /// Completed counts pushed by the sync layer. Never moves a count backwards.
    /// Each region that crosses its target here is recorded as `RegionCompleted`.
    pub fn record_completed(&mut self, completed: &HashMap<String, u32>) -> CompletionSync {
        let mut sync = CompletionSync::default();
        let mut reached = Vec::new();
        for region in &mut self.regions {
            let Some(&count) = completed.get(&region.id) else {
                continue;
            };
            if count <= region.completed_interviews {
                continue;
            }
            let was_done = region.completed_interviews >= region.target_interviews;
            region.completed_interviews = count;
            sync.changed += 1;
            if !was_done && region.target_interviews > 0 && count >= region.target_interviews {
                reached.push(Diagnostic::info(
                    format!("region {} reached its target of {}", region.id, region.target_interviews),
                    PlanEvent::RegionCompleted {
                        region_id: region.id.clone(),
                        completed_interviews: count,
                        target_interviews: region.target_interviews,
                    },
                ));
                sync.reached_target.push(region.id.clone());
            }
        }
        for diagnostic in reached {
            self.record(diagnostic);
        }
        sync
    }

    // ── Planning ───────────────────────────────────────────────

    /// Plan every region with remaining need.
    ///
    /// `total_interviews` is a hint for logs. It does not cap the plan;
    /// each region's remaining need does. Researcher loads grow by what
    /// was granted, so a second call without `reset_loads` is less generous.
    pub fn auto_distribute(&mut self, total_interviews: u32) -> Vec<Assignment> {
        let now = self.clock.now();
        let Allocation { assignments, ledger, diagnostics } =
            distribute(&self.researchers, &self.regions, total_interviews, now, &self.config);

        for diagnostic in diagnostics {
            self.record(diagnostic);
        }
        ledger.apply_to(&mut self.researchers);
        assignments
    }

    /// React to a status change of `changed_researcher_id`.
    ///
    /// Unknown or still-assignable researcher: the input comes back unchanged.
    /// Offline: their assignments are dropped and the dropped quota is re-planned
    /// across everyone else. Work they already completed is not credited back.
    pub fn rebalance_assignments(
        &mut self,
        assignments: &[Assignment],
        changed_researcher_id: &str,
    ) -> Vec<Assignment> {
        let status = self.researcher(changed_researcher_id).map(|r| r.status);
        let reason = match status {
            None                            => Some("unknown researcher"),
            Some(ResearcherStatus::Offline) => None,
            Some(_)                         => Some("researcher is not offline"),
        };
        if let Some(reason) = reason {
            self.record(Diagnostic::debug(
                format!("rebalance skipped for {changed_researcher_id}: {reason}"),
                PlanEvent::RebalanceSkipped {
                    researcher_id: changed_researcher_id.to_string(),
                    reason: reason.to_string(),
                },
            ));
            return assignments.to_vec();
        }

        let (dropped, kept): (Vec<Assignment>, Vec<Assignment>) = assignments
            .iter()
            .cloned()
            .partition(|a| a.researcher_id == changed_researcher_id);
        let to_redistribute = total_planned(&dropped);

        let replacements = self.auto_distribute(to_redistribute);

        self.record(Diagnostic::info(
            format!(
                "redistributed {to_redistribute} interviews after {changed_researcher_id} went offline"
            ),
            PlanEvent::RebalanceCompleted {
                researcher_id: changed_researcher_id.to_string(),
                dropped_assignments: dropped.len(),
                redistributed_interviews: to_redistribute,
                new_assignments: replacements.len(),
            },
        ));

        let mut result = kept;
        result.extend(replacements);
        result
    }

    /// Fold observed performance (id → [0, 1]) into efficiency, then re-plan
    /// from scratch with the input's total as the hint.
    pub fn optimize_assignments(
        &mut self,
        assignments: &[Assignment],
        performance: &HashMap<String, f64>,
    ) -> Vec<Assignment> {
        let alpha = self.config.smoothing_factor;
        let mut updates = Vec::new();

        for researcher in &mut self.researchers {
            let Some(&observed) = performance.get(&researcher.id) else {
                continue;
            };
            let old = researcher.efficiency;
            researcher.efficiency = old * (1.0 - alpha) + observed * alpha;
            updates.push(Diagnostic::debug(
                format!("efficiency {}: {old:.3} -> {:.3}", researcher.id, researcher.efficiency),
                PlanEvent::EfficiencyUpdated {
                    researcher_id: researcher.id.clone(),
                    old_efficiency: old,
                    new_efficiency: researcher.efficiency,
                },
            ));
        }

        let updated = updates.len();
        for update in updates {
            self.record(update);
        }

        let total = total_planned(assignments);
        let replanned = self.auto_distribute(total);

        self.record(Diagnostic::info(
            format!("optimized plan: {updated} efficiencies updated, re-planned {total} interviews"),
            PlanEvent::OptimizationCompleted {
                updated_researchers: updated,
                total_interviews_hint: total,
            },
        ));
        replanned
    }
}
