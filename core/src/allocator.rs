//! Greedy quota allocator.
//!
//! ALGORITHM (one call, fixed order, deterministic):
//!   1. Drop offline researchers. None left → empty plan + warning.
//!   2. Order regions by urgency = priority × (1 − completion), descending.
//!      Regions with nothing remaining are skipped.
//!   3. Per region, score every assignable researcher and rank descending.
//!   4. Walk the ranking and carve quota:
//!        max_assignable = min(remaining, floor(eff × 20), 50 − load)
//!        grant          = min(max_assignable, ceil(remaining / 2))
//!   5. Stop when the region is covered or candidates run out. Whatever is
//!      left stays unassigned until a later run.
//!
//! Load is never written to the caller's researchers here. Grants
//! accumulate in a `LoadLedger` (researcher id → delta) and every later
//! region sees baseline + delta. The engine applies the ledger once the
//! call is over.

use crate::{
    analysis::{distribution_table, render_table},
    config::EngineConfig,
    eta::estimated_completion,
    event::{Diagnostic, PlanEvent},
    model::{mean_confidence, total_planned, Assignment, Region, Researcher},
    scorer::{assignment_score, max_load},
    types::ResearcherId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Interviews granted per researcher during one allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadLedger {
    deltas: HashMap<ResearcherId, u32>,
}

impl LoadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delta(&self, researcher_id: &str) -> u32 {
        self.deltas.get(researcher_id).copied().unwrap_or(0)
    }

    /// Baseline load plus everything granted so far in this call.
    pub fn effective_load(&self, researcher: &Researcher) -> u32 {
        researcher.current_load.saturating_add(self.delta(&researcher.id))
    }

    pub fn record(&mut self, researcher_id: &str, interviews: u32) {
        let entry = self.deltas.entry(researcher_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(interviews);
    }

    pub fn total(&self) -> u32 {
        self.deltas.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Add the accumulated deltas to the caller's researchers.
    pub fn apply_to(&self, researchers: &mut [Researcher]) {
        for researcher in researchers.iter_mut() {
            researcher.current_load = self.effective_load(researcher);
        }
    }
}

/// Result of one allocation pass.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub assignments: Vec<Assignment>,
    pub ledger: LoadLedger,
    pub diagnostics: Vec<Diagnostic>,
}

/// Per-region ceiling for one researcher: floor(efficiency × factor).
fn efficiency_cap(researcher: &Researcher, config: &EngineConfig) -> u32 {
    let cap = (researcher.efficiency * config.limits.efficiency_quota_factor).floor();
    if cap.is_nan() || cap <= 0.0 {
        0
    } else if cap >= u32::MAX as f64 {
        u32::MAX
    } else {
        cap as u32
    }
}

/// Build a plan for every region from the assignable part of `roster`.
///
/// `total_interviews_hint` is recorded in diagnostics only. The real bound
/// is each region's remaining need.
pub fn distribute(
    roster: &[Researcher],
    regions: &[Region],
    total_interviews_hint: u32,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Allocation {
    let mut allocation = Allocation::default();

    let available: Vec<&Researcher> = roster.iter().filter(|r| r.is_assignable()).collect();
    if available.is_empty() {
        allocation.diagnostics.push(Diagnostic::warn(
            "no researchers available for automatic distribution",
            PlanEvent::NoResearchersAvailable { total_interviews_hint },
        ));
        return allocation;
    }

    allocation.diagnostics.push(Diagnostic::info(
        format!(
            "distributing {total_interviews_hint} interviews across {} researchers",
            available.len()
        ),
        PlanEvent::DistributionStarted {
            total_interviews_hint,
            available_researchers: available.len(),
            regions: regions.len(),
        },
    ));

    let mut ordered: Vec<&Region> = regions.iter().collect();
    ordered.sort_by(|a, b| b.urgency().total_cmp(&a.urgency()));

    for region in ordered {
        let remaining = region.remaining_interviews();
        if remaining == 0 {
            continue;
        }
        let unassigned = allocate_region(&mut allocation, roster, &available, region, now, config);
        if unassigned > 0 {
            allocation.diagnostics.push(Diagnostic::info(
                format!("region {} left {unassigned} interviews unassigned", region.id),
                PlanEvent::RegionUnderQuota {
                    region_id: region.id.clone(),
                    unassigned,
                },
            ));
        }
    }

    let total_assigned = total_planned(&allocation.assignments);
    let mean = mean_confidence(&allocation.assignments);
    let table = distribution_table(&allocation.assignments, roster, regions);
    let mut message = format!(
        "distributed {total_assigned} interviews in {} assignments, mean confidence {:.1}%",
        allocation.assignments.len(),
        mean * 100.0
    );
    if !allocation.assignments.is_empty() {
        message.push('\n');
        message.push_str(&render_table(&table));
    }
    allocation.diagnostics.push(Diagnostic::info(
        message,
        PlanEvent::DistributionCompleted {
            assignments: allocation.assignments.len(),
            total_assigned,
            mean_confidence: mean,
            table,
        },
    ));

    allocation
}

/// Carve one region's remaining need. Returns what could not be placed.
fn allocate_region(
    allocation: &mut Allocation,
    roster: &[Researcher],
    available: &[&Researcher],
    region: &Region,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> u32 {
    // Normalize against the whole roster, as loads stand before this region.
    let ledger = &allocation.ledger;
    let roster_max = max_load(roster.iter().map(|r| ledger.effective_load(r)));

    let mut ranked: Vec<(&Researcher, f64)> = available
        .iter()
        .map(|r| {
            let score = assignment_score(r, ledger.effective_load(r), region, roster_max, config);
            (*r, score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut remaining = region.remaining_interviews();
    for (researcher, score) in ranked {
        if remaining == 0 {
            break;
        }

        let load = allocation.ledger.effective_load(researcher);
        let headroom = config.limits.max_researcher_load.saturating_sub(load);
        let max_assignable = remaining.min(efficiency_cap(researcher, config)).min(headroom);
        if max_assignable == 0 {
            continue;
        }

        let target_interviews = max_assignable.min(remaining.div_ceil(2));
        let assignment = Assignment {
            researcher_id: researcher.id.clone(),
            region_id: region.id.clone(),
            target_interviews,
            estimated_completion: estimated_completion(
                now,
                researcher,
                target_interviews,
                region,
                &config.eta,
            ),
            confidence: score,
        };

        allocation.diagnostics.push(Diagnostic::debug(
            format!(
                "{} -> {}: {target_interviews} interviews (score {score:.3})",
                researcher.id, region.id
            ),
            PlanEvent::AssignmentMade {
                researcher_id: researcher.id.clone(),
                region_id: region.id.clone(),
                target_interviews,
                confidence: score,
            },
        ));

        allocation.assignments.push(assignment);
        allocation.ledger.record(&researcher.id, target_interviews);
        remaining -= target_interviews;
    }

    remaining
}
