//! Read-only views over a plan: dashboard summaries, the distribution
//! table, the optimization score and deadline alerts.
//!
//! Nothing here mutates engine state. The notification layer consumes
//! `QuotaRisk` and `DeadlineAlert` records; sending them is out of scope.

use crate::{
    config::QuotaRiskPolicy,
    model::{mean_confidence, Assignment, Region, Researcher, ResearcherStatus},
    types::RegionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearcherSummary {
    pub available: usize,
    pub busy: usize,
    pub offline: usize,
    pub total: usize,
}

pub fn researcher_summary(researchers: &[Researcher]) -> ResearcherSummary {
    let count = |s: ResearcherStatus| researchers.iter().filter(|r| r.status == s).count();
    ResearcherSummary {
        available: count(ResearcherStatus::Available),
        busy:      count(ResearcherStatus::Busy),
        offline:   count(ResearcherStatus::Offline),
        total:     researchers.len(),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionSummary {
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub total: usize,
}

pub fn region_summary(regions: &[Region]) -> RegionSummary {
    let mut summary = RegionSummary { total: regions.len(), ..Default::default() };
    for region in regions {
        if region.completed_interviews >= region.target_interviews {
            summary.completed += 1;
        } else if region.completed_interviews > 0 {
            summary.in_progress += 1;
        } else {
            summary.pending += 1;
        }
    }
    summary
}

/// One row of the per-researcher distribution table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionRow {
    pub name: String,
    pub assigned: u32,
    /// Region names joined with ", ", or "none".
    pub regions: String,
    /// Efficiency as a percentage with one decimal, e.g. "85.0%".
    pub efficiency: String,
}

pub fn distribution_table(
    assignments: &[Assignment],
    researchers: &[Researcher],
    regions: &[Region],
) -> Vec<DistributionRow> {
    researchers
        .iter()
        .map(|researcher| {
            let own: Vec<&Assignment> = assignments
                .iter()
                .filter(|a| a.researcher_id == researcher.id)
                .collect();
            let names: Vec<&str> = own
                .iter()
                .filter_map(|a| regions.iter().find(|r| r.id == a.region_id))
                .map(|r| r.name.as_str())
                .collect();
            DistributionRow {
                name:       researcher.name.clone(),
                assigned:   own.iter().map(|a| a.target_interviews).sum(),
                regions:    if names.is_empty() { "none".to_string() } else { names.join(", ") },
                efficiency: format!("{:.1}%", researcher.efficiency * 100.0),
            }
        })
        .collect()
}

/// Render the distribution table as aligned text for logs and the runner.
pub fn render_table(rows: &[DistributionRow]) -> String {
    let name_w = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(10);
    let mut out = format!(
        "{:<name_w$} | {:>8} | {:>10} | regions\n",
        "researcher", "assigned", "efficiency"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<name_w$} | {:>8} | {:>10} | {}\n",
            row.name, row.assigned, row.efficiency, row.regions
        ));
    }
    out
}

/// Coefficient of variation of per-researcher planned totals.
/// Every researcher in the roster counts, including those with nothing.
pub fn load_variation(assignments: &[Assignment], researchers: &[Researcher]) -> f64 {
    if researchers.is_empty() {
        return 0.0;
    }
    let loads: Vec<f64> = researchers
        .iter()
        .map(|r| {
            assignments
                .iter()
                .filter(|a| a.researcher_id == r.id)
                .map(|a| a.target_interviews as f64)
                .sum()
        })
        .collect();
    let n = loads.len() as f64;
    let mean = loads.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

/// Plan quality on a 0–100 scale: 70% mean confidence, 30% load evenness.
pub fn optimization_score(assignments: &[Assignment], researchers: &[Researcher]) -> u32 {
    if assignments.is_empty() {
        return 0;
    }
    let confidence = mean_confidence(assignments);
    let evenness = 1.0 - load_variation(assignments, researchers);
    let score = ((confidence * 0.7 + evenness * 0.3) * 100.0).round();
    score.max(0.0) as u32
}

/// A region falling behind with the deadline close.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaRisk {
    pub region_id: RegionId,
    pub region_name: String,
    /// Completion in percent.
    pub completion_rate: f64,
    pub days_until_deadline: i64,
}

/// Whole days until `deadline`, rounded up. Negative once it has passed.
pub fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let ms = (deadline - now).num_milliseconds();
    // ceil for integers, correct for both signs
    -((-ms).div_euclid(DAY_MS))
}

/// Regions under the completion threshold whose deadline is inside the
/// window. Without a deadline nothing is at risk.
pub fn detect_quota_risks(
    regions: &[Region],
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &QuotaRiskPolicy,
) -> Vec<QuotaRisk> {
    let Some(deadline) = deadline else {
        return Vec::new();
    };
    let days = days_until(deadline, now);
    if days > policy.deadline_window_days {
        return Vec::new();
    }

    regions
        .iter()
        .filter(|r| r.target_interviews > 0)
        .filter(|r| r.completion_ratio() < policy.completion_threshold)
        .map(|r| QuotaRisk {
            region_id:           r.id.clone(),
            region_name:         r.name.clone(),
            completion_rate:     r.completion_ratio() * 100.0,
            days_until_deadline: days,
        })
        .collect()
}

/// Campaign-wide alert: the deadline is days away and too little is done.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadlineAlert {
    pub days_until_deadline: i64,
    /// Completion in percent, over every region's target.
    pub completion_rate: f64,
    pub completed_interviews: u32,
    pub target_interviews: u32,
}

/// Fires when the deadline is inside the urgent window and the campaign
/// as a whole is below the urgent completion threshold. A passed deadline
/// still counts as inside the window.
pub fn detect_deadline_approaching(
    regions: &[Region],
    deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &QuotaRiskPolicy,
) -> Option<DeadlineAlert> {
    let deadline = deadline?;
    let days = days_until(deadline, now);
    if days > policy.urgent_window_days {
        return None;
    }

    let target: u32 = regions.iter().map(|r| r.target_interviews).sum();
    if target == 0 {
        return None;
    }
    let completed: u32 = regions.iter().map(|r| r.completed_interviews).sum();
    let ratio = completed as f64 / target as f64;
    if ratio >= policy.urgent_completion_threshold {
        return None;
    }

    Some(DeadlineAlert {
        days_until_deadline:  days,
        completion_rate:      ratio * 100.0,
        completed_interviews: completed,
        target_interviews:    target,
    })
}
