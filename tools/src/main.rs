//! plan-runner: headless driver for the field-survey distribution engine.
//!
//! Usage:
//!   plan-runner --scenario data/scenarios/demo.json
//!   plan-runner --scenario demo.json --offline r-03 --optimize-rounds 3 --db plan.db
//!   plan-runner --scenario demo.json --deadline-days 5
//!   plan-runner --scenario demo.json --ipc-mode

use anyhow::{Context, Result};
use chrono::Utc;
use fieldplan_core::{
    analysis::{
        detect_deadline_approaching, detect_quota_risks, distribution_table, optimization_score,
        region_summary, render_table, researcher_summary, DeadlineAlert, QuotaRisk,
        RegionSummary, ResearcherSummary,
    },
    clock::PlanClock,
    config::EngineConfig,
    engine::DistributionEngine,
    event::Diagnostic,
    model::{mean_confidence, total_planned, Assignment, ResearcherStatus},
    rng::PerformanceSampler,
    scenario::Scenario,
    store::{new_run_id, PlanStore},
};
use std::collections::HashMap;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Distribute {
        #[serde(default)]
        total: Option<u32>,
    },
    SetStatus {
        researcher_id: String,
        status: ResearcherStatus,
    },
    Rebalance {
        researcher_id: String,
    },
    Optimize {
        #[serde(default)]
        performance: Option<HashMap<String, f64>>,
    },
    Complete {
        completed: HashMap<String, u32>,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    researchers: ResearcherSummary,
    regions: RegionSummary,
    assignments: Vec<Assignment>,
    total_assigned: u32,
    mean_confidence: f64,
    optimization_score: u32,
    quota_risks: Vec<QuotaRisk>,
    deadline_alert: Option<DeadlineAlert>,
    diagnostics: Vec<Diagnostic>,
}

/// Mutable session shared by batch and IPC modes.
struct Session {
    engine: DistributionEngine,
    scenario: Scenario,
    assignments: Vec<Assignment>,
    sampler: PerformanceSampler,
    round: u64,
}

impl Session {
    /// Loads as the scenario snapshot had them, for a fresh planning epoch.
    fn baseline_loads(&self) -> HashMap<String, u32> {
        self.scenario
            .researchers
            .iter()
            .map(|r| (r.id.clone(), r.current_load))
            .collect()
    }

    fn distribute(&mut self, total: Option<u32>) {
        let baselines = self.baseline_loads();
        self.engine.reset_loads(&baselines);
        let total = total.unwrap_or_else(|| {
            self.engine.regions().iter().map(|r| r.remaining_interviews()).sum()
        });
        self.assignments = self.engine.auto_distribute(total);
    }

    fn rebalance(&mut self, researcher_id: &str) {
        self.assignments = self.engine.rebalance_assignments(&self.assignments, researcher_id);
    }

    fn optimize(&mut self, performance: Option<HashMap<String, f64>>) {
        let performance = performance.unwrap_or_else(|| {
            let ids: Vec<String> = self.engine.researchers().iter().map(|r| r.id.clone()).collect();
            self.sampler.sample_round(self.round, ids.iter().map(String::as_str))
        });
        self.round += 1;
        let baselines = self.baseline_loads();
        self.engine.reset_loads(&baselines);
        self.assignments = self.engine.optimize_assignments(&self.assignments, &performance);
    }

    fn state(&mut self) -> UiState {
        let now = self.engine.clock().now();
        let policy = &self.engine.config().quota_risk;
        UiState {
            researchers:        researcher_summary(self.engine.researchers()),
            regions:            region_summary(self.engine.regions()),
            total_assigned:     total_planned(&self.assignments),
            mean_confidence:    mean_confidence(&self.assignments),
            optimization_score: optimization_score(&self.assignments, self.engine.researchers()),
            quota_risks:        detect_quota_risks(self.engine.regions(), self.scenario.deadline, now, policy),
            deadline_alert:     detect_deadline_approaching(
                self.engine.regions(),
                self.scenario.deadline,
                now,
                policy,
            ),
            assignments:        self.assignments.clone(),
            diagnostics:        self.engine.take_events(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let rounds = parse_arg(&args, "--optimize-rounds", 0u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let scenario_path = str_arg(&args, "--scenario").unwrap_or("./data/scenarios/demo.json");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let db = str_arg(&args, "--db");
    let offline = str_arg(&args, "--offline");
    let deadline_days = str_arg(&args, "--deadline-days")
        .map(|d| d.parse::<i64>().with_context(|| format!("--deadline-days {d}")))
        .transpose()?;

    if !ipc_mode {
        println!("Field survey distribution: plan-runner");
        println!("  scenario:  {scenario_path}");
        println!("  data_dir:  {data_dir}");
        println!("  seed:      {seed}");
        println!("  rounds:    {rounds}");
        println!("  db:        {}", db.unwrap_or("(none)"));
        if let Some(days) = deadline_days {
            println!("  deadline:  {days} days from now");
        }
        println!();
    }

    let config = EngineConfig::load(data_dir).unwrap_or_else(|e| {
        log::warn!("Using default engine config: {e}");
        EngineConfig::default()
    });
    let mut scenario = Scenario::load(scenario_path)?;
    let clock = PlanClock::System;
    if let Some(days) = deadline_days {
        scenario.set_deadline_in(clock.now(), days);
    }

    let engine = DistributionEngine::new(scenario.researchers.clone(), scenario.regions.clone())
        .with_config(config)
        .with_clock(clock);

    let mut session = Session {
        engine,
        scenario,
        assignments: Vec::new(),
        sampler: PerformanceSampler::new(seed),
        round: 0,
    };

    if ipc_mode {
        return run_ipc_loop(&mut session);
    }

    session.distribute(None);

    if let Some(id) = offline {
        session.engine.set_researcher_status(id, ResearcherStatus::Offline)?;
        session.rebalance(id);
    }

    for _ in 0..rounds {
        session.optimize(None);
    }

    let diagnostics = session.engine.events().to_vec();
    print_summary(&mut session)?;

    if let Some(path) = db {
        persist(path, &session, &diagnostics)?;
        println!();
        println!("  plan log written to {path}");
    }

    Ok(())
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {}
            IpcCommand::Distribute { total } => session.distribute(total),
            IpcCommand::SetStatus { researcher_id, status } => {
                if let Err(e) = session.engine.set_researcher_status(&researcher_id, status) {
                    let err_json = serde_json::json!({ "error": e.to_string() });
                    writeln!(stdout, "{}", err_json)?;
                    stdout.flush()?;
                    continue;
                }
            }
            IpcCommand::Rebalance { researcher_id } => session.rebalance(&researcher_id),
            IpcCommand::Optimize { performance } => session.optimize(performance),
            IpcCommand::Complete { completed } => {
                let sync = session.engine.record_completed(&completed);
                log::debug!(
                    "completed counts updated for {} regions, {} reached target",
                    sync.changed,
                    sync.reached_target.len()
                );
            }
        }

        let state = session.state();
        writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(session: &mut Session) -> Result<()> {
    let rows = distribution_table(
        &session.assignments,
        session.engine.researchers(),
        session.engine.regions(),
    );
    let state = session.state();

    println!("=== DISTRIBUTION ===");
    print!("{}", render_table(&rows));
    println!();
    println!("=== PLAN SUMMARY ===");
    println!("  campaign:        {}", session.scenario.name);
    println!("  assignments:     {}", state.assignments.len());
    println!("  interviews:      {}", state.total_assigned);
    println!("  remaining need:  {}", session.scenario.total_remaining());
    println!("  mean confidence: {:.1}%", state.mean_confidence * 100.0);
    println!("  optimization:    {}%", state.optimization_score);
    println!(
        "  researchers:     {} available / {} busy / {} offline",
        state.researchers.available, state.researchers.busy, state.researchers.offline
    );
    println!(
        "  regions:         {} completed / {} in progress / {} pending",
        state.regions.completed, state.regions.in_progress, state.regions.pending
    );

    println!();
    println!("=== QUOTA RISK ===");
    if state.quota_risks.is_empty() {
        println!("  (No regions at risk)");
    } else {
        for risk in &state.quota_risks {
            println!(
                "  {} | {:.0}% complete | {} days to deadline",
                risk.region_name, risk.completion_rate, risk.days_until_deadline
            );
        }
    }
    if let Some(alert) = &state.deadline_alert {
        println!(
            "  URGENT: campaign {:.0}% complete ({}/{}) with {} days to deadline",
            alert.completion_rate,
            alert.completed_interviews,
            alert.target_interviews,
            alert.days_until_deadline
        );
    }
    Ok(())
}

fn persist(path: &str, session: &Session, diagnostics: &[Diagnostic]) -> Result<()> {
    let mut store = PlanStore::open(path)?;
    store.migrate()?;

    let run_id = new_run_id();
    store.insert_run(&run_id, &session.scenario.name, env!("CARGO_PKG_VERSION"), Utc::now())?;
    store.save_assignments(&run_id, &session.assignments)?;
    store.append_events(&run_id, diagnostics)?;
    log::info!("Plan {run_id} saved: {} assignments", session.assignments.len());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
