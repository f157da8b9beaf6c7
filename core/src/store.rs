//! SQLite plan log.
//!
//! RULE: Only store.rs talks to the database.
//! The engine never touches it; the runner saves each run's assignments
//! and diagnostics here for audit and downstream display.

use rusqlite::{params, Connection};
use crate::{
    error::{PlanError, PlanResult},
    event::{Diagnostic, DiagnosticLevel, EventLogEntry},
    model::Assignment,
};
use chrono::{DateTime, Utc};

pub struct PlanStore {
    conn: Connection,
}

/// Fresh run identifier for the plan log.
pub fn new_run_id() -> String {
    format!("plan-{}", uuid::Uuid::new_v4())
}

impl PlanStore {
    /// Open (or create) the plan log at `path`.
    pub fn open(path: &str) -> PlanResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PlanResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PlanResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_plan_log.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        label: &str,
        version: &str,
        started_at: DateTime<Utc>,
    ) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO plan_run (run_id, label, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, label, version, started_at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn run_count(&self) -> PlanResult<i64> {
        let count = self.conn.query_row("SELECT COUNT(*) FROM plan_run", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Assignments ────────────────────────────────────────────

    /// Replace the stored plan of `run_id` with `assignments`.
    pub fn save_assignments(&mut self, run_id: &str, assignments: &[Assignment]) -> PlanResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM assignment WHERE run_id = ?1", params![run_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO assignment
                   (run_id, researcher_id, region_id, target_interviews, estimated_completion, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for a in assignments {
                stmt.execute(params![
                    run_id,
                    a.researcher_id,
                    a.region_id,
                    a.target_interviews as i64,
                    a.estimated_completion.to_rfc3339(),
                    a.confidence,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn assignments_for_run(&self, run_id: &str) -> PlanResult<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT researcher_id, region_id, target_interviews, estimated_completion, confidence
             FROM assignment WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut assignments = Vec::new();
        for row in rows {
            let (researcher_id, region_id, target, eta, confidence) = row?;
            let estimated_completion = DateTime::parse_from_rfc3339(&eta)
                .map_err(|e| PlanError::CorruptLog {
                    reason: format!("bad timestamp {eta:?}: {e}"),
                })?
                .with_timezone(&Utc);
            assignments.push(Assignment {
                researcher_id,
                region_id,
                target_interviews: target as u32,
                estimated_completion,
                confidence,
            });
        }
        Ok(assignments)
    }

    // ── Event log ──────────────────────────────────────────────

    /// Append diagnostics after the last stored sequence number of the run.
    pub fn append_events(&self, run_id: &str, diagnostics: &[Diagnostic]) -> PlanResult<()> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM event_log WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        for (offset, diagnostic) in diagnostics.iter().enumerate() {
            let entry = EventLogEntry {
                id:         None,
                run_id:     run_id.to_string(),
                seq:        next as u64 + offset as u64,
                level:      diagnostic.level,
                event_type: diagnostic.event.type_name().to_string(),
                message:    diagnostic.message.clone(),
                payload:    serde_json::to_string(&diagnostic.event)?,
            };
            self.append_event(&entry)?;
        }
        Ok(())
    }

    pub fn append_event(&self, entry: &EventLogEntry) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, seq, level, event_type, message, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.run_id,
                entry.seq as i64,
                entry.level.as_str(),
                entry.event_type,
                entry.message,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> PlanResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, level, event_type, message, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, run_id, seq, level, event_type, message, payload) = row?;
            let level = DiagnosticLevel::parse(&level).ok_or_else(|| PlanError::CorruptLog {
                reason: format!("unknown diagnostic level {level:?}"),
            })?;
            entries.push(EventLogEntry {
                id: Some(id),
                run_id,
                seq: seq as u64,
                level,
                event_type,
                message,
                payload,
            });
        }
        Ok(entries)
    }
}
