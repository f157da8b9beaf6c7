//! Planning clock: the single source of "now" for completion estimates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", content = "at", rename_all = "snake_case")]
pub enum PlanClock {
    /// Wall clock. Used by the runner.
    System,
    /// Frozen instant. Used by tests and replays so plans are reproducible.
    Fixed(DateTime<Utc>),
}

impl PlanClock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System    => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

impl Default for PlanClock {
    fn default() -> Self { Self::System }
}
