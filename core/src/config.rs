use serde::{Deserialize, Serialize};

/// Weights of the five scorer components. They sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreWeights {
    pub distance: f64,
    pub efficiency: f64,
    pub load_balance: f64,
    pub priority: f64,
    pub availability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            distance:     0.25,
            efficiency:   0.30,
            load_balance: 0.25,
            priority:     0.10,
            availability: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.distance + self.efficiency + self.load_balance + self.priority + self.availability
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationLimits {
    /// Distances at or beyond this score zero on the distance component.
    pub distance_cutoff_km: f64,
    /// Per-region ceiling for one researcher = floor(efficiency × factor).
    pub efficiency_quota_factor: f64,
    /// Global per-researcher load ceiling.
    pub max_researcher_load: u32,
    /// Highest region priority; the priority component is priority / this.
    pub max_priority: u8,
}

impl Default for AllocationLimits {
    fn default() -> Self {
        Self {
            distance_cutoff_km:      50.0,
            efficiency_quota_factor: 20.0,
            max_researcher_load:     50,
            max_priority:            5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EtaModel {
    pub base_minutes_per_interview: f64,
    /// Difficulty at which the per-interview time is unscaled.
    pub difficulty_pivot: f64,
    /// Multiplier applied to the raw estimate (1.2 = 20% buffer).
    pub buffer_factor: f64,
}

impl Default for EtaModel {
    fn default() -> Self {
        Self {
            base_minutes_per_interview: 15.0,
            difficulty_pivot:           3.0,
            buffer_factor:              1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaRiskPolicy {
    /// Regions below this completion fraction are candidates.
    pub completion_threshold: f64,
    /// ...when the deadline is at most this many days away.
    pub deadline_window_days: i64,
    /// Campaign-wide completion below this fraction is urgent...
    #[serde(default = "default_urgent_completion_threshold")]
    pub urgent_completion_threshold: f64,
    /// ...once the deadline is at most this many days away.
    #[serde(default = "default_urgent_window_days")]
    pub urgent_window_days: i64,
}

fn default_urgent_completion_threshold() -> f64 {
    0.80
}

fn default_urgent_window_days() -> i64 {
    3
}

impl Default for QuotaRiskPolicy {
    fn default() -> Self {
        Self {
            completion_threshold:        0.40,
            deadline_window_days:        7,
            urgent_completion_threshold: default_urgent_completion_threshold(),
            urgent_window_days:          default_urgent_window_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub limits: AllocationLimits,
    #[serde(default)]
    pub eta: EtaModel,
    /// EMA factor for performance feedback: eff = eff × (1 − α) + perf × α.
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,
    #[serde(default)]
    pub quota_risk: QuotaRiskPolicy,
}

fn default_smoothing_factor() -> f64 {
    0.2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights:          ScoreWeights::default(),
            limits:           AllocationLimits::default(),
            eta:              EtaModel::default(),
            smoothing_factor: default_smoothing_factor(),
            quota_risk:       QuotaRiskPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine/engine_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content).map_err(|e| anyhow::anyhow!("Invalid {path}: {e}"))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        let total = config.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            log::warn!("score weights sum to {total:.3}, scores are clamped to [0, 1]");
        }
        if !(0.0..=1.0).contains(&config.smoothing_factor) {
            anyhow::bail!(
                "smoothing_factor must be within [0, 1], got {}",
                config.smoothing_factor
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!((ScoreWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = EngineConfig::from_json(r#"{ "smoothing_factor": 0.5 }"#).unwrap();
        assert_eq!(config.smoothing_factor, 0.5);
        assert_eq!(config.limits, AllocationLimits::default());
        assert_eq!(config.eta, EtaModel::default());
    }

    #[test]
    fn older_quota_policy_gets_urgent_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "quota_risk": { "completion_threshold": 0.5, "deadline_window_days": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.quota_risk.completion_threshold, 0.5);
        assert_eq!(config.quota_risk.urgent_completion_threshold, 0.80);
        assert_eq!(config.quota_risk.urgent_window_days, 3);
    }

    #[test]
    fn out_of_range_smoothing_factor_rejected() {
        assert!(EngineConfig::from_json(r#"{ "smoothing_factor": 1.5 }"#).is_err());
    }
}
