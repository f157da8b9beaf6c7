//! Deterministic performance signals for demos and soak runs.
//!
//! RULE: the planner itself never draws random numbers. Randomness only
//! feeds the simulated field-performance stream the runner hands to
//! `optimize_assignments`, and that stream is fully reproducible from
//! its seed.
//!
//! Each round gets its own stream, seeded from (seed XOR round index),
//! so replaying round N never requires replaying rounds 0..N.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::collections::HashMap;

/// Lowest simulated performance; signals fall in [floor, 1.0).
pub const PERFORMANCE_FLOOR: f64 = 0.7;

pub struct PerformanceSampler {
    seed: u64,
}

impl PerformanceSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// The RNG stream for one optimization round.
    pub fn for_round(&self, round: u64) -> SignalRng {
        SignalRng::new(self.seed, round)
    }

    /// One performance figure per researcher id, in input order.
    pub fn sample_round<'a>(
        &self,
        round: u64,
        researcher_ids: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<String, f64> {
        let mut rng = self.for_round(round);
        researcher_ids
            .into_iter()
            .map(|id| (id.to_string(), rng.performance()))
            .collect()
    }
}

pub struct SignalRng {
    inner: Pcg64Mcg,
}

impl SignalRng {
    pub fn new(seed: u64, round: u64) -> Self {
        let derived_seed = seed ^ round.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self { inner: Pcg64Mcg::seed_from_u64(derived_seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// A performance figure in [PERFORMANCE_FLOOR, 1.0).
    pub fn performance(&mut self) -> f64 {
        PERFORMANCE_FLOOR + self.next_f64() * (1.0 - PERFORMANCE_FLOOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_round_is_identical() {
        let a = PerformanceSampler::new(42).sample_round(3, ["r1", "r2", "r3"]);
        let b = PerformanceSampler::new(42).sample_round(3, ["r1", "r2", "r3"]);
        assert_eq!(a, b, "Same seed and round should give the same signals");
    }

    #[test]
    fn signals_stay_in_range() {
        let mut rng = SignalRng::new(7, 0);
        for _ in 0..1_000 {
            let p = rng.performance();
            assert!((PERFORMANCE_FLOOR..1.0).contains(&p), "Out of range: {p}");
        }
    }

    #[test]
    fn rounds_differ() {
        let sampler = PerformanceSampler::new(42);
        let a = sampler.sample_round(0, ["r1"]);
        let b = sampler.sample_round(1, ["r1"]);
        assert_ne!(a["r1"], b["r1"]);
    }
}
