//! Work-distribution engine for GPS-verified field surveys.
//!
//! Given researchers (efficiency, location, load, availability) and regions
//! (interview targets, priority, difficulty), the engine plans interview
//! quotas, estimates completion times, re-plans when a researcher goes
//! offline and adapts to observed performance. See `engine` for the entry
//! points.

pub mod allocator;
pub mod analysis;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod eta;
pub mod event;
pub mod geo;
pub mod model;
pub mod rng;
pub mod scenario;
pub mod scorer;
pub mod store;
pub mod types;
