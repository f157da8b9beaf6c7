//! Shared primitive types used across the engine.

use serde::{Deserialize, Serialize};

/// A stable, unique identifier for a field researcher.
pub type ResearcherId = String;

/// A stable, unique identifier for a survey region.
pub type RegionId = String;

/// The canonical identifier of one planning run (runner and plan log).
pub type RunId = String;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}
