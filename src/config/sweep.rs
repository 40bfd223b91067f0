//! Expiration sweep configuration

use serde::Deserialize;

/// Settings for the batch expiration sweep.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Days past the paid end date before a membership is actually
    /// expired. Zero expires on the dot.
    #[serde(default)]
    pub grace_days: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { grace_days: 0 }
    }
}
