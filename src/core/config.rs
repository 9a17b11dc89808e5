//! Simulator configuration with documented defaults
//!
//! These values shape the pacing of the run loop. Combat tunables (health
//! bounds, recharge ranges, damage fractions) live in
//! `combat::constants` because they are part of the rules, not the runner.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::combat::constants::DEFAULT_EXPERIENCE_GAIN;

/// Configuration for the battle run loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Real time between two attack rounds (milliseconds)
    ///
    /// Unit recharge timers run in real time, so this decides how many
    /// rounds a recharging squad sits out. At 100ms and a 2000ms recharge,
    /// a squad misses roughly 20 rounds after every attempt.
    pub tick_interval_ms: u64,

    /// Rounds before the battle is declared a draw
    ///
    /// Guards against scenarios where no side can ever land damage
    /// (for example every unit has zero damage output).
    pub max_ticks: u64,

    /// Experience granted to every living unit of a squad after a
    /// successful attack
    pub experience_gain: f64,

    /// Where the human-readable battle log is written, if anywhere
    pub battle_log_path: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            max_ticks: 100_000,
            experience_gain: DEFAULT_EXPERIENCE_GAIN,
            battle_log_path: None,
        }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_ticks == 0 {
            return Err("max_ticks must be at least 1".into());
        }

        if !self.experience_gain.is_finite() || self.experience_gain < 0.0 {
            return Err(format!(
                "experience_gain ({}) must be a non-negative number",
                self.experience_gain
            ));
        }

        Ok(())
    }
}
