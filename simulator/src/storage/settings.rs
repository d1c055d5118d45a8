//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::deploy::steps::FailurePolicy;
use crate::errors::SimError;
use crate::logs::LogLevel;

/// Simulator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Emit diagnostics as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Directory for a rolling diagnostics file
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Timer configuration
    #[serde(default)]
    pub timing: TimingSettings,

    /// Simulation behaviour
    #[serde(default)]
    pub simulation: SimulationSettings,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            log_dir: None,
            timing: TimingSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl Settings {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SimError> {
        if self.timing.advance_interval_ms == 0 {
            return Err(SimError::ConfigError(
                "timing.advance_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.timing.emit_interval_ms == 0 {
            return Err(SimError::ConfigError(
                "timing.emit_interval_ms must be greater than zero".to_string(),
            ));
        }
        let sim = &self.simulation;
        if sim.step_duration_min_secs > sim.step_duration_max_secs {
            return Err(SimError::ConfigError(format!(
                "simulation.step_duration_min_secs ({}) exceeds step_duration_max_secs ({})",
                sim.step_duration_min_secs, sim.step_duration_max_secs
            )));
        }
        if let FailurePolicy::Random { probability } = sim.failure {
            if !(0.0..=1.0).contains(&probability) {
                return Err(SimError::ConfigError(format!(
                    "simulation.failure.probability must be within 0..=1, got {}",
                    probability
                )));
            }
        }
        Ok(())
    }
}

/// Timer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Milliseconds between step transitions
    #[serde(default = "default_advance_interval")]
    pub advance_interval_ms: u64,

    /// Milliseconds between periodic log lines
    #[serde(default = "default_emit_interval")]
    pub emit_interval_ms: u64,
}

fn default_advance_interval() -> u64 {
    8_000
}

fn default_emit_interval() -> u64 {
    3_000
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            advance_interval_ms: default_advance_interval(),
            emit_interval_ms: default_emit_interval(),
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Start with live-tail on
    #[serde(default = "default_true")]
    pub live_tail: bool,

    /// Follow the newest log line while live-tail is on
    #[serde(default = "default_true")]
    pub auto_scroll: bool,

    /// Lower bound (inclusive) of the random step duration
    #[serde(default = "default_duration_min")]
    pub step_duration_min_secs: u32,

    /// Upper bound (exclusive) of the random step duration
    #[serde(default = "default_duration_max")]
    pub step_duration_max_secs: u32,

    /// Step failure injection
    #[serde(default)]
    pub failure: FailurePolicy,

    /// Fixed RNG seed
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Replacement catalog of periodic log lines
    #[serde(default)]
    pub log_catalog: Vec<String>,
}

fn default_duration_min() -> u32 {
    20
}

fn default_duration_max() -> u32 {
    50
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            live_tail: true,
            auto_scroll: true,
            step_duration_min_secs: default_duration_min(),
            step_duration_max_secs: default_duration_max(),
            failure: FailurePolicy::Never,
            rng_seed: None,
            log_catalog: Vec::new(),
        }
    }
}
