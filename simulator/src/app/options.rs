//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::deploy::session::SessionOptions;
use crate::deploy::steps::AdvancePolicy;
use crate::errors::SimError;
use crate::storage::settings::Settings;
use crate::workers::simulation;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Deployment to pick from the seed file
    pub deployment_id: Option<String>,

    /// Simulation worker options
    pub simulation: simulation::Options,

    /// Session options
    pub session: SessionOptions,

    /// Write the full log here when the run ends
    pub export_logs: Option<PathBuf>,

    /// Stop once the deployment can no longer change
    pub exit_when_settled: bool,

    /// Read Enter presses from stdin as live-tail toggles
    pub interactive: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            deployment_id: None,
            simulation: simulation::Options::default(),
            session: SessionOptions::default(),
            export_logs: None,
            exit_when_settled: true,
            interactive: true,
        }
    }
}

impl AppOptions {
    /// Build options from a validated settings file
    pub fn from_settings(settings: &Settings) -> Result<Self, SimError> {
        settings.validate()?;

        let sim = &settings.simulation;
        Ok(Self {
            simulation: simulation::Options {
                advance_interval: Duration::from_millis(settings.timing.advance_interval_ms),
                emit_interval: Duration::from_millis(settings.timing.emit_interval_ms),
                ..Default::default()
            },
            session: SessionOptions {
                advance: AdvancePolicy {
                    duration_secs: sim.step_duration_min_secs..sim.step_duration_max_secs,
                    failure: sim.failure.clone(),
                },
                catalog: sim.log_catalog.clone(),
                live_tail: sim.live_tail,
                auto_scroll: sim.auto_scroll,
                rng_seed: sim.rng_seed,
            },
            ..Default::default()
        })
    }
}
