//! Error types for the deployment simulator

use thiserror::Error;

/// Main error type for the deployment simulator
#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Simulation stopped: {0}")]
    SimulationStopped(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
