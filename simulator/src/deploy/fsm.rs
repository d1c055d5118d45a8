//! Finite State Machine for the progress advancer

use serde::{Deserialize, Serialize};

use crate::errors::SimError;

/// Advancer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancerState {
    /// Not ticking; resumable
    Idle,

    /// Ticking on the advance interval
    Running,

    /// Last step completed
    Completed,

    /// A step failed
    Failed,
}

impl AdvancerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AdvancerState::Completed | AdvancerState::Failed)
    }
}

/// Advancer event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvancerEvent {
    /// Live-tail on and the deployment is deploying
    Enable,

    /// Live-tail switched off
    Disable,

    /// One step transition happened
    Tick,

    /// The sequence is complete
    Finish,

    /// A step failed
    Fail(String),
}

/// Progress advancer FSM
#[derive(Debug, Clone)]
pub struct AdvancerFsm {
    state: AdvancerState,
    ticks: u64,
    error: Option<String>,
}

impl AdvancerFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: AdvancerState::Idle,
            ticks: 0,
            error: None,
        }
    }

    /// Create an FSM that has already reached the given state
    pub fn with_state(state: AdvancerState) -> Self {
        Self {
            state,
            ..Self::new()
        }
    }

    pub fn state(&self) -> AdvancerState {
        self.state
    }

    /// Number of ticks processed while running
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Name of the failed step, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: AdvancerEvent) -> Result<(), SimError> {
        let new_state = match (&self.state, &event) {
            // From Idle
            (AdvancerState::Idle, AdvancerEvent::Enable) => AdvancerState::Running,
            (AdvancerState::Idle, AdvancerEvent::Disable) => AdvancerState::Idle,

            // From Running
            (AdvancerState::Running, AdvancerEvent::Tick) => {
                self.ticks += 1;
                AdvancerState::Running
            }
            (AdvancerState::Running, AdvancerEvent::Disable) => AdvancerState::Idle,
            (AdvancerState::Running, AdvancerEvent::Enable) => AdvancerState::Running,
            (AdvancerState::Running, AdvancerEvent::Finish) => AdvancerState::Completed,
            (AdvancerState::Running, AdvancerEvent::Fail(step)) => {
                self.error = Some(step.clone());
                AdvancerState::Failed
            }

            // Terminal states ignore the live-tail gate
            (AdvancerState::Completed, AdvancerEvent::Enable | AdvancerEvent::Disable) => {
                AdvancerState::Completed
            }
            (AdvancerState::Failed, AdvancerEvent::Enable | AdvancerEvent::Disable) => {
                AdvancerState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(SimError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for AdvancerFsm {
    fn default() -> Self {
        Self::new()
    }
}
