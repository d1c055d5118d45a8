//! Ordered step sequence and its transitions

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::SimError;
use crate::models::deployment::{DeploymentStep, StepStatus};

/// When a completing step should fail instead
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Every step succeeds
    #[default]
    Never,

    /// The named step always fails
    AtStep { name: String },

    /// Each completion fails with the given probability
    Random { probability: f64 },
}

impl FailurePolicy {
    fn should_fail<R: Rng + ?Sized>(&self, step: &DeploymentStep, rng: &mut R) -> bool {
        match self {
            FailurePolicy::Never => false,
            FailurePolicy::AtStep { name } => step.name == *name,
            FailurePolicy::Random { probability } if probability.is_finite() => {
                rng.random_bool(probability.clamp(0.0, 1.0))
            }
            // NaN or infinite: no failures
            FailurePolicy::Random { .. } => false,
        }
    }
}

/// Cosmetic knobs applied when a step finishes
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancePolicy {
    /// Range the random step duration (seconds) is drawn from
    pub duration_secs: Range<u32>,

    pub failure: FailurePolicy,
}

impl Default for AdvancePolicy {
    fn default() -> Self {
        Self {
            duration_secs: 20..50,
            failure: FailurePolicy::Never,
        }
    }
}

/// Result of a single `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The step at this index became active
    Started(usize),

    /// The last step completed
    Finished,

    /// The step at this index failed and the sequence halted
    Failed(usize),

    /// Nothing changed
    Unchanged,
}

/// Completion summary, as shown by a progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Ordered steps plus the pointer to the active one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSequence {
    steps: Vec<DeploymentStep>,
    current: usize,
}

impl StepSequence {
    /// Build a sequence positioned at `current`
    pub fn new(steps: Vec<DeploymentStep>, current: usize) -> Result<Self, SimError> {
        if steps.is_empty() {
            return Err(SimError::OutOfRange("step sequence is empty".to_string()));
        }
        if current >= steps.len() {
            return Err(SimError::OutOfRange(format!(
                "current step {} is outside 0..{}",
                current,
                steps.len()
            )));
        }
        Ok(Self { steps, current })
    }

    pub fn steps(&self) -> &[DeploymentStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Step at the current index
    pub fn current_step(&self) -> Result<&DeploymentStep, SimError> {
        self.steps
            .get(self.current)
            .ok_or_else(|| SimError::OutOfRange(format!("no step at index {}", self.current)))
    }

    pub fn is_complete(&self) -> bool {
        self.current + 1 == self.steps.len()
            && self.steps[self.current].status == StepStatus::Completed
    }

    /// True once a step has failed
    pub fn is_halted(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Error)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_halted()
    }

    /// Move the sequence forward by one transition
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, policy: &AdvancePolicy) -> Transition {
        if self.is_terminal() {
            return Transition::Unchanged;
        }

        let index = self.current;
        match self.steps[index].status {
            StepStatus::Pending => {
                self.steps[index].status = StepStatus::InProgress;
                return Transition::Started(index);
            }
            StepStatus::InProgress => {
                let duration = draw_duration(rng, &policy.duration_secs);
                let step = &mut self.steps[index];
                step.duration = Some(duration);
                if policy.failure.should_fail(step, rng) {
                    step.status = StepStatus::Error;
                    return Transition::Failed(index);
                }
                step.status = StepStatus::Completed;
            }
            StepStatus::Completed | StepStatus::Error => {}
        }

        if index + 1 < self.steps.len() {
            self.steps[index + 1].status = StepStatus::InProgress;
            self.current = index + 1;
            Transition::Started(index + 1)
        } else {
            Transition::Finished
        }
    }

    pub fn progress(&self) -> Progress {
        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        let total = self.steps.len();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Progress {
            completed,
            total,
            percent,
        }
    }
}

fn draw_duration<R: Rng + ?Sized>(rng: &mut R, range: &Range<u32>) -> u32 {
    if range.is_empty() {
        range.start
    } else {
        rng.random_range(range.clone())
    }
}
