//! Live deployment state built from a seed record

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::deploy::steps::{Progress, StepSequence};
use crate::errors::SimError;
use crate::models::deployment::{DeploymentSeed, DeploymentStatus, DeploymentStep, StepStatus};

/// Overall status as a pure function of step statuses
pub fn derive_status(steps: &[DeploymentStep]) -> DeploymentStatus {
    if steps.iter().any(|s| s.status == StepStatus::Error) {
        DeploymentStatus::Error
    } else if !steps.is_empty() && steps.iter().all(|s| s.status == StepStatus::Completed) {
        DeploymentStatus::Healthy
    } else if steps.iter().any(|s| s.status == StepStatus::InProgress) {
        DeploymentStatus::Deploying
    } else {
        DeploymentStatus::Pending
    }
}

/// A deployment being simulated
#[derive(Debug, Clone, Serialize)]
pub struct Deployment {
    pub id: String,
    pub status: DeploymentStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub commit: String,
    pub commit_message: String,
    pub author: String,
    pub steps: StepSequence,
}

impl Deployment {
    /// Validate a seed record and build the deployment from it
    pub fn from_seed(seed: DeploymentSeed) -> Result<Self, SimError> {
        let index = validate_seed(&seed)?;

        let steps = StepSequence::new(seed.steps, index)?;
        Ok(Self {
            id: seed.id,
            status: seed.status,
            started_at: seed.started_at,
            commit: seed.commit,
            commit_message: seed.commit_message,
            author: seed.author,
            steps,
        })
    }

    /// Recompute `status` from the steps
    pub fn refresh_status(&mut self) -> DeploymentStatus {
        self.status = derive_status(self.steps.steps());
        self.status
    }

    pub fn progress(&self) -> Progress {
        self.steps.progress()
    }
}

/// Active step of a seed. An explicit `currentStep` wins unless it is 0,
/// which is also what older fixtures write for a run loaded mid-flight; in
/// that case, and when the key is missing, it is the first step that has
/// not completed.
fn active_index(seed: &DeploymentSeed) -> usize {
    let first_open = seed
        .steps
        .iter()
        .position(|s| s.status != StepStatus::Completed)
        .unwrap_or(seed.steps.len().saturating_sub(1));
    match seed.current_step {
        None | Some(0) => first_open,
        Some(index) => index,
    }
}

/// Check a seed record and return the index of its active step
fn validate_seed(seed: &DeploymentSeed) -> Result<usize, SimError> {
    if seed.id.trim().is_empty() {
        return Err(SimError::InvalidSeed("deployment id is missing".to_string()));
    }
    if seed.steps.is_empty() {
        return Err(SimError::InvalidSeed(format!(
            "deployment {} has no steps",
            seed.id
        )));
    }

    let current = active_index(seed);
    if current >= seed.steps.len() {
        return Err(SimError::OutOfRange(format!(
            "current step {} is outside 0..{}",
            current,
            seed.steps.len()
        )));
    }

    let mut names = HashSet::new();
    for step in &seed.steps {
        if step.name.trim().is_empty() {
            return Err(SimError::InvalidSeed("step name is missing".to_string()));
        }
        if !names.insert(step.name.as_str()) {
            return Err(SimError::InvalidSeed(format!("duplicate step name {}", step.name)));
        }
    }

    for (index, step) in seed.steps.iter().enumerate() {
        let ok = if index < current {
            step.status == StepStatus::Completed
        } else if index > current {
            step.status == StepStatus::Pending
        } else {
            true
        };
        if !ok {
            return Err(SimError::InvalidSeed(format!(
                "step {} is {:?} but the active step is {}",
                step.name, step.status, current
            )));
        }
    }

    Ok(current)
}
