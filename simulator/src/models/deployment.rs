//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SimError;

/// Overall deployment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    #[default]
    Pending,
    Building,
    Deploying,
    Healthy,
    Error,
    Paused,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Building => "building",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Healthy => "healthy",
            DeploymentStatus::Error => "error",
            DeploymentStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single deployment step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,

    /// Only reachable through a failure policy
    Error,
}

/// One phase of a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStep {
    /// Stable key
    pub name: String,

    /// Human readable label
    pub display_name: String,

    #[serde(default)]
    pub status: StepStatus,

    /// Seconds taken, set once on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    /// Static log lines shipped with the seed
    #[serde(default)]
    pub logs: Vec<String>,
}

impl DeploymentStep {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, status: StepStatus) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            status,
            duration: None,
            logs: Vec::new(),
        }
    }
}

/// A deployment record as found in the dashboard fixtures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSeed {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub status: DeploymentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub commit: String,

    #[serde(default)]
    pub commit_message: String,

    #[serde(default)]
    pub author: String,

    /// Index of the active step; derived from the step statuses when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<usize>,

    #[serde(default)]
    pub steps: Vec<DeploymentStep>,
}

impl DeploymentSeed {
    /// Parse a single seed record
    pub fn from_json(contents: &str) -> Result<Self, SimError> {
        serde_json::from_str(contents).map_err(|e| SimError::InvalidSeed(e.to_string()))
    }
}

/// Contents of a seed file: one record or a list of them
///
/// Records stay as raw JSON until one is picked, so a malformed record
/// only fails when it is the one selected.
#[derive(Debug, Clone)]
pub struct SeedCatalog {
    records: Vec<Value>,
}

impl SeedCatalog {
    pub fn from_json(contents: &str) -> Result<Self, SimError> {
        let value: Value =
            serde_json::from_str(contents).map_err(|e| SimError::InvalidSeed(e.to_string()))?;
        let records = match value {
            Value::Array(records) => records,
            record @ Value::Object(_) => vec![record],
            _ => {
                return Err(SimError::InvalidSeed(
                    "expected a deployment object or an array of them".to_string(),
                ))
            }
        };
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pick a record by id, falling back to the first one
    pub fn select(self, id: Option<&str>) -> Result<DeploymentSeed, SimError> {
        let mut records = self.records;
        if records.is_empty() {
            return Err(SimError::NotFound("seed file holds no deployments".to_string()));
        }

        let pos = id
            .and_then(|id| {
                records
                    .iter()
                    .position(|r| r.get("id").and_then(Value::as_str) == Some(id))
            })
            .unwrap_or(0);
        let record = records.swap_remove(pos);

        let label = record
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| format!("record {pos}"), |id| id.to_string());
        serde_json::from_value(record)
            .map_err(|e| SimError::InvalidSeed(format!("deployment {label}: {e}")))
    }
}
