//! Log entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single line of the deployment log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique within a session
    pub id: String,

    pub timestamp: DateTime<Utc>,

    /// Name of the step active when the line was emitted
    pub step: String,

    pub message: String,
}
