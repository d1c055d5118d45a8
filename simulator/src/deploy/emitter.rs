//! Synthetic log emission
//!
//! Periodic filler lines and step transition lines share one append-only
//! log. Emission order is the display order; timestamps are clamped so they
//! never run backwards.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::trace;

use crate::models::deployment::DeploymentStep;
use crate::models::log::LogEntry;

/// Canned lines for periodic emission
pub const DEFAULT_CATALOG: &[&str] = &[
    "Fetching dependencies...",
    "Installing packages...",
    "Building assets...",
    "Optimizing bundle...",
    "Running tests...",
    "Deploying to infrastructure...",
    "Configuring network routes...",
    "Health check passed ✓",
];

/// How far back seed lines are placed relative to load time
const SEED_BACKDATE_SECS: i64 = 5 * 60;

/// Append-only log plus the generator feeding it
#[derive(Debug, Clone)]
pub struct LogEmitter {
    entries: Vec<LogEntry>,
    catalog: Vec<String>,
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl LogEmitter {
    pub fn new(catalog: Vec<String>) -> Self {
        let catalog = if catalog.is_empty() {
            DEFAULT_CATALOG.iter().map(|s| s.to_string()).collect()
        } else {
            catalog
        };
        Self {
            entries: Vec::new(),
            catalog,
            next_seq: 0,
            last_timestamp: None,
        }
    }

    /// Load the static lines of every step, one second apart, ending
    /// shortly before `now`
    pub fn seed(&mut self, steps: &[DeploymentStep], now: DateTime<Utc>) {
        let start = now - Duration::seconds(SEED_BACKDATE_SECS);
        let mut offset = 0;
        for (step_index, step) in steps.iter().enumerate() {
            for (line_index, line) in step.logs.iter().enumerate() {
                let id = format!("seed-{step_index}-{line_index}");
                let at = start + Duration::seconds(offset);
                self.push(id, at, &step.name, line.clone());
                offset += 1;
            }
        }
    }

    /// Append one random catalog line tagged with `step_name`
    pub fn emit_periodic<R: Rng + ?Sized>(
        &mut self,
        step_name: &str,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> &LogEntry {
        let message = self.catalog[rng.random_range(0..self.catalog.len())].clone();
        let id = self.next_id("log");
        self.push(id, now, step_name, message)
    }

    /// Append the line announcing that `step` became active
    pub fn emit_on_transition(&mut self, step: &DeploymentStep, now: DateTime<Utc>) -> &LogEntry {
        let id = self.next_id("sim");
        self.push(id, now, &step.name, format!("Starting {}...", step.display_name))
    }

    /// Append the line announcing that `step` failed
    pub fn emit_on_failure(&mut self, step: &DeploymentStep, now: DateTime<Utc>) -> &LogEntry {
        let id = self.next_id("sim");
        self.push(id, now, &step.name, format!("{} failed", step.display_name))
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_seq += 1;
        format!("{prefix}-{}", self.next_seq)
    }

    fn push(&mut self, id: String, at: DateTime<Utc>, step: &str, message: String) -> &LogEntry {
        let timestamp = match self.last_timestamp {
            Some(last) if at < last => last,
            _ => at,
        };
        self.last_timestamp = Some(timestamp);

        trace!("log {} [{}] {}", id, step, message);
        self.entries.push(LogEntry {
            id,
            timestamp,
            step: step.to_string(),
            message,
        });
        &self.entries[self.entries.len() - 1]
    }
}

impl Default for LogEmitter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
