//! Terminal rendering of a running simulation

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use crate::deploy::session::SessionSnapshot;
use crate::deploy::steps::Progress;
use crate::models::deployment::{DeploymentStatus, DeploymentStep, StepStatus};
use crate::models::log::LogEntry;

/// Local wall-clock time, `HH:MM:SS`
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "{} {}: {}",
        format!("[{}]", format_time(&entry.timestamp)).dimmed(),
        entry.step.green(),
        entry.message
    )
}

pub fn format_progress(progress: &Progress) -> String {
    format!(
        "Progress: {} of {} steps completed ({}%)",
        progress.completed, progress.total, progress.percent
    )
}

pub fn format_step(step: &DeploymentStep) -> String {
    let line = match step.status {
        StepStatus::Completed => format!("{} {}", "✓".green(), step.display_name),
        StepStatus::InProgress => format!("{} {}", "⟳".yellow(), step.display_name.bold()),
        StepStatus::Pending => format!("{} {}", "○".dimmed(), step.display_name.dimmed()),
        StepStatus::Error => format!("{} {}", "✗".red(), step.display_name.red()),
    };
    match step.duration {
        Some(secs) => format!("{line} (completed in {secs}s)"),
        None => line,
    }
}

pub fn format_status(status: DeploymentStatus) -> String {
    let label = status.as_str().to_uppercase();
    match status {
        DeploymentStatus::Healthy => label.green().to_string(),
        DeploymentStatus::Deploying => label.yellow().to_string(),
        DeploymentStatus::Building => label.blue().to_string(),
        DeploymentStatus::Error => label.red().to_string(),
        DeploymentStatus::Paused | DeploymentStatus::Pending => label.dimmed().to_string(),
    }
}

/// Prints new log lines and step changes as snapshots arrive
pub struct ConsoleRenderer<W: Write> {
    out: W,
    printed: usize,
    last_step: Option<usize>,
    last_status: Option<DeploymentStatus>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: 0,
            last_step: None,
            last_status: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Deployment header and timeline
    pub fn header(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let deployment = &snapshot.deployment;
        let number = deployment
            .id
            .split_once('_')
            .map_or(deployment.id.as_str(), |(_, n)| n);

        writeln!(self.out, "{}", format!("Deployment #{number}").bold())?;
        let started = deployment
            .started_at
            .as_ref()
            .map_or_else(|| "-".to_string(), format_time);
        writeln!(
            self.out,
            "Started {} • {} • {}",
            started, deployment.commit, deployment.author
        )?;
        if !deployment.commit_message.is_empty() {
            writeln!(self.out, "{}", deployment.commit_message)?;
        }
        writeln!(self.out)?;
        for step in deployment.steps.steps() {
            writeln!(self.out, "  {}", format_step(step))?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Render whatever changed since the previous snapshot
    ///
    /// Nothing new is printed while live-tail is paused. With auto-scroll
    /// on, lines are printed as they arrive; with it off they are held and
    /// printed in a batch when the step or status changes, or on
    /// `flush_logs`.
    pub fn render(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        let deployment = &snapshot.deployment;
        let index = deployment.steps.current_index();
        let changed = self.last_step != Some(index) || self.last_status != Some(deployment.status);

        if snapshot.live_tail.should_auto_scroll() || (changed && snapshot.live_tail.is_enabled()) {
            self.print_logs(snapshot)?;
        }

        if changed {
            if let Some(step) = deployment.steps.steps().get(index) {
                writeln!(
                    self.out,
                    "{}  {}  [{}]",
                    format_progress(&snapshot.progress),
                    format_step(step),
                    format_status(deployment.status)
                )?;
            }
            self.last_step = Some(index);
            self.last_status = Some(deployment.status);
        }

        self.out.flush()
    }

    /// Print every line not shown yet
    pub fn flush_logs(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        self.print_logs(snapshot)?;
        self.out.flush()
    }

    fn print_logs(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        for entry in snapshot.logs.iter().skip(self.printed) {
            writeln!(self.out, "{}", format_entry(entry))?;
        }
        self.printed = self.printed.max(snapshot.logs.len());
        Ok(())
    }

    pub fn live_tail(&mut self, enabled: bool) -> io::Result<()> {
        let label = if enabled {
            "● Live Tail".green()
        } else {
            "○ Paused".dimmed()
        };
        writeln!(self.out, "{label}")?;
        self.out.flush()
    }
}
