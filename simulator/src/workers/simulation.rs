//! Simulation worker
//!
//! Owns a `DeploymentSession` and drives it from two intervals on a single
//! task. The intervals exist only while the session is ticking: pausing
//! live-tail or reaching a terminal state drops them before the loop polls
//! again, and resuming creates fresh ones a full period out.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::deploy::session::{DeploymentSession, SessionSnapshot};
use crate::errors::SimError;

/// Simulation worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Period between step transitions
    pub advance_interval: Duration,

    /// Period between periodic log lines
    pub emit_interval: Duration,

    /// Capacity of the command channel
    pub command_buffer: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            advance_interval: Duration::from_secs(8),
            emit_interval: Duration::from_secs(3),
            command_buffer: 16,
        }
    }
}

/// Requests accepted by the worker
#[derive(Debug)]
pub enum Command {
    ToggleLiveTail { reply: oneshot::Sender<bool> },
    SetLiveTail { enabled: bool, reply: oneshot::Sender<bool> },
}

struct Timers {
    advance: Interval,
    emit: Interval,
}

impl Timers {
    fn start(options: &Options) -> Self {
        Self {
            advance: periodic(options.advance_interval),
            emit: periodic(options.emit_interval),
        }
    }
}

fn periodic(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Run the simulation worker
pub async fn run(
    options: &Options,
    mut session: DeploymentSession,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Simulation worker starting for session {}...", session.id());

    let mut timers: Option<Timers> = None;

    loop {
        if session.is_ticking() {
            if timers.is_none() {
                debug!("Starting simulation timers");
                timers = Some(Timers::start(options));
            }
        } else if timers.take().is_some() {
            debug!("Released simulation timers");
        }

        let (advance, emit) = match timers.as_mut() {
            Some(t) => (Some(&mut t.advance), Some(&mut t.emit)),
            None => (None, None),
        };

        tokio::select! {
            biased;

            _ = &mut shutdown_signal => {
                info!("Simulation worker shutting down...");
                return;
            }
            command = commands.recv() => {
                match command {
                    Some(command) => handle_command(&mut session, command),
                    None => {
                        info!("Simulation handle dropped, stopping worker...");
                        return;
                    }
                }
            }
            _ = next_tick(advance) => {
                session.on_advance_tick();
            }
            _ = next_tick(emit) => {
                session.on_emit_tick();
            }
        }

        snapshots.send_replace(session.snapshot());
    }
}

fn handle_command(session: &mut DeploymentSession, command: Command) {
    let (enabled, reply) = match command {
        Command::ToggleLiveTail { reply } => (session.toggle_live_tail(), reply),
        Command::SetLiveTail { enabled, reply } => (session.set_live_tail(enabled), reply),
    };
    if reply.send(enabled).is_err() {
        warn!("Live tail requester went away before the reply");
    }
}

/// Owned handle to a running simulation
///
/// Dropping the handle aborts the worker and every timer with it.
pub struct SimulationHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SimulationHandle {
    /// Spawn the worker on the current runtime
    pub fn spawn(options: Options, session: DeploymentSession) -> Self {
        let (command_tx, command_rx) = mpsc::channel(options.command_buffer.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            run(
                &options,
                session,
                command_rx,
                snapshot_tx,
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        });

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Flip live-tail; returns the new value
    pub async fn toggle_live_tail(&self) -> Result<bool, SimError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::ToggleLiveTail { reply }, rx).await
    }

    /// Set live-tail; returns the new value
    pub async fn set_live_tail(&self, enabled: bool) -> Result<bool, SimError> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::SetLiveTail { enabled, reply }, rx).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(mut self) -> Result<(), SimError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| SimError::SimulationStopped(e.to_string())),
            None => Ok(()),
        }
    }

    async fn request(
        &self,
        command: Command,
        rx: oneshot::Receiver<bool>,
    ) -> Result<bool, SimError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SimError::SimulationStopped("worker is not running".to_string()))?;
        rx.await
            .map_err(|_| SimError::SimulationStopped("worker dropped the request".to_string()))
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
