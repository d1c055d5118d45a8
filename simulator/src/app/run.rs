//! Main application run loop

use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::app::options::AppOptions;
use crate::app::render::ConsoleRenderer;
use crate::deploy::clock::SystemClock;
use crate::deploy::session::{DeploymentSession, SessionSnapshot};
use crate::errors::SimError;
use crate::filesys::file::File;
use crate::models::deployment::SeedCatalog;
use crate::workers::simulation::SimulationHandle;

/// Load a seed file and run the simulation until it settles or
/// `shutdown_signal` fires
pub async fn run<W: Write>(
    seed_file: &File,
    options: AppOptions,
    out: W,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<SessionSnapshot, SimError> {
    info!("Loading seed file {}...", seed_file.path().display());
    let catalog = SeedCatalog::from_json(&seed_file.read_string().await?)?;
    let seed = catalog.select(options.deployment_id.as_deref())?;

    // Invalid seeds stop here, before any timer exists
    let session = DeploymentSession::new(seed, options.session.clone(), Arc::new(SystemClock))?;

    let toggles = if options.interactive {
        spawn_toggle_reader()
    } else {
        let (_tx, rx) = mpsc::channel(1);
        rx
    };

    let handle = SimulationHandle::spawn(options.simulation.clone(), session);
    let result = drive(&handle, &options, out, toggles, shutdown_signal).await;

    let snapshot = handle.snapshot();
    if let Err(e) = handle.shutdown().await {
        error!("Simulation worker did not stop cleanly: {}", e);
    }
    result?;

    if let Some(path) = &options.export_logs {
        let file = File::new(path);
        file.write_json(&snapshot.logs).await?;
        info!("Exported {} log lines to {}", snapshot.logs.len(), path.display());
    }

    Ok(snapshot)
}

async fn drive<W: Write>(
    handle: &SimulationHandle,
    options: &AppOptions,
    out: W,
    mut toggles: mpsc::Receiver<()>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SimError> {
    let mut renderer = ConsoleRenderer::new(out);
    let mut updates = handle.subscribe();

    let initial = updates.borrow_and_update().clone();
    renderer.header(&initial)?;
    renderer.render(&initial)?;
    if options.exit_when_settled && initial.is_settled() {
        info!("Deployment {} is {}, nothing to simulate", initial.deployment.id, initial.deployment.status);
        return Ok(());
    }

    tokio::pin!(shutdown_signal);
    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown signal received, stopping simulation...");
                let latest = handle.snapshot();
                if latest.live_tail.is_enabled() {
                    renderer.flush_logs(&latest)?;
                }
                return Ok(());
            }
            Some(()) = toggles.recv() => {
                let enabled = handle.toggle_live_tail().await?;
                renderer.live_tail(enabled)?;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Simulation worker exited unexpectedly");
                    return Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                renderer.render(&snapshot)?;
                if options.exit_when_settled && snapshot.advancer.is_terminal() {
                    info!("Deployment {} finished as {}", snapshot.deployment.id, snapshot.deployment.status);
                    return Ok(());
                }
            }
        }
    }
}

/// Each line read from stdin becomes one toggle request. The reader runs on
/// a plain thread so a pending read never holds up runtime shutdown.
fn spawn_toggle_reader() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(4);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.blocking_send(()).is_err() {
                break;
            }
        }
    });
    rx
}
