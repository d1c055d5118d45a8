//! Deployment Simulator - Entry Point
//!
//! Plays back a deployment seed record in the terminal with simulated step
//! progression and live log tailing. Press Enter to pause or resume.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use deploysim::app::options::AppOptions;
use deploysim::app::run::run;
use deploysim::filesys::file::File;
use deploysim::logs::{init_logging, LogLevel, LogOptions};
use deploysim::storage::settings::Settings;
use deploysim::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{version}"),
            Err(e) => eprintln!("Failed to render version info: {e}"),
        }
        return;
    }

    let Some(seed_path) = cli_args.get("seed") else {
        eprintln!("Usage: deploysim --seed=<file> [--deployment=<id>] [--settings=<file>] [--rng-seed=<n>] [--log-level=<level>] [--export-logs=<file>] [--no-input]");
        std::process::exit(2);
    };

    // Retrieve the settings file
    let mut settings = match cli_args.get("settings") {
        Some(path) => match File::new(path).read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    if let Some(level) = cli_args.get("log-level") {
        match level.parse::<LogLevel>() {
            Ok(level) => settings.log_level = level,
            Err(e) => eprintln!("{e}, keeping {:?}", settings.log_level),
        }
    }
    if let Some(value) = cli_args.get("rng-seed") {
        match value.parse::<u64>() {
            Ok(seed) => settings.simulation.rng_seed = Some(seed),
            Err(e) => eprintln!("Ignoring --rng-seed={value}: {e}"),
        }
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir: settings.log_dir.clone(),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let mut options = match AppOptions::from_settings(&settings) {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid settings: {e}");
            eprintln!("Invalid settings: {e}");
            std::process::exit(1);
        }
    };
    options.deployment_id = cli_args.get("deployment").cloned();
    options.export_logs = cli_args.get("export-logs").map(PathBuf::from);
    options.interactive = !cli_args.contains_key("no-input");

    info!("Running deployment simulator with options: {:?}", options);
    let seed_file = File::new(seed_path);
    match run(&seed_file, options, std::io::stdout(), await_shutdown_signal()).await {
        Ok(snapshot) => {
            info!(
                "Simulation ended: deployment {} is {}",
                snapshot.deployment.id, snapshot.deployment.status
            );
        }
        Err(e) => {
            error!("Simulation failed: {e}");
            eprintln!("Simulation failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Unable to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
