// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! busline-agent: runs a session against a real backend from the terminal.
//!
//! Reads lifecycle and rider commands from stdin and logs what the session
//! sees. Useful for exercising a deployment without a mobile client.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod config;
mod console;
mod error;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use busline::{
    AppState, Collaborators, LifecycleBridge, Notice, SessionCoordinator, WebSocketTransport,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::console::{ConsoleCommand, HELP};
use crate::services::{ConfiguredIdentity, FixedPosition, HttpDirectory};

#[derive(Parser)]
#[command(name = "busline-agent")]
#[command(about = "Run a real-time transit session from the terminal")]
struct Args {
    /// Path to the agent configuration file
    #[arg(short, long, default_value = "busline.toml")]
    config: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> error::Result<()> {
    let config = AgentConfig::load(&args.config)?;

    let coordinator = SessionCoordinator::new(
        config.session.clone(),
        Collaborators {
            identity: Arc::new(ConfiguredIdentity::new(&config.identity)),
            directory: Arc::new(HttpDirectory::new(config.directory.clone())?),
            provider: Arc::new(FixedPosition::new(config.position)),
            transport: WebSocketTransport::factory(),
        },
    );

    let _status = coordinator.subscribe(|open| {
        if open {
            info!("connected");
        } else {
            warn!("disconnected");
        }
    });
    spawn_observers(&coordinator);

    if !coordinator.initialize().await {
        warn!("session not started; use 'restart' to retry");
    }

    let bridge = LifecycleBridge::spawn(coordinator.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read stdin");
                    break;
                }
            },
        };

        match console::parse(&line) {
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => execute(&coordinator, &bridge, command).await,
            Ok(None) => {}
            Err(message) => println!("{}", message),
        }
    }

    drop(bridge);
    coordinator.cleanup().await;
    info!("agent stopped");
    Ok(())
}

async fn execute(
    coordinator: &SessionCoordinator,
    bridge: &LifecycleBridge,
    command: ConsoleCommand,
) {
    match command {
        ConsoleCommand::Lifecycle(state) => {
            // Also revives a session that gave up while already in the foreground
            if state == AppState::Foreground {
                coordinator.ensure_active();
            }
            bridge.report(state);
        }
        ConsoleCommand::Restart => {
            if !coordinator.restart().await {
                println!("restart failed: identity unavailable");
            }
        }
        ConsoleCommand::Status => {
            let identity = coordinator
                .identity()
                .map(|identity| identity.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{} ({}), app {:?}, {} vehicles",
                coordinator.connection_state(),
                identity,
                bridge.state(),
                coordinator.positions().len()
            );
        }
        ConsoleCommand::Vehicles => {
            for vehicle in coordinator.positions().snapshot().values() {
                println!(
                    "{:<12} {:<8} {:>10.5} {:>11.5}",
                    vehicle.vehicle_id,
                    vehicle.display_id.as_deref().unwrap_or("-"),
                    vehicle.latitude,
                    vehicle.longitude
                );
            }
        }
        ConsoleCommand::Boarding { vehicle_id, action } => {
            if !coordinator.send_boarding_action(&vehicle_id, action) {
                println!("not connected");
            }
        }
        ConsoleCommand::Query(vehicle_id) => {
            if !coordinator.query_status(vehicle_id) {
                println!("not connected");
            }
        }
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => {}
    }
}

/// Logs table sizes and notices as they change.
fn spawn_observers(coordinator: &SessionCoordinator) {
    let mut positions = coordinator.positions().watch();
    tokio::spawn(async move {
        while positions.changed().await.is_ok() {
            let count = positions.borrow_and_update().len();
            info!(vehicles = count, "position table updated");
        }
    });

    let mut notices = coordinator.notices();
    tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(Notice::Boarding(status)) => {
                    println!("boarding: {:?} on {}", status.state, status.vehicle_id);
                }
                Ok(Notice::ReconnectFailed { attempts }) => {
                    println!(
                        "gave up reconnecting after {} attempts; use 'fg' or 'restart'",
                        attempts
                    );
                }
                Ok(Notice::ServerError(message)) => println!("server error: {}", message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed notices");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
