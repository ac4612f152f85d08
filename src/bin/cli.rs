// src/bin/cli.rs

//! member-sync CLI
//!
//! Loads the TOML configuration, then either runs the sync scheduler until
//! interrupted or performs a single cycle.

use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use member_sync::{
    error::Result,
    models::{Config, LogLevel},
    pipeline::{Scheduler, SyncService},
};
use tokio_util::sync::CancellationToken;

/// member-sync - Memberful to Intercom/WordPress sync
#[derive(Parser, Debug)]
#[command(
    name = "member-sync",
    version,
    about = "Synchronizes Memberful members into Intercom and WordPress"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run sync cycles on the configured cadence until interrupted (default)
    Run,

    /// Run a single sync cycle and exit
    Once,

    /// Validate the configuration file
    Validate,
}

/// Print a startup failure and exit non-zero.
fn fail_startup(messages: &[String]) -> ! {
    for message in messages {
        eprintln!("Server failed to start! {message} ...");
    }
    process::exit(1);
}

/// Initialize logging with timestamps in the configured time zone.
fn init_logging(level: LogLevel, time_zone: Tz) {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("member_sync", level.level_filter())
        .format(move |buf, record| {
            let now = Utc::now().with_timezone(&time_zone);
            writeln!(
                buf,
                "{} - {} - {} ...",
                now.format("%Y-%m-%d %H:%M:%S %Z"),
                record.level(),
                record.args()
            )
        })
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => fail_startup(&[format!(
            "could not load {}: {}",
            cli.config.display(),
            e
        )]),
    };

    let violations = config.violations();
    if !violations.is_empty() {
        fail_startup(&violations);
    }

    init_logging(config.log_level()?, config.time_zone()?);

    match cli.command.unwrap_or(Command::Run) {
        Command::Validate => {
            log::info!("Configuration OK ({})", cli.config.display());
        }

        Command::Once => {
            let service = SyncService::from_config(&config)?;
            let result = service.run_cycle().await;
            log::info!(
                "Single cycle finished ({} members, {} failed jobs)",
                result.members_fetched,
                result.failed()
            );
        }

        Command::Run => {
            let service = Arc::new(SyncService::from_config(&config)?);
            let scheduler = Scheduler::new(config.sync_interval());
            let shutdown = CancellationToken::new();

            println!("Server is ready! Starting sync processes ...");

            let job = move || {
                let service = Arc::clone(&service);
                async move {
                    service.run_cycle().await;
                }
            };

            let runner = {
                let shutdown = shutdown.clone();
                tokio::spawn(async move { scheduler.run(job, shutdown).await })
            };

            tokio::signal::ctrl_c().await?;
            println!("Stopping server ...");
            shutdown.cancel();
            let _ = runner.await;
        }
    }

    Ok(())
}
