// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsproxyd`: the workspace access gateway.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wsp_daemon::config::Config;
use wsp_daemon::{env, lifecycle};

#[derive(Parser, Debug)]
#[command(name = "wsproxyd", version, about = "Workspace access gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the gateway
    Run {
        /// Config file (falls back to WSP_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate the config file and exit
    Validate {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn config_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    flag.or_else(env::config_path).context("no config file: pass --config or set WSP_CONFIG")
}

fn init_tracing() {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env::log_filter()))
        .with_target(true);
    if env::log_json() {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Validate { config } => {
            let path = config_path(config)?;
            Config::load(&path).with_context(|| format!("invalid config {}", path.display()))?;
            println!("{}: ok", path.display());
        }
        Command::Run { config } => {
            let path = config_path(config)?;
            let config = Config::load(&path)?;
            let daemon = lifecycle::startup(config)?;

            let shutdown = daemon.shutdown_token();
            tokio::spawn(async move {
                lifecycle::shutdown_signal().await;
                shutdown.cancel();
            });
            daemon.serve().await?;
        }
    }
    Ok(())
}
