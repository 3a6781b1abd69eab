// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Reglib CLI
//!
//! Command-line interface for loading, checking, and running register
//! machine files.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "reglib")]
#[command(author, version, about = "Register-machine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a machine file to completion
    Run {
        /// Machine file to load (JSON)
        #[arg(value_name = "MACHINE_FILE")]
        machine_file: PathBuf,

        /// Override a register before the run, `index=value` (repeatable)
        #[arg(long = "set", value_name = "INDEX=VALUE")]
        registers: Vec<String>,

        /// Step on the play-speed timer instead of as fast as possible
        #[arg(long)]
        realtime: bool,

        /// Play speed for --realtime (0 = slowest, 8 = fastest)
        #[arg(long, default_value = "8")]
        speed: u8,

        /// Abort after this many steps (machines can loop forever)
        #[arg(long, default_value = "100000")]
        max_steps: usize,
    },

    /// Check a machine file for structural errors
    Check {
        /// Machine file to load (JSON)
        #[arg(value_name = "MACHINE_FILE")]
        machine_file: PathBuf,
    },

    /// Export the machine graph
    Graph {
        /// Machine file to load (JSON)
        #[arg(value_name = "MACHINE_FILE")]
        machine_file: PathBuf,

        /// Output format (dot or json)
        #[arg(long, default_value = "dot")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().expect("valid default filter")),
        )
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            machine_file,
            registers,
            realtime,
            speed,
            max_steps,
        } => commands::run::execute(machine_file, registers, realtime, speed, max_steps).await,
        Commands::Check { machine_file } => commands::check::execute(machine_file),
        Commands::Graph {
            machine_file,
            format,
        } => commands::graph::execute(machine_file, &format),
    }
}
