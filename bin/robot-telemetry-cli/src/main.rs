// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # robot-telemetry
//!
//! Command-line interface for the robot telemetry pipeline.
//!
//! ## Usage
//! ```bash
//! # One report from the live sensors
//! robot-telemetry --config robot.toml status
//!
//! # Poll until Ctrl-C, one JSON report per line
//! robot-telemetry watch --json --speed 1.2 --terrain gravel
//!
//! # Map a captured state vector offline
//! robot-telemetry map --state state.json
//!
//! # Validate a configuration and list degenerate bounds
//! robot-telemetry --config robot.toml check-config
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "robot-telemetry",
    about = "Power, motion and compute telemetry with semantic risk assessment",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (defaults describe a Jetson Orin NX robot).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample every sensor once and print the semantic report.
    Status {
        /// Print the full frame as JSON.
        #[arg(long)]
        json: bool,

        /// Commanded speed in m/s.
        #[arg(long, allow_negative_numbers = true)]
        speed: Option<f64>,
    },

    /// Poll at the configured period until Ctrl-C.
    Watch {
        /// Stop after this many ticks.
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Print one JSON report per line instead of a summary.
        #[arg(long)]
        json: bool,

        /// Commanded speed in m/s.
        #[arg(long, allow_negative_numbers = true)]
        speed: Option<f64>,

        /// Terrain description copied into each report.
        #[arg(long)]
        terrain: Option<String>,

        /// Ground slope in degrees.
        #[arg(long, allow_negative_numbers = true)]
        slope: Option<f64>,
    },

    /// Map a raw state vector (JSON) to a report without touching sensors.
    Map {
        /// JSON file holding the raw state.
        #[arg(short, long)]
        state: std::path::PathBuf,

        /// Bounds-only TOML file (overrides the `[bounds]` section of --config).
        #[arg(short, long)]
        bounds: Option<std::path::PathBuf>,

        /// Print a one-line summary instead of JSON.
        #[arg(long)]
        summary: bool,
    },

    /// Validate the configuration and print it with defaults filled in.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Status { json, speed } => commands::status::execute(config, json, speed).await,
        Commands::Watch {
            count,
            json,
            speed,
            terrain,
            slope,
        } => commands::watch::execute(config, count, json, speed, terrain, slope).await,
        Commands::Map {
            state,
            bounds,
            summary,
        } => commands::map::execute(config, state, bounds, summary),
        Commands::CheckConfig => commands::check_config::execute(config),
    }
}
