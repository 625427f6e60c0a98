// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod check_config;
pub mod map;
pub mod status;
pub mod watch;

use std::path::Path;
use telemetry_runtime::TelemetryConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file, or the built-in defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<TelemetryConfig> {
    match path {
        Some(path) => {
            let config = TelemetryConfig::from_file(path)?;
            tracing::info!("loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            tracing::info!("no --config given; using built-in defaults");
            Ok(TelemetryConfig::default())
        }
    }
}

/// Creates a visual ratio bar (0.0-1.0 scale).
pub fn ratio_bar(ratio: f64) -> String {
    let filled = (ratio * 20.0).round().clamp(0.0, 20.0) as usize;
    let empty = 20 - filled;
    let symbol = if ratio >= 0.9 {
        "#"
    } else if ratio >= 0.7 {
        "="
    } else {
        "-"
    };
    format!("[{}{}]", symbol.repeat(filled), ".".repeat(empty))
}
