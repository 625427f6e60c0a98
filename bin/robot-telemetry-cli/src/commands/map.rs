// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `robot-telemetry map` command: offline mapping of a captured state.
//!
//! Accepts a JSON object with any subset of `temperature_c`, `soc_pct`,
//! `cpu_util_pct`, `gpu_util_pct`, `speed_mps`, `cpu_freq_mhz`,
//! `gpu_freq_mhz`, `terrain` and `slope` (short aliases such as
//! `temperature` and `soc` are accepted too).

use super::load_config;
use platform_bounds::PlatformBounds;
use semantic_map::{RawState, SemanticMapper, TelemetryReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn execute(
    config: Option<&Path>,
    state: PathBuf,
    bounds: Option<PathBuf>,
    summary: bool,
) -> anyhow::Result<()> {
    let bounds = match bounds {
        Some(path) => PlatformBounds::from_file(&path)?,
        None => load_config(config)?.bounds,
    };

    let content = std::fs::read_to_string(&state)
        .map_err(|e| anyhow::anyhow!("cannot read state '{}': {e}", state.display()))?;
    let raw: RawState = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("invalid state '{}': {e}", state.display()))?;

    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mapper = SemanticMapper::new(Arc::new(bounds));
    let report = TelemetryReport::assemble(&raw, &mapper, timestamp_ms);

    if summary {
        println!("{}", report.summary());
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
