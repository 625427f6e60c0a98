// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `robot-telemetry watch` command: continuous polling until Ctrl-C.

use super::load_config;
use std::path::Path;
use telemetry_runtime::{Collector, EnvironmentContext, Sampler};

pub async fn execute(
    config: Option<&Path>,
    count: Option<u64>,
    json: bool,
    speed: Option<f64>,
    terrain: Option<String>,
    slope: Option<f64>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut collector = Collector::new(&config)?;
    if let Some(speed) = speed {
        collector.set_speed(speed)?;
    }
    collector.set_environment(EnvironmentContext { terrain, slope });

    let mut sampler = Sampler::new(collector, config.sample_period());
    if let Some(n) = count {
        sampler = sampler.with_max_ticks(n);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let metrics = sampler
        .run(shutdown, |frame| {
            if json {
                match serde_json::to_string(&frame.report) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!("cannot serialise report: {e}"),
                }
            } else {
                println!("{}", frame.report.summary());
            }
        })
        .await;

    if !json {
        eprintln!("{}", metrics.summary());
    }
    Ok(())
}
