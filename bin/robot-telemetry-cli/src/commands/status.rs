// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `robot-telemetry status` command: one semantic report from live sensors.
//!
//! Two ticks are taken half a second apart so CPU usage (a counter delta)
//! is available. On hosts without the configured sensors the affected
//! channels show `n/a`; the command still works.

use super::{load_config, ratio_bar};
use semantic_map::SemanticValue;
use std::path::Path;
use std::time::Duration;
use telemetry_runtime::Collector;

const SETTLE: Duration = Duration::from_millis(500);

pub async fn execute(config: Option<&Path>, json: bool, speed: Option<f64>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut collector = Collector::new(&config)?;
    if let Some(speed) = speed {
        collector.set_speed(speed)?;
    }

    collector.tick();
    tokio::time::sleep(SETTLE).await;
    let frame = collector.tick();

    if json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║         robot-telemetry · Platform Status           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let report = &frame.report;

    // ── Environment ────────────────────────────────────────────
    println!("  Environment");
    print_channel("Temperature", &report.environment().temperature);
    println!();

    // ── Robot State ────────────────────────────────────────────
    println!("  Robot State");
    print_channel("Battery SoC", &report.robot_state().battery_soc);
    print_channel("CPU load", &report.robot_state().cpu_utilization);
    print_channel("GPU load", &report.robot_state().gpu_utilization);
    println!(
        "   Battery:      {} V, {} A, {} W",
        opt(frame.battery.voltage_v, 2),
        opt(frame.battery.current_a, 3),
        opt(frame.battery.power_w, 2),
    );
    println!();

    // ── Configuration ──────────────────────────────────────────
    println!("  Configuration");
    print_channel("Speed", &report.configuration().speed);
    print_channel("CPU clock", &report.configuration().cpu_frequency);
    print_channel("GPU clock", &report.configuration().gpu_frequency);
    println!(
        "   Motion:       {:.1} W mechanical, {:.2} m, {:.1} J",
        frame.motion.mech_power_w, frame.motion.distance_m, frame.motion.energy_j,
    );
    println!();

    // ── Power Rails ────────────────────────────────────────────
    if !frame.compute.power_rails.is_empty() {
        println!("  Power Rails");
        for (name, mw) in &frame.compute.power_rails {
            println!("   {:<14}{} mW", format!("{name}:"), opt(*mw, 0));
        }
        println!();
    }

    // ── Assessment ─────────────────────────────────────────────
    println!("  Assessment");
    if report.assessment().is_empty() {
        println!("   Status:       no risks");
    } else {
        for flag in report.assessment() {
            println!("   WARNING: {flag}");
        }
    }
    for kind in report.indeterminate() {
        println!("   Indeterminate: {kind} (missing input)");
    }
    println!();
    println!("{}", frame.compute.summary());

    Ok(())
}

fn print_channel(name: &str, value: &Option<SemanticValue>) {
    let label = format!("{name}:");
    match value {
        Some(v) => println!(
            "   {label:<14}{:<12} {:<16} {}",
            v.display_value,
            v.label.as_str(),
            ratio_bar(v.ratio)
        ),
        None => println!("   {label:<14}n/a"),
    }
}

fn opt(value: Option<f64>, prec: usize) -> String {
    value
        .map(|x| format!("{x:.prec$}"))
        .unwrap_or_else(|| "n/a".to_string())
}
