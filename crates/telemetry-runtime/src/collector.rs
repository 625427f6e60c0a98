// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One tick of the pipeline: sample, map, assess, assemble.

use crate::{RuntimeError, TelemetryConfig};
use platform_bounds::PlatformBounds;
use robot_monitor::{
    BatteryMonitor, BatterySnapshot, ComputeSnapshot, ComputeTelemetry, MotionEstimator,
    MotionSnapshot, SysfsReader,
};
use semantic_map::{RawState, SemanticMapper, TelemetryReport};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Share of the sample period that sensor reads may spend waiting.
const READ_BUDGET_FRACTION: f64 = 0.75;

/// Externally supplied surroundings copied into every report.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentContext {
    pub terrain: Option<String>,
    /// Ground slope in degrees.
    pub slope: Option<f64>,
}

/// Everything produced by one tick.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TelemetryFrame {
    pub report: TelemetryReport,
    pub raw: RawState,
    pub battery: BatterySnapshot,
    pub motion: MotionSnapshot,
    pub compute: ComputeSnapshot,
}

/// Owns every estimator and turns one tick of readings into a report.
///
/// Estimators are sampled battery → motion → compute; the order carries no
/// meaning beyond being fixed.
#[derive(Debug)]
pub struct Collector {
    battery: BatteryMonitor,
    motion: MotionEstimator,
    compute: ComputeTelemetry,
    mapper: SemanticMapper,
    environment: EnvironmentContext,
    reader: SysfsReader,
    read_budget: Duration,
}

impl Collector {
    /// Validates `config` and builds every monitor.
    pub fn new(config: &TelemetryConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let reader = config.reader();
        let battery = BatteryMonitor::new(config.battery.clone(), reader.clone())?;
        let motion = MotionEstimator::new(&config.motor)?;
        let compute = ComputeTelemetry::new(config.compute.clone(), reader.clone())?;
        let read_budget = config.sample_period().mul_f64(READ_BUDGET_FRACTION);
        tracing::info!(
            "collector ready: {} cpu cores, read timeout {:?}, read budget {read_budget:?}",
            compute.cores().len(),
            reader.timeout()
        );
        Ok(Self {
            battery,
            motion,
            compute,
            mapper: SemanticMapper::new(Arc::new(config.bounds.clone())),
            environment: EnvironmentContext::default(),
            reader,
            read_budget,
        })
    }

    pub fn bounds(&self) -> &PlatformBounds {
        self.mapper.bounds()
    }

    /// Sets the commanded or measured speed used by the next tick.
    pub fn set_speed(&mut self, speed_mps: f64) -> Result<(), RuntimeError> {
        self.motion.set_speed(speed_mps)?;
        Ok(())
    }

    pub fn set_environment(&mut self, environment: EnvironmentContext) {
        self.environment = environment;
    }

    pub fn soc(&self) -> f64 {
        self.battery.estimator().soc()
    }

    /// Samples every estimator and assembles the report. Never fails.
    ///
    /// With a read timeout configured, sensor reads stop waiting once the
    /// tick's read budget is spent; hung files cost at most one timeout.
    pub fn tick(&mut self) -> TelemetryFrame {
        self.reader.begin_tick(self.read_budget);
        let battery = self.battery.sample();
        let motion = self.motion.sample(Instant::now());
        let compute = self.compute.sample();
        self.reader.end_tick();
        let stalled = self.reader.stalled_reads();
        if stalled > 0 {
            tracing::debug!("{stalled} sensor reads still blocked");
        }

        let raw = RawState {
            temperature_c: compute.hottest_temp_c(),
            soc_pct: Some(battery.soc * 100.0),
            cpu_util_pct: compute.cpu_usage_pct,
            gpu_util_pct: compute.gpu_util_pct,
            speed_mps: Some(motion.speed_mps),
            cpu_freq_mhz: compute.cpu_freq_mhz,
            gpu_freq_mhz: compute.gpu_freq_mhz,
            terrain: self.environment.terrain.clone(),
            slope: self.environment.slope,
        };
        let report = TelemetryReport::assemble(&raw, &self.mapper, compute.timestamp_ms);
        tracing::debug!("{}", report.summary());

        TelemetryFrame {
            report,
            raw,
            battery,
            motion,
            compute,
        }
    }
}
