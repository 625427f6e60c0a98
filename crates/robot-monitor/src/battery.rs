// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Battery state-of-charge estimation by coulomb counting.
//!
//! Voltage and current are read from the power-supply class
//! (`/sys/class/power_supply/BAT0/{voltage_now,current_now}` by default),
//! scaled to volts and amps, and the drawn charge is integrated over the
//! wall-clock time between samples:
//!
//! ```text
//! soc -= (current_a * dt_s / 3600) / capacity_ah      then clamp to [0, 1]
//! ```
//!
//! # Sign convention
//! Positive current is **discharge** and lowers SoC; negative current is
//! **charge** and raises it.

use crate::{MonitorError, SysfsReader};
use std::path::PathBuf;
use std::time::Instant;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Battery parameters and sensor locations.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryConfig {
    /// Nominal capacity in amp-hours.
    pub capacity_ah: f64,
    /// State of charge at start-up, in `[0, 1]`.
    pub init_soc: f64,
    pub voltage_path: PathBuf,
    pub current_path: PathBuf,
    /// Divisor from the raw file value to volts (1000 for mV).
    pub voltage_scale: f64,
    /// Divisor from the raw file value to amps (1000 for mA).
    pub current_scale: f64,
}

impl BatteryConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        check_capacity(self.capacity_ah)?;
        check_soc(self.init_soc)?;
        crate::check_scale("battery.voltage_scale", self.voltage_scale)?;
        crate::check_scale("battery.current_scale", self.current_scale)?;
        Ok(())
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_ah: 5.0,
            init_soc: 1.0,
            voltage_path: PathBuf::from("/sys/class/power_supply/BAT0/voltage_now"),
            current_path: PathBuf::from("/sys/class/power_supply/BAT0/current_now"),
            voltage_scale: 1000.0,
            current_scale: 1000.0,
        }
    }
}

/// Estimator state. Only [`BatteryEstimator::sample`] mutates it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatteryState {
    pub capacity_ah: f64,
    /// State of charge, always in `[0, 1]`.
    pub soc: f64,
    /// Time of the previous sample; `None` until the first one.
    #[serde(skip)]
    pub last_update: Option<Instant>,
}

/// Result of one battery sample. Absent readings stay `None`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatterySnapshot {
    pub voltage_v: Option<f64>,
    pub current_a: Option<f64>,
    /// `voltage * current`, present only when both readings are.
    pub power_w: Option<f64>,
    /// State of charge after this sample, in `[0, 1]`.
    pub soc: f64,
}

/// Coulomb-counting SoC estimator, independent of any I/O.
#[derive(Debug, Clone)]
pub struct BatteryEstimator {
    state: BatteryState,
}

impl BatteryEstimator {
    pub fn new(capacity_ah: f64, init_soc: f64) -> Result<Self, MonitorError> {
        check_capacity(capacity_ah)?;
        check_soc(init_soc)?;
        Ok(Self {
            state: BatteryState {
                capacity_ah,
                soc: init_soc,
                last_update: None,
            },
        })
    }

    /// Integrates one sample taken at `now`.
    ///
    /// The first call only records the baseline time. When `current_a` is
    /// absent no charge is integrated and SoC is left untouched; the
    /// baseline still advances, so the missing interval is skipped rather
    /// than attributed to the next reading.
    pub fn sample(
        &mut self,
        voltage_v: Option<f64>,
        current_a: Option<f64>,
        now: Instant,
    ) -> BatterySnapshot {
        let dt_s = self
            .state
            .last_update
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.state.last_update = Some(now);

        match current_a {
            Some(i) => {
                let drawn_ah = i * dt_s / SECONDS_PER_HOUR;
                self.state.soc = (self.state.soc - drawn_ah / self.state.capacity_ah).clamp(0.0, 1.0);
            }
            None => tracing::debug!("battery current unavailable; SoC held at {:.4}", self.state.soc),
        }

        let power_w = match (voltage_v, current_a) {
            (Some(v), Some(i)) => Some(v * i),
            _ => None,
        };

        BatterySnapshot {
            voltage_v,
            current_a,
            power_w,
            soc: self.state.soc,
        }
    }

    pub fn soc(&self) -> f64 {
        self.state.soc
    }

    pub fn state(&self) -> &BatteryState {
        &self.state
    }
}

/// Battery estimator bound to its sensor files.
#[derive(Debug)]
pub struct BatteryMonitor {
    config: BatteryConfig,
    reader: SysfsReader,
    estimator: BatteryEstimator,
}

impl BatteryMonitor {
    pub fn new(config: BatteryConfig, reader: SysfsReader) -> Result<Self, MonitorError> {
        config.validate()?;
        let estimator = BatteryEstimator::new(config.capacity_ah, config.init_soc)?;
        Ok(Self {
            config,
            reader,
            estimator,
        })
    }

    /// Reads voltage and current and advances the estimator.
    pub fn sample(&mut self) -> BatterySnapshot {
        let v = self
            .reader
            .read_scaled(&self.config.voltage_path, self.config.voltage_scale);
        let i = self
            .reader
            .read_scaled(&self.config.current_path, self.config.current_scale);
        self.estimator.sample(v, i, Instant::now())
    }

    pub fn estimator(&self) -> &BatteryEstimator {
        &self.estimator
    }
}

fn check_capacity(capacity_ah: f64) -> Result<(), MonitorError> {
    if capacity_ah.is_finite() && capacity_ah > 0.0 {
        Ok(())
    } else {
        Err(MonitorError::invalid(
            "battery.capacity_ah",
            format!("must be a positive number, got {capacity_ah}"),
        ))
    }
}

fn check_soc(soc: f64) -> Result<(), MonitorError> {
    if (0.0..=1.0).contains(&soc) {
        Ok(())
    } else {
        Err(MonitorError::invalid(
            "battery.init_soc",
            format!("must lie in [0, 1], got {soc}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::test_support::{scratch_dir, write_file};
    use std::time::Duration;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_one_amp_for_one_hour_on_5ah() {
        let mut est = BatteryEstimator::new(5.0, 1.0).unwrap();
        let t0 = Instant::now();
        est.sample(Some(12.0), Some(1.0), t0);
        let snap = est.sample(Some(12.0), Some(1.0), t0 + HOUR);
        assert!((snap.soc - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_first_sample_is_baseline() {
        let mut est = BatteryEstimator::new(5.0, 0.5).unwrap();
        let snap = est.sample(None, Some(100.0), Instant::now());
        assert_eq!(snap.soc, 0.5);
    }

    #[test]
    fn test_positive_current_discharges() {
        let mut est = BatteryEstimator::new(2.0, 0.5).unwrap();
        let t0 = Instant::now();
        est.sample(None, Some(0.0), t0);
        let snap = est.sample(None, Some(0.5), t0 + HOUR);
        assert!((snap.soc - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_negative_current_charges() {
        let mut est = BatteryEstimator::new(2.0, 0.5).unwrap();
        let t0 = Instant::now();
        est.sample(None, Some(0.0), t0);
        let snap = est.sample(None, Some(-0.5), t0 + HOUR);
        assert!((snap.soc - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_soc_clamped_under_huge_dt() {
        let mut est = BatteryEstimator::new(5.0, 0.3).unwrap();
        let t0 = Instant::now();
        est.sample(None, Some(50.0), t0);
        let drained = est.sample(None, Some(50.0), t0 + HOUR * 1000);
        assert_eq!(drained.soc, 0.0);

        let charged = est.sample(None, Some(-50.0), t0 + HOUR * 2000);
        assert_eq!(charged.soc, 1.0);
    }

    #[test]
    fn test_soc_stays_in_unit_interval_over_sequence() {
        let mut est = BatteryEstimator::new(1.0, 0.5).unwrap();
        let mut t = Instant::now();
        for (k, current) in [3.0, -7.0, 0.2, 12.0, -0.1, -40.0, 9.0].iter().enumerate() {
            t += Duration::from_secs(600 * (k as u64 + 1));
            let snap = est.sample(Some(11.1), Some(*current), t);
            assert!((0.0..=1.0).contains(&snap.soc), "soc {} out of range", snap.soc);
        }
    }

    #[test]
    fn test_absent_current_holds_soc() {
        let mut est = BatteryEstimator::new(5.0, 1.0).unwrap();
        let t0 = Instant::now();
        est.sample(Some(12.0), Some(1.0), t0);
        let before = est.sample(Some(12.0), Some(1.0), t0 + HOUR).soc;
        let after = est.sample(Some(12.0), None, t0 + HOUR * 2);
        assert_eq!(after.soc, before);
        assert_eq!(after.power_w, None);
    }

    #[test]
    fn test_absent_voltage_keeps_integrating() {
        let mut est = BatteryEstimator::new(5.0, 1.0).unwrap();
        let t0 = Instant::now();
        est.sample(None, Some(2.0), t0);
        let snap = est.sample(None, Some(2.0), t0 + HOUR);
        assert_eq!(snap.power_w, None);
        assert_eq!(snap.voltage_v, None);
        assert!((snap.soc - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_power_when_both_present() {
        let mut est = BatteryEstimator::new(5.0, 1.0).unwrap();
        let snap = est.sample(Some(12.0), Some(1.5), Instant::now());
        assert_eq!(snap.power_w, Some(18.0));
    }

    #[test]
    fn test_zero_voltage_still_reports_power() {
        let mut est = BatteryEstimator::new(5.0, 1.0).unwrap();
        let snap = est.sample(Some(0.0), Some(1.5), Instant::now());
        assert_eq!(snap.power_w, Some(0.0));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(BatteryEstimator::new(0.0, 1.0).is_err());
        assert!(BatteryEstimator::new(5.0, 1.2).is_err());
        assert!(BatteryEstimator::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_monitor_reads_scaled_files() {
        let dir = scratch_dir("battery_monitor");
        let config = BatteryConfig {
            voltage_path: write_file(&dir, "voltage_now", "12000"),
            current_path: write_file(&dir, "current_now", "2000"),
            ..Default::default()
        };
        let mut monitor = BatteryMonitor::new(config, SysfsReader::default()).unwrap();
        let snap = monitor.sample();
        assert_eq!(snap.voltage_v, Some(12.0));
        assert_eq!(snap.current_a, Some(2.0));
        assert_eq!(snap.power_w, Some(24.0));
    }

    #[test]
    fn test_monitor_missing_files_degrade() {
        let config = BatteryConfig {
            voltage_path: PathBuf::from("/nonexistent/voltage_now"),
            current_path: PathBuf::from("/nonexistent/current_now"),
            init_soc: 0.7,
            ..Default::default()
        };
        let mut monitor = BatteryMonitor::new(config, SysfsReader::default()).unwrap();
        let first = monitor.sample();
        let second = monitor.sample();
        assert_eq!(first.current_a, None);
        assert_eq!(second.soc, 0.7);
    }

    #[test]
    fn test_snapshot_json_fields() {
        let mut est = BatteryEstimator::new(5.0, 1.0).unwrap();
        let snap = est.sample(None, Some(1.0), Instant::now());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "voltage_v": null,
                "current_a": 1.0,
                "power_w": null,
                "soc": 1.0,
            })
        );
        let back: BatterySnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snap);
    }
}
