// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Telemetry configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! Every section is optional and falls back to the Orin NX defaults; a
//! section that is present must be complete.
//! ```toml
//! sample_period_s = 1.0
//! read_timeout_ms = 200
//!
//! [battery]
//! capacity_ah = 5.0
//! init_soc = 1.0
//! voltage_path = "/sys/bus/i2c/drivers/ina3221x/1-0040/hwmon/hwmon3/in1_input"
//! current_path = "/sys/bus/i2c/drivers/ina3221x/1-0040/hwmon/hwmon3/curr1_input"
//! voltage_scale = 1000.0
//! current_scale = 1000.0
//!
//! [motor]
//! mass_kg = 18.0
//! rolling_coeff = 0.015
//! drivetrain_efficiency = 0.9
//! init_speed = 0.0
//! ```
//! `[compute]` lists every sensor path and scale plus `[[compute.rails]]`
//! entries (`index`, `role`); `[bounds]` holds a complete bounds document
//! as described in `platform_bounds`.

use crate::RuntimeError;
use platform_bounds::PlatformBounds;
use robot_monitor::{BatteryConfig, ComputeConfig, MotorConfig, SysfsReader};
use std::path::Path;
use std::time::Duration;

/// Full configuration for one telemetry process.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Polling period in seconds.
    #[serde(default = "default_sample_period")]
    pub sample_period_s: f64,
    /// Per-read timeout for sensor files. Reads are unbounded when `None`.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: Option<u64>,
    #[serde(default)]
    pub battery: BatteryConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
    /// Validated on deserialization.
    #[serde(default)]
    pub bounds: PlatformBounds,
}

fn default_sample_period() -> f64 {
    1.0
}

fn default_read_timeout() -> Option<u64> {
    Some(200)
}

impl TelemetryConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| RuntimeError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks every parameter. Bounds were already checked when built.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if !(self.sample_period_s.is_finite() && self.sample_period_s > 0.0) {
            return Err(RuntimeError::Config(format!(
                "sample_period_s must be positive, got {}",
                self.sample_period_s
            )));
        }
        if let Some(timeout_ms) = self.read_timeout_ms {
            if timeout_ms == 0 {
                return Err(RuntimeError::Config(
                    "read_timeout_ms must be at least 1".to_string(),
                ));
            }
            if Duration::from_millis(timeout_ms) >= self.sample_period() {
                tracing::warn!(
                    "read_timeout_ms ({timeout_ms}) is not shorter than the sample period ({}s)",
                    self.sample_period_s
                );
            }
        }
        self.battery.validate()?;
        self.motor.validate()?;
        self.compute.validate()?;
        Ok(())
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(self.sample_period_s)
    }

    /// Builds the sensor reader shared by every monitor.
    pub fn reader(&self) -> SysfsReader {
        SysfsReader::new(self.read_timeout_ms.map(Duration::from_millis))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sample_period_s: default_sample_period(),
            read_timeout_ms: default_read_timeout(),
            battery: BatteryConfig::default(),
            motor: MotorConfig::default(),
            compute: ComputeConfig::default(),
            bounds: PlatformBounds::default(),
        }
    }
}
