// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # robot-monitor
//!
//! Samples the physical state of a mobile robot from Linux sysfs/procfs
//! and turns it into physically consistent estimates.
//!
//! # Monitors
//! - [`BatteryMonitor`]: voltage, current, power and coulomb-counted
//!   state of charge ([`BatteryEstimator`] holds the I/O-free arithmetic).
//! - [`MotionEstimator`]: mechanical power, odometry and energy from the
//!   commanded or measured speed.
//! - [`ComputeTelemetry`]: CPU/GPU utilisation and frequency, memory,
//!   temperatures and INA3221 power rails.
//!
//! # Graceful Degradation
//! Sensor reads never fail a sample. A read that errors, times out or
//! yields a non-number becomes `None` for that one field. Absent values are
//! never replaced by zero. Only construction-time parameter checks return
//! [`MonitorError`].
//!
//! # Example
//! ```no_run
//! use robot_monitor::{ComputeConfig, ComputeTelemetry, SysfsReader};
//!
//! let mut compute = ComputeTelemetry::new(ComputeConfig::default(), SysfsReader::default())
//!     .expect("valid compute config");
//! println!("{}", compute.sample().summary());
//! ```

mod battery;
mod compute;
mod cpu;
mod error;
mod memory;
mod motion;
mod power;
mod sysfs;

pub use battery::{BatteryConfig, BatteryEstimator, BatteryMonitor, BatterySnapshot, BatteryState};
pub use compute::{ComputeConfig, ComputeSnapshot, ComputeTelemetry};
pub use error::MonitorError;
pub use motion::{MotionEstimator, MotionSnapshot, MotionState, MotorConfig, GRAVITY_MPS2};
pub use power::{RailMapping, RailRole};
pub use sysfs::SysfsReader;

/// Rejects scales that would produce non-finite or zero readings.
pub(crate) fn check_scale(name: &'static str, scale: f64) -> Result<(), MonitorError> {
    if scale.is_finite() && scale != 0.0 {
        Ok(())
    } else {
        Err(MonitorError::invalid(
            name,
            format!("scale must be finite and non-zero, got {scale}"),
        ))
    }
}
