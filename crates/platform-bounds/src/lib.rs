// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # platform-bounds
//!
//! Platform-specific bounds and thresholds used to turn raw robot
//! telemetry into normalized ratios and qualitative labels.
//!
//! A [`PlatformBounds`] value is validated once when it is loaded and is
//! read-only from then on: its fields are private and only exposed through
//! shared references. Downstream components hold it behind an `Arc` and
//! may share it across threads freely.
//!
//! # TOML Format
//! ```toml
//! [motion.speed]
//! max = 6.0
//!
//! [cpu]
//! freq_max = 1984.0
//! freq_min = 115.0
//! utilization_thresholds = { under_utilized = 30.0, balanced = 70.0, high = 90.0 }
//!
//! [gpu]
//! freq_max = 918.0
//! freq_min = 306.0
//! utilization_thresholds = { under_utilized = 30.0, balanced = 70.0, high = 90.0 }
//!
//! [thermal]
//! warning = 60.0
//! high = 80.0
//! critical = 90.0
//! limit = 100.0
//!
//! [battery.soc]
//! high = 70.0
//! moderate = 40.0
//! low = 20.0
//!
//! [risk_rules]
//! thermal_cpu_ratio = 0.8
//! low_soc_ratio = 0.3
//! energy_speed_ratio = 0.9
//! ```

mod bounds;
mod error;

pub use bounds::{
    BatteryBounds, MotionBounds, PlatformBounds, ProcessorBounds, RiskRules, SocThresholds,
    SpeedBounds, ThermalBounds, UtilizationThresholds,
};
pub use error::BoundsError;
