// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-channel semantic mapping.
//!
//! | Channel      | Ratio against        | Label source                          |
//! |--------------|----------------------|---------------------------------------|
//! | temperature  | `thermal.limit`      | absolute cutoffs `warning/high/critical` |
//! | SoC (%)      | 100                  | absolute cutoffs `high/moderate/low`  |
//! | utilization  | 100                  | per-processor utilization thresholds  |
//! | frequency    | `freq_max` (MHz)     | fixed ratio bands                     |
//! | speed        | `motion.speed.max`   | fixed ratio bands                     |

use crate::value::{format_value, normalize, ratio_band, Label, SemanticValue};
use platform_bounds::{PlatformBounds, UtilizationThresholds};
use std::sync::Arc;

const FREQUENCY_LABELS: [Label; 4] = [Label::Low, Label::Moderate, Label::High, Label::Maximum];
const SPEED_LABELS: [Label; 4] = [
    Label::Conservative,
    Label::Balanced,
    Label::Aggressive,
    Label::Maximum,
];

/// Maps raw channel values to [`SemanticValue`]s using shared, read-only bounds.
#[derive(Debug, Clone)]
pub struct SemanticMapper {
    bounds: Arc<PlatformBounds>,
}

impl SemanticMapper {
    pub fn new(bounds: Arc<PlatformBounds>) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &PlatformBounds {
        &self.bounds
    }

    /// Temperature in °C.
    ///
    /// Label bands have inclusive lower edges: exactly `warning` is
    /// elevated, exactly `critical` is critical.
    pub fn map_temperature(&self, temp_c: f64) -> SemanticValue {
        let thermal = self.bounds.thermal();
        let label = if temp_c < thermal.warning {
            Label::Normal
        } else if temp_c < thermal.high {
            Label::Elevated
        } else if temp_c < thermal.critical {
            Label::High
        } else {
            Label::Critical
        };
        SemanticValue::new(
            format_value(temp_c, "°C"),
            normalize(temp_c, thermal.limit),
            label,
        )
    }

    /// State of charge in percent (`0..=100`).
    pub fn map_soc(&self, soc_pct: f64) -> SemanticValue {
        let soc = &self.bounds.battery().soc;
        let label = if soc_pct >= soc.high {
            Label::HighCharge
        } else if soc_pct >= soc.moderate {
            Label::ModerateCharge
        } else if soc_pct >= soc.low {
            Label::LowCharge
        } else {
            Label::Critical
        };
        SemanticValue::new(format_value(soc_pct, "%"), normalize(soc_pct, 100.0), label)
    }

    /// Utilization in percent against an explicit threshold set.
    pub fn map_utilization(&self, util_pct: f64, thresholds: &UtilizationThresholds) -> SemanticValue {
        let label = if util_pct < thresholds.under_utilized {
            Label::UnderUtilized
        } else if util_pct < thresholds.balanced {
            Label::Balanced
        } else if util_pct < thresholds.high {
            Label::HighLoad
        } else {
            Label::Saturated
        };
        SemanticValue::new(format_value(util_pct, "%"), normalize(util_pct, 100.0), label)
    }

    pub fn map_cpu_utilization(&self, util_pct: f64) -> SemanticValue {
        self.map_utilization(util_pct, &self.bounds.cpu().utilization_thresholds)
    }

    pub fn map_gpu_utilization(&self, util_pct: f64) -> SemanticValue {
        self.map_utilization(util_pct, &self.bounds.gpu().utilization_thresholds)
    }

    /// Clock frequency in MHz against `max_mhz`, using the fixed ratio bands.
    pub fn map_frequency(&self, freq_mhz: f64, max_mhz: f64) -> SemanticValue {
        let ratio = normalize(freq_mhz, max_mhz);
        SemanticValue::new(
            format_value(freq_mhz, " MHz"),
            ratio,
            FREQUENCY_LABELS[ratio_band(ratio)],
        )
    }

    pub fn map_cpu_frequency(&self, freq_mhz: f64) -> SemanticValue {
        self.map_frequency(freq_mhz, self.bounds.cpu().freq_max)
    }

    pub fn map_gpu_frequency(&self, freq_mhz: f64) -> SemanticValue {
        self.map_frequency(freq_mhz, self.bounds.gpu().freq_max)
    }

    /// Speed in m/s against the configured maximum. Reverse speed clamps to ratio 0.
    pub fn map_speed(&self, speed_mps: f64) -> SemanticValue {
        let ratio = normalize(speed_mps, self.bounds.max_speed());
        SemanticValue::new(
            format_value(speed_mps, " m/s"),
            ratio,
            SPEED_LABELS[ratio_band(ratio)],
        )
    }
}
