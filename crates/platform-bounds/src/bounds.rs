// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`PlatformBounds`] document and its per-domain sections.
//!
//! Units follow the telemetry they bound: speeds in m/s, frequencies in
//! MHz, temperatures in °C, utilization and state-of-charge thresholds in
//! percent, and risk-rule coefficients as ratios in `[0, 1]`.

use crate::BoundsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Speed limits for the drive base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeedBounds {
    /// Maximum commanded speed in m/s. Used as the normalization maximum.
    pub max: f64,
}

/// Motion-domain bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionBounds {
    pub speed: SpeedBounds,
}

/// Utilization band edges in percent.
///
/// A reading below `under_utilized` is under-utilized, below `balanced` is
/// balanced, below `high` is high load, and anything else is saturated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilizationThresholds {
    pub under_utilized: f64,
    pub balanced: f64,
    pub high: f64,
}

/// Frequency range and utilization bands for one processor (CPU or GPU).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorBounds {
    /// Maximum clock frequency in MHz. Used as the normalization maximum.
    pub freq_max: f64,
    /// Minimum clock frequency in MHz.
    pub freq_min: f64,
    pub utilization_thresholds: UtilizationThresholds,
}

/// Absolute temperature cutoffs in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalBounds {
    /// Start of the "elevated" band.
    pub warning: f64,
    /// Start of the "high" band.
    pub high: f64,
    /// Start of the "critical" band.
    pub critical: f64,
    /// Normalization maximum for the temperature ratio.
    pub limit: f64,
}

/// State-of-charge band edges in percent (lower edge inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocThresholds {
    pub high: f64,
    pub moderate: f64,
    pub low: f64,
}

/// Battery-domain bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryBounds {
    pub soc: SocThresholds,
}

/// Coefficients for the cross-channel risk rules. All are ratios in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskRules {
    /// CPU frequency ratio above which a hot platform is under thermal stress.
    pub thermal_cpu_ratio: f64,
    /// SoC ratio below which the battery is considered low.
    pub low_soc_ratio: f64,
    /// Speed ratio above which driving is energy-aggressive.
    pub energy_speed_ratio: f64,
}

/// Serde mirror of [`PlatformBounds`]; every deserialization goes through
/// [`PlatformBounds::new`] so an unvalidated value can never be observed.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundsDocument {
    motion: MotionBounds,
    cpu: ProcessorBounds,
    gpu: ProcessorBounds,
    thermal: ThermalBounds,
    battery: BatteryBounds,
    risk_rules: RiskRules,
}

impl TryFrom<BoundsDocument> for PlatformBounds {
    type Error = BoundsError;

    fn try_from(doc: BoundsDocument) -> Result<Self, Self::Error> {
        PlatformBounds::new(
            doc.motion,
            doc.cpu,
            doc.gpu,
            doc.thermal,
            doc.battery,
            doc.risk_rules,
        )
    }
}

/// Validated, read-only bounds for every mapped telemetry domain.
///
/// Construct with [`PlatformBounds::new`], [`PlatformBounds::from_toml`] or
/// [`PlatformBounds::from_file`]; all three validate. There are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundsDocument")]
pub struct PlatformBounds {
    motion: MotionBounds,
    cpu: ProcessorBounds,
    gpu: ProcessorBounds,
    thermal: ThermalBounds,
    battery: BatteryBounds,
    risk_rules: RiskRules,
}

impl PlatformBounds {
    /// Assembles and validates a bounds document.
    ///
    /// A non-positive normalization maximum is *not* an error: mapping
    /// clamps such ratios to `0.0`. Those fields are reported once here at
    /// `warn` level and can be listed with [`PlatformBounds::degenerate_maxima`].
    pub fn new(
        motion: MotionBounds,
        cpu: ProcessorBounds,
        gpu: ProcessorBounds,
        thermal: ThermalBounds,
        battery: BatteryBounds,
        risk_rules: RiskRules,
    ) -> Result<Self, BoundsError> {
        let bounds = Self {
            motion,
            cpu,
            gpu,
            thermal,
            battery,
            risk_rules,
        };
        bounds.validate()?;

        let degenerate = bounds.degenerate_maxima();
        if !degenerate.is_empty() {
            tracing::warn!(
                fields = ?degenerate,
                "non-positive normalization maxima; their ratios will be clamped to 0.0"
            );
        }
        Ok(bounds)
    }

    /// Loads bounds from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, BoundsError> {
        let content = std::fs::read_to_string(path).map_err(|e| BoundsError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates bounds from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, BoundsError> {
        toml::from_str(toml_str).map_err(|e| BoundsError::Parse(e.to_string()))
    }

    /// Serialises the bounds to TOML.
    pub fn to_toml(&self) -> Result<String, BoundsError> {
        toml::to_string_pretty(self).map_err(|e| BoundsError::Parse(e.to_string()))
    }

    pub fn motion(&self) -> &MotionBounds {
        &self.motion
    }

    pub fn cpu(&self) -> &ProcessorBounds {
        &self.cpu
    }

    pub fn gpu(&self) -> &ProcessorBounds {
        &self.gpu
    }

    pub fn thermal(&self) -> &ThermalBounds {
        &self.thermal
    }

    pub fn battery(&self) -> &BatteryBounds {
        &self.battery
    }

    pub fn risk_rules(&self) -> &RiskRules {
        &self.risk_rules
    }

    /// Maximum speed in m/s.
    pub fn max_speed(&self) -> f64 {
        self.motion.speed.max
    }

    /// Names of normalization maxima that are `<= 0`.
    pub fn degenerate_maxima(&self) -> Vec<&'static str> {
        [
            ("motion.speed.max", self.motion.speed.max),
            ("cpu.freq_max", self.cpu.freq_max),
            ("gpu.freq_max", self.gpu.freq_max),
            ("thermal.limit", self.thermal.limit),
        ]
        .into_iter()
        .filter(|(_, max)| *max <= 0.0)
        .map(|(name, _)| name)
        .collect()
    }

    fn validate(&self) -> Result<(), BoundsError> {
        for (field, value) in self.fields() {
            if !value.is_finite() {
                return Err(BoundsError::NonFinite { field });
            }
        }

        validate_processor("cpu", &self.cpu)?;
        validate_processor("gpu", &self.gpu)?;

        let t = &self.thermal;
        if !(t.warning <= t.high && t.high <= t.critical) {
            return Err(BoundsError::Unordered {
                domain: "thermal",
                detail: format!(
                    "expected warning <= high <= critical, got {} / {} / {}",
                    t.warning, t.high, t.critical
                ),
            });
        }

        let soc = &self.battery.soc;
        for (field, value) in [
            ("battery.soc.high", soc.high),
            ("battery.soc.moderate", soc.moderate),
            ("battery.soc.low", soc.low),
        ] {
            check_percent(field, value)?;
        }
        if !(soc.low <= soc.moderate && soc.moderate <= soc.high) {
            return Err(BoundsError::Unordered {
                domain: "battery.soc",
                detail: format!(
                    "expected low <= moderate <= high, got {} / {} / {}",
                    soc.low, soc.moderate, soc.high
                ),
            });
        }

        let r = &self.risk_rules;
        for (field, value) in [
            ("risk_rules.thermal_cpu_ratio", r.thermal_cpu_ratio),
            ("risk_rules.low_soc_ratio", r.low_soc_ratio),
            ("risk_rules.energy_speed_ratio", r.energy_speed_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BoundsError::OutOfRange {
                    field,
                    value,
                    detail: "risk-rule ratios must lie in [0, 1]",
                });
            }
        }

        Ok(())
    }

    fn fields(&self) -> [(&'static str, f64); 21] {
        let cpu_u = &self.cpu.utilization_thresholds;
        let gpu_u = &self.gpu.utilization_thresholds;
        [
            ("motion.speed.max", self.motion.speed.max),
            ("cpu.freq_max", self.cpu.freq_max),
            ("cpu.freq_min", self.cpu.freq_min),
            ("cpu.utilization_thresholds.under_utilized", cpu_u.under_utilized),
            ("cpu.utilization_thresholds.balanced", cpu_u.balanced),
            ("cpu.utilization_thresholds.high", cpu_u.high),
            ("gpu.freq_max", self.gpu.freq_max),
            ("gpu.freq_min", self.gpu.freq_min),
            ("gpu.utilization_thresholds.under_utilized", gpu_u.under_utilized),
            ("gpu.utilization_thresholds.balanced", gpu_u.balanced),
            ("gpu.utilization_thresholds.high", gpu_u.high),
            ("thermal.warning", self.thermal.warning),
            ("thermal.high", self.thermal.high),
            ("thermal.critical", self.thermal.critical),
            ("thermal.limit", self.thermal.limit),
            ("battery.soc.high", self.battery.soc.high),
            ("battery.soc.moderate", self.battery.soc.moderate),
            ("battery.soc.low", self.battery.soc.low),
            ("risk_rules.thermal_cpu_ratio", self.risk_rules.thermal_cpu_ratio),
            ("risk_rules.low_soc_ratio", self.risk_rules.low_soc_ratio),
            ("risk_rules.energy_speed_ratio", self.risk_rules.energy_speed_ratio),
        ]
    }
}

fn validate_processor(domain: &'static str, p: &ProcessorBounds) -> Result<(), BoundsError> {
    if p.freq_min < 0.0 {
        return Err(BoundsError::OutOfRange {
            field: if domain == "cpu" { "cpu.freq_min" } else { "gpu.freq_min" },
            value: p.freq_min,
            detail: "frequencies cannot be negative",
        });
    }
    // A non-positive maximum is a degenerate bound, handled at mapping time.
    if p.freq_max > 0.0 && p.freq_min > p.freq_max {
        return Err(BoundsError::Unordered {
            domain,
            detail: format!(
                "freq_min ({}) exceeds freq_max ({})",
                p.freq_min, p.freq_max
            ),
        });
    }

    let u = &p.utilization_thresholds;
    for value in [u.under_utilized, u.balanced, u.high] {
        check_percent(
            if domain == "cpu" {
                "cpu.utilization_thresholds"
            } else {
                "gpu.utilization_thresholds"
            },
            value,
        )?;
    }
    if !(u.under_utilized <= u.balanced && u.balanced <= u.high) {
        return Err(BoundsError::Unordered {
            domain,
            detail: format!(
                "expected under_utilized <= balanced <= high, got {} / {} / {}",
                u.under_utilized, u.balanced, u.high
            ),
        });
    }
    Ok(())
}

fn check_percent(field: &'static str, value: f64) -> Result<(), BoundsError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(BoundsError::OutOfRange {
            field,
            value,
            detail: "percent thresholds must lie in [0, 100]",
        })
    }
}

impl Default for PlatformBounds {
    /// Bounds for a Jetson Orin NX-class wheeled robot.
    fn default() -> Self {
        Self {
            motion: MotionBounds {
                speed: SpeedBounds { max: 6.0 },
            },
            cpu: ProcessorBounds {
                freq_max: 1984.0,
                freq_min: 115.0,
                utilization_thresholds: UtilizationThresholds {
                    under_utilized: 30.0,
                    balanced: 70.0,
                    high: 90.0,
                },
            },
            gpu: ProcessorBounds {
                freq_max: 918.0,
                freq_min: 306.0,
                utilization_thresholds: UtilizationThresholds {
                    under_utilized: 30.0,
                    balanced: 70.0,
                    high: 90.0,
                },
            },
            thermal: ThermalBounds {
                warning: 60.0,
                high: 80.0,
                critical: 90.0,
                limit: 100.0,
            },
            battery: BatteryBounds {
                soc: SocThresholds {
                    high: 70.0,
                    moderate: 40.0,
                    low: 20.0,
                },
            },
            risk_rules: RiskRules {
                thermal_cpu_ratio: 0.8,
                low_soc_ratio: 0.3,
                energy_speed_ratio: 0.9,
            },
        }
    }
}
