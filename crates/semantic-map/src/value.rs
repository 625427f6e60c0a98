// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Semantic values, labels and ratio normalization.

use std::fmt;

/// Qualitative descriptor attached to a mapped channel.
///
/// Serialised as the human-readable text shown by [`fmt::Display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    // Temperature
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "elevated")]
    Elevated,
    /// Temperature above the high cutoff, or frequency ratio in `[0.7, 0.9)`.
    #[serde(rename = "high")]
    High,
    /// Temperature above the critical cutoff, or SoC below the low cutoff.
    #[serde(rename = "critical")]
    Critical,

    // State of charge
    #[serde(rename = "high charge")]
    HighCharge,
    #[serde(rename = "moderate charge")]
    ModerateCharge,
    #[serde(rename = "low charge")]
    LowCharge,

    // Utilization
    #[serde(rename = "under-utilized")]
    UnderUtilized,
    /// Utilization in the balanced band, or speed ratio in `[0.4, 0.7)`.
    #[serde(rename = "balanced")]
    Balanced,
    #[serde(rename = "high load")]
    HighLoad,
    #[serde(rename = "saturated")]
    Saturated,

    // Frequency
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "moderate")]
    Moderate,
    /// Top ratio band for frequency and speed.
    #[serde(rename = "maximum")]
    Maximum,

    // Speed
    #[serde(rename = "conservative")]
    Conservative,
    #[serde(rename = "aggressive")]
    Aggressive,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "normal",
            Label::Elevated => "elevated",
            Label::High => "high",
            Label::Critical => "critical",
            Label::HighCharge => "high charge",
            Label::ModerateCharge => "moderate charge",
            Label::LowCharge => "low charge",
            Label::UnderUtilized => "under-utilized",
            Label::Balanced => "balanced",
            Label::HighLoad => "high load",
            Label::Saturated => "saturated",
            Label::Low => "low",
            Label::Moderate => "moderate",
            Label::Maximum => "maximum",
            Label::Conservative => "conservative",
            Label::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mapped channel: what to show, where it sits, and what to call it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SemanticValue {
    /// The raw value with its unit, e.g. `"95°C"`.
    #[serde(rename = "value")]
    pub display_value: String,
    /// Normalized position in `[0, 1]`, rounded to three decimals.
    pub ratio: f64,
    pub label: Label,
}

impl SemanticValue {
    pub(crate) fn new(display_value: String, ratio: f64, label: Label) -> Self {
        Self {
            display_value,
            ratio,
            label,
        }
    }
}

impl fmt::Display for SemanticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_value, self.label)
    }
}

/// `value / max`, rounded to three decimals and clamped into `[0, 1]`.
///
/// A non-positive (or non-finite) `max` is a degenerate bound: the result
/// is exactly `0.0` and a warning is logged. A non-finite `value` also
/// yields `0.0`.
pub fn normalize(value: f64, max: f64) -> f64 {
    if !(max.is_finite() && max > 0.0) {
        tracing::warn!("degenerate bound: maximum {max} is not positive; ratio clamped to 0.0");
        return 0.0;
    }
    let ratio = round3(value / max);
    // Also catches `-0.0` from tiny negatives, which `clamp` would keep.
    if ratio.is_nan() || ratio <= 0.0 {
        return 0.0;
    }
    ratio.min(1.0)
}

pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Fixed ratio bands shared by frequency and speed.
///
/// Lower edges are inclusive: `0.4` is in the second band, `0.7` in the
/// third and `0.9` in the fourth.
pub(crate) fn ratio_band(ratio: f64) -> usize {
    if ratio < 0.4 {
        0
    } else if ratio < 0.7 {
        1
    } else if ratio < 0.9 {
        2
    } else {
        3
    }
}

/// Maps a generic channel against its maximum using the fixed ratio bands
/// (low / moderate / high / maximum).
pub fn map_channel(value: f64, max: f64, unit: &str) -> SemanticValue {
    const LABELS: [Label; 4] = [Label::Low, Label::Moderate, Label::High, Label::Maximum];
    let ratio = normalize(value, max);
    SemanticValue::new(format_value(value, unit), ratio, LABELS[ratio_band(ratio)])
}

/// `95.0, "°C"` → `"95°C"`; `1.5, " m/s"` → `"1.5 m/s"`.
pub(crate) fn format_value(value: f64, unit: &str) -> String {
    format!("{}{unit}", round3(value))
}
