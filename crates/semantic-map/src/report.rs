// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Raw state vector and the assembled telemetry report.

use crate::mapper::SemanticMapper;
use crate::risk::{assess, RiskFlag, RiskInputs, RiskKind};
use crate::value::SemanticValue;
use std::collections::BTreeSet;

/// One tick's raw numeric state. Every channel may be absent.
///
/// Field aliases accept the short names used by older captures
/// (`temperature`, `soc`, `cpu_util`, ...).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawState {
    /// Hottest platform temperature, °C.
    #[serde(alias = "temperature")]
    pub temperature_c: Option<f64>,
    /// State of charge, percent.
    #[serde(alias = "soc")]
    pub soc_pct: Option<f64>,
    #[serde(alias = "cpu_util")]
    pub cpu_util_pct: Option<f64>,
    #[serde(alias = "gpu_util")]
    pub gpu_util_pct: Option<f64>,
    #[serde(alias = "speed")]
    pub speed_mps: Option<f64>,
    #[serde(alias = "cpu_freq")]
    pub cpu_freq_mhz: Option<f64>,
    #[serde(alias = "gpu_freq")]
    pub gpu_freq_mhz: Option<f64>,
    pub terrain: Option<String>,
    pub slope: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentSection {
    pub terrain: Option<String>,
    pub slope: Option<f64>,
    pub temperature: Option<SemanticValue>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RobotStateSection {
    pub battery_soc: Option<SemanticValue>,
    pub cpu_utilization: Option<SemanticValue>,
    pub gpu_utilization: Option<SemanticValue>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfigurationSection {
    pub speed: Option<SemanticValue>,
    pub cpu_frequency: Option<SemanticValue>,
    pub gpu_frequency: Option<SemanticValue>,
}

/// The per-tick output handed to the downstream decision process.
///
/// Built only by [`TelemetryReport::assemble`]; read through accessors.
/// Absent channels serialise as `null`. Serialize-only, so a report
/// never comes from outside input:
///
/// ```compile_fail
/// fn decodable<T: serde::de::DeserializeOwned>() {}
/// decodable::<semantic_map::TelemetryReport>();
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TelemetryReport {
    timestamp_ms: u64,
    environment: EnvironmentSection,
    robot_state: RobotStateSection,
    configuration: ConfigurationSection,
    assessment: BTreeSet<RiskFlag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    indeterminate: Vec<RiskKind>,
}

impl TelemetryReport {
    /// Maps every present channel, runs the risk rules and freezes the result.
    pub fn assemble(raw: &RawState, mapper: &SemanticMapper, timestamp_ms: u64) -> Self {
        let temperature = raw.temperature_c.map(|t| mapper.map_temperature(t));
        let battery_soc = raw.soc_pct.map(|s| mapper.map_soc(s));
        let cpu_utilization = raw.cpu_util_pct.map(|u| mapper.map_cpu_utilization(u));
        let gpu_utilization = raw.gpu_util_pct.map(|u| mapper.map_gpu_utilization(u));
        let speed = raw.speed_mps.map(|v| mapper.map_speed(v));
        let cpu_frequency = raw.cpu_freq_mhz.map(|f| mapper.map_cpu_frequency(f));
        let gpu_frequency = raw.gpu_freq_mhz.map(|f| mapper.map_gpu_frequency(f));

        let risk = assess(
            &RiskInputs {
                temperature: temperature.as_ref(),
                cpu_frequency: cpu_frequency.as_ref(),
                battery_soc: battery_soc.as_ref(),
                speed: speed.as_ref(),
            },
            mapper.bounds().risk_rules(),
        );

        Self {
            timestamp_ms,
            environment: EnvironmentSection {
                terrain: raw.terrain.clone(),
                slope: raw.slope,
                temperature,
            },
            robot_state: RobotStateSection {
                battery_soc,
                cpu_utilization,
                gpu_utilization,
            },
            configuration: ConfigurationSection {
                speed,
                cpu_frequency,
                gpu_frequency,
            },
            assessment: risk.flags,
            indeterminate: risk.indeterminate,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn environment(&self) -> &EnvironmentSection {
        &self.environment
    }

    pub fn robot_state(&self) -> &RobotStateSection {
        &self.robot_state
    }

    pub fn configuration(&self) -> &ConfigurationSection {
        &self.configuration
    }

    pub fn assessment(&self) -> &BTreeSet<RiskFlag> {
        &self.assessment
    }

    /// Rules that could not be evaluated because a channel was absent.
    pub fn indeterminate(&self) -> &[RiskKind] {
        &self.indeterminate
    }

    pub fn has_risk(&self, kind: RiskKind) -> bool {
        self.assessment.contains(&RiskFlag { kind })
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        fn show(value: &Option<SemanticValue>) -> String {
            value
                .as_ref()
                .map_or_else(|| "n/a".to_string(), |v| v.to_string())
        }

        let risks = if self.assessment.is_empty() {
            "no risks".to_string()
        } else {
            let flags: Vec<&str> = self.assessment.iter().map(|f| f.kind.as_str()).collect();
            format!("risks: {}", flags.join(", "))
        };
        format!(
            "temp {}, soc {}, cpu {} @ {}, gpu {} @ {}, speed {} | {risks}",
            show(&self.environment.temperature),
            show(&self.robot_state.battery_soc),
            show(&self.robot_state.cpu_utilization),
            show(&self.configuration.cpu_frequency),
            show(&self.robot_state.gpu_utilization),
            show(&self.configuration.gpu_frequency),
            show(&self.configuration.speed),
        )
    }
}
