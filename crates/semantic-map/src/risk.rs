// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Cross-channel risk rules.
//!
//! Rules are predicates over already-mapped [`SemanticValue`]s, never over
//! raw numbers, so they do not depend on units or maxima. Each rule is
//! evaluated independently; fired rules add their flag to the result.
//!
//! To add a rule, add a [`RiskKind`] variant and an entry to `RULES`.

use crate::value::{Label, SemanticValue};
use platform_bounds::RiskRules;
use std::collections::BTreeSet;
use std::fmt;

/// The kinds of risk the assessor can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum RiskKind {
    #[serde(rename = "thermal stress risk")]
    ThermalStress,
    #[serde(rename = "energy-aggressive behavior")]
    EnergyAggressive,
}

impl RiskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskKind::ThermalStress => "thermal stress risk",
            RiskKind::EnergyAggressive => "energy-aggressive behavior",
        }
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raised risk. Serialised as its description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RiskFlag {
    pub kind: RiskKind,
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Mapped channels the rules read. Absent channels are `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskInputs<'a> {
    pub temperature: Option<&'a SemanticValue>,
    pub cpu_frequency: Option<&'a SemanticValue>,
    pub battery_soc: Option<&'a SemanticValue>,
    pub speed: Option<&'a SemanticValue>,
}

/// Result of evaluating one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Fired,
    Clear,
    /// A required channel was absent; the rule did not fire.
    Indeterminate { missing: &'static str },
}

struct RiskRule {
    kind: RiskKind,
    evaluate: fn(&RiskInputs<'_>, &RiskRules) -> RuleOutcome,
}

const RULES: &[RiskRule] = &[
    RiskRule {
        kind: RiskKind::ThermalStress,
        evaluate: thermal_stress,
    },
    RiskRule {
        kind: RiskKind::EnergyAggressive,
        evaluate: energy_aggressive,
    },
];

/// Hot platform while the CPU clocks near its maximum.
fn thermal_stress(inputs: &RiskInputs<'_>, rules: &RiskRules) -> RuleOutcome {
    let Some(temp) = inputs.temperature else {
        return missing("temperature");
    };
    let Some(freq) = inputs.cpu_frequency else {
        return missing("cpu_frequency");
    };
    let hot = matches!(temp.label, Label::High | Label::Critical);
    outcome(hot && freq.ratio > rules.thermal_cpu_ratio)
}

/// Low battery while driving near top speed.
fn energy_aggressive(inputs: &RiskInputs<'_>, rules: &RiskRules) -> RuleOutcome {
    let Some(soc) = inputs.battery_soc else {
        return missing("battery_soc");
    };
    let Some(speed) = inputs.speed else {
        return missing("speed");
    };
    outcome(soc.ratio < rules.low_soc_ratio && speed.ratio > rules.energy_speed_ratio)
}

fn missing(channel: &'static str) -> RuleOutcome {
    RuleOutcome::Indeterminate { missing: channel }
}

fn outcome(fired: bool) -> RuleOutcome {
    if fired {
        RuleOutcome::Fired
    } else {
        RuleOutcome::Clear
    }
}

/// Flags raised in one cycle, plus the rules that could not be evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskAssessment {
    pub flags: BTreeSet<RiskFlag>,
    pub indeterminate: Vec<RiskKind>,
}

impl RiskAssessment {
    pub fn contains(&self, kind: RiskKind) -> bool {
        self.flags.contains(&RiskFlag { kind })
    }
}

/// Evaluates every rule and returns each outcome, in table order.
pub fn evaluate(inputs: &RiskInputs<'_>, rules: &RiskRules) -> Vec<(RiskKind, RuleOutcome)> {
    RULES
        .iter()
        .map(|rule| (rule.kind, (rule.evaluate)(inputs, rules)))
        .collect()
}

/// Runs the rule table over the mapped channels.
pub fn assess(inputs: &RiskInputs<'_>, rules: &RiskRules) -> RiskAssessment {
    let mut assessment = RiskAssessment::default();
    for (kind, result) in evaluate(inputs, rules) {
        match result {
            RuleOutcome::Fired => {
                assessment.flags.insert(RiskFlag { kind });
            }
            RuleOutcome::Clear => {}
            RuleOutcome::Indeterminate { missing } => {
                tracing::debug!(rule = %kind, missing, "risk rule indeterminate");
                assessment.indeterminate.push(kind);
            }
        }
    }
    assessment
}
