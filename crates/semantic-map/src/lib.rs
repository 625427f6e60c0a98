// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # semantic-map
//!
//! Converts a raw numeric robot state into the semantic form consumed by a
//! downstream decision process: each channel becomes a
//! [`SemanticValue`] (display string, ratio in `[0, 1]`, label), and a
//! small table of cross-channel rules turns mapped values into
//! [`RiskFlag`]s.
//!
//! ```text
//! RawState ──SemanticMapper──▶ SemanticValue per channel ──risk rules──▶ TelemetryReport
//! ```
//!
//! Everything here is a pure function of its inputs and the
//! [`PlatformBounds`](platform_bounds::PlatformBounds) in effect. Absent
//! channels stay absent; a rule that needs one is reported as
//! indeterminate instead of firing or failing.
//!
//! # Example
//! ```
//! use platform_bounds::PlatformBounds;
//! use semantic_map::{Label, SemanticMapper};
//! use std::sync::Arc;
//!
//! let mapper = SemanticMapper::new(Arc::new(PlatformBounds::default()));
//! let temp = mapper.map_temperature(95.0);
//! assert_eq!(temp.label, Label::Critical);
//! assert_eq!(temp.ratio, 0.95);
//! ```

mod mapper;
mod report;
mod risk;
mod value;

pub use mapper::SemanticMapper;
pub use report::{
    ConfigurationSection, EnvironmentSection, RawState, RobotStateSection, TelemetryReport,
};
pub use risk::{assess, evaluate, RiskAssessment, RiskFlag, RiskInputs, RiskKind, RuleOutcome};
pub use value::{map_channel, normalize, Label, SemanticValue};
