// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for robot monitoring.

/// Errors that can occur when reading sensors or building monitors.
///
/// The read-level variants (`ReadError`, `ParseError`, `NotAvailable`,
/// `Timeout`, `Stalled`, `BudgetExhausted`) are transient: monitors absorb them and report the affected
/// field as absent. `InvalidParameter` is raised only at construction.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Failed to read a sysfs or procfs file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse a numeric value from a system file.
    #[error("failed to parse value from {path}: {detail}")]
    ParseError { path: String, detail: String },

    /// The expected sysfs path does not exist on this platform.
    #[error("sensor path not found: {path}")]
    NotAvailable { path: String },

    /// The read did not complete within the configured timeout.
    #[error("read of {path} timed out after {timeout_ms} ms")]
    Timeout { path: String, timeout_ms: u64 },

    /// An earlier read of this path is still blocked; no new read was started.
    #[error("read of {path} skipped: previous read still blocked")]
    Stalled { path: String },

    /// The tick's read budget ran out before this path was read.
    #[error("read of {path} skipped: tick read budget exhausted")]
    BudgetExhausted { path: String },

    /// A monitor parameter is outside its physical range.
    #[error("invalid parameter '{name}': {detail}")]
    InvalidParameter { name: &'static str, detail: String },
}

impl MonitorError {
    pub(crate) fn invalid(name: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            detail: detail.into(),
        }
    }
}
