// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the telemetry runtime.

/// Errors raised while configuring or driving the collector.
///
/// All of these are configuration-time failures. Once a [`Collector`](crate::Collector)
/// exists, ticks never fail.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The configuration file is unreadable, malformed or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The `[bounds]` section failed validation.
    #[error("bounds error: {0}")]
    Bounds(#[from] platform_bounds::BoundsError),

    /// A monitor rejected its parameters.
    #[error("monitor error: {0}")]
    Monitor(#[from] robot_monitor::MonitorError),
}
