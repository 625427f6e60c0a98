// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for bounds loading and validation.

/// Errors raised while loading or validating [`PlatformBounds`](crate::PlatformBounds).
///
/// Every variant is a configuration-time failure: it is surfaced once at
/// startup and never during sampling.
#[derive(Debug, thiserror::Error)]
pub enum BoundsError {
    /// The bounds file could not be read.
    #[error("cannot read bounds file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The document is not valid TOML or a required key is missing.
    #[error("bounds parse error: {0}")]
    Parse(String),

    /// A bound is `NaN` or infinite.
    #[error("bound '{field}' must be a finite number")]
    NonFinite { field: &'static str },

    /// A threshold set is not ordered the way its labels require.
    #[error("{domain} thresholds are out of order: {detail}")]
    Unordered {
        domain: &'static str,
        detail: String,
    },

    /// A bound lies outside the range it is allowed to take.
    #[error("bound '{field}' = {value} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        detail: &'static str,
    },
}
