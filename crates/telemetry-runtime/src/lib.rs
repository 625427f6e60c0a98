// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # telemetry-runtime
//!
//! Ties the monitors and the semantic mapper into a per-tick pipeline.
//!
//! The runtime takes:
//! - A [`TelemetryConfig`] with sensor locations, estimator parameters and
//!   the validated [`PlatformBounds`](platform_bounds::PlatformBounds).
//!
//! And on every tick samples battery → motion → compute, builds the raw
//! state vector, maps it and assembles the
//! [`TelemetryReport`](semantic_map::TelemetryReport).
//!
//! # Polling Loop
//! [`Sampler`] drives a [`Collector`] on a `tokio` interval. It stops on
//! an external signal (any future) or after a tick limit, and only ever
//! between ticks.
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), telemetry_runtime::RuntimeError> {
//! use telemetry_runtime::{Collector, Sampler, TelemetryConfig};
//!
//! let config = TelemetryConfig::default();
//! let collector = Collector::new(&config)?;
//! let mut sampler = Sampler::new(collector, config.sample_period()).with_max_ticks(10);
//! let metrics = sampler
//!     .run(std::future::pending(), |frame| println!("{}", frame.report.summary()))
//!     .await;
//! println!("{}", metrics.summary());
//! # Ok(())
//! # }
//! ```

mod collector;
mod config;
mod error;
mod metrics;
mod sampler;

pub use collector::{Collector, EnvironmentContext, TelemetryFrame};
pub use config::TelemetryConfig;
pub use error::RuntimeError;
pub use metrics::SamplingMetrics;
pub use sampler::Sampler;
