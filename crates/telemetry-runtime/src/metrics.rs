// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sampling-loop timing metrics.

use std::time::Duration;

/// Tick timing collected by the [`Sampler`](crate::Sampler).
#[derive(Debug, Clone, serde::Serialize)]
pub struct SamplingMetrics {
    /// Configured sample period.
    pub period: Duration,
    /// Completed ticks.
    pub ticks: u64,
    pub total_tick_duration: Duration,
    pub max_tick_duration: Duration,
    /// Ticks that took longer than the period.
    pub overruns: u64,
}

impl SamplingMetrics {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ticks: 0,
            total_tick_duration: Duration::ZERO,
            max_tick_duration: Duration::ZERO,
            overruns: 0,
        }
    }

    /// Records one completed tick. Returns `true` if it overran the period.
    pub fn record(&mut self, elapsed: Duration) -> bool {
        self.ticks += 1;
        self.total_tick_duration += elapsed;
        self.max_tick_duration = self.max_tick_duration.max(elapsed);
        let overrun = elapsed > self.period;
        if overrun {
            self.overruns += 1;
        }
        overrun
    }

    pub fn mean_tick_duration(&self) -> Duration {
        if self.ticks == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_tick_duration.as_nanos() / u128::from(self.ticks);
        Duration::from_nanos(nanos as u64)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        format!(
            "Sampling: {} ticks @ {:.0}ms period, mean {:.2}ms, max {:.2}ms, {} overruns",
            self.ticks,
            self.period.as_secs_f64() * 1000.0,
            self.mean_tick_duration().as_secs_f64() * 1000.0,
            self.max_tick_duration.as_secs_f64() * 1000.0,
            self.overruns,
        )
    }
}
