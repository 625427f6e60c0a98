// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-period polling loop.
//!
//! The loop is single-threaded and cooperative: it awaits the next period
//! boundary (or the shutdown signal), then runs one synchronous
//! [`Collector::tick`]. Shutdown is only observed while waiting, so a
//! tick in progress always completes and estimator state is never left
//! half-updated.
//!
//! A tick that overruns its period is logged and the missed boundaries are
//! skipped rather than replayed in a burst.

use crate::{Collector, SamplingMetrics, TelemetryFrame};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Drives a [`Collector`] at a fixed period until stopped.
#[derive(Debug)]
pub struct Sampler {
    collector: Collector,
    period: Duration,
    max_ticks: Option<u64>,
    speed_feed: Option<watch::Receiver<f64>>,
}

impl Sampler {
    pub fn new(collector: Collector, period: Duration) -> Self {
        Self {
            collector,
            period,
            max_ticks: None,
            speed_feed: None,
        }
    }

    /// Stops after `n` ticks even without a shutdown signal.
    pub fn with_max_ticks(mut self, n: u64) -> Self {
        self.max_ticks = Some(n);
        self
    }

    /// Applies the latest value from `feed` as the speed before each tick.
    pub fn with_speed_feed(mut self, feed: watch::Receiver<f64>) -> Self {
        self.speed_feed = Some(feed);
        self
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut Collector {
        &mut self.collector
    }

    pub fn into_collector(self) -> Collector {
        self.collector
    }

    /// Runs until `shutdown` resolves or the tick limit is reached, passing
    /// each frame to `on_frame`. The first tick fires immediately.
    pub async fn run<S, F>(&mut self, shutdown: S, mut on_frame: F) -> SamplingMetrics
    where
        S: Future<Output = ()>,
        F: FnMut(&TelemetryFrame),
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut metrics = SamplingMetrics::new(self.period);
        tracing::info!("sampling every {:?}", self.period);

        loop {
            if self.max_ticks.is_some_and(|n| metrics.ticks >= n) {
                tracing::debug!("tick limit reached");
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("stop requested");
                    break;
                }
                _ = interval.tick() => {}
            }

            self.apply_speed_feed();

            let started = Instant::now();
            let frame = self.collector.tick();
            let elapsed = started.elapsed();
            if metrics.record(elapsed) {
                tracing::warn!(
                    "tick {} took {:?}, longer than the {:?} period",
                    metrics.ticks,
                    elapsed,
                    self.period
                );
            }
            on_frame(&frame);
        }

        tracing::info!("{}", metrics.summary());
        metrics
    }

    fn apply_speed_feed(&mut self) {
        let Some(feed) = self.speed_feed.as_mut() else {
            return;
        };
        if !feed.has_changed().unwrap_or(false) {
            return;
        }
        let speed = *feed.borrow_and_update();
        if let Err(e) = self.collector.set_speed(speed) {
            tracing::warn!("ignoring speed update: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelemetryConfig;
    use robot_monitor::{BatteryConfig, ComputeConfig};
    use std::path::PathBuf;

    fn collector() -> Collector {
        let missing = PathBuf::from("/nonexistent/robot-telemetry-sampler");
        let config = TelemetryConfig {
            read_timeout_ms: None,
            battery: BatteryConfig {
                voltage_path: missing.join("v"),
                current_path: missing.join("i"),
                ..Default::default()
            },
            compute: ComputeConfig {
                cpu_base: missing.join("cpu"),
                proc_stat_path: missing.join("stat"),
                meminfo_path: missing.join("meminfo"),
                cpu_temp_path: missing.join("t0"),
                gpu_load_path: missing.join("load"),
                gpu_freq_path: missing.join("freq"),
                gpu_temp_path: missing.join("t1"),
                ina_base: missing.join("ina"),
                ..Default::default()
            },
            ..Default::default()
        };
        Collector::new(&config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_max_ticks() {
        let mut sampler = Sampler::new(collector(), Duration::from_secs(1)).with_max_ticks(3);
        let mut frames = 0;
        let metrics = sampler
            .run(std::future::pending(), |_| frames += 1)
            .await;
        assert_eq!(frames, 3);
        assert_eq!(metrics.ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_between_ticks() {
        let mut sampler = Sampler::new(collector(), Duration::from_secs(1));
        let shutdown = tokio::time::sleep(Duration::from_millis(2500));
        let mut frames = 0;
        let metrics = sampler.run(shutdown, |_| frames += 1).await;
        // Ticks at 0 s, 1 s and 2 s; the stop at 2.5 s precedes the 3 s tick.
        assert_eq!(frames, 3);
        assert_eq!(metrics.ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_shutdown_runs_no_tick() {
        let mut sampler = Sampler::new(collector(), Duration::from_secs(1));
        let metrics = sampler.run(async {}, |_| panic!("no tick expected")).await;
        assert_eq!(metrics.ticks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_feed_applies_before_tick() {
        let (tx, rx) = watch::channel(0.0);
        let mut sampler = Sampler::new(collector(), Duration::from_secs(1))
            .with_max_ticks(2)
            .with_speed_feed(rx);
        tx.send(3.0).unwrap();

        let mut speeds = Vec::new();
        sampler
            .run(std::future::pending(), |f| speeds.push(f.motion.speed_mps))
            .await;
        assert_eq!(speeds, vec![3.0, 3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_speed_update_is_ignored() {
        let (tx, rx) = watch::channel(1.0);
        let mut sampler = Sampler::new(collector(), Duration::from_secs(1))
            .with_max_ticks(1)
            .with_speed_feed(rx);
        tx.send(f64::INFINITY).unwrap();

        let mut speeds = Vec::new();
        sampler
            .run(std::future::pending(), |f| speeds.push(f.motion.speed_mps))
            .await;
        assert_eq!(speeds, vec![0.0]);
    }
}
