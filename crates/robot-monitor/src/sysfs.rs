// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bounded, best-effort reads of numeric sysfs/procfs files.
//!
//! Device files normally answer immediately, but a wedged I²C driver can
//! block a `read(2)` indefinitely. When a timeout is configured, each read
//! runs on a helper thread and is abandoned once the timeout expires. A
//! path whose helper thread is still blocked is not read again until that
//! thread returns, so one hung file costs one thread and one timeout, not
//! one of each per tick. [`SysfsReader::begin_tick`] additionally caps the
//! total time a tick may spend waiting on reads.

use crate::MonitorError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Reader shared by all monitors. Clones share stall tracking and the
/// current tick deadline.
#[derive(Debug, Clone, Default)]
pub struct SysfsReader {
    timeout: Option<Duration>,
    state: Arc<Mutex<ReadState>>,
}

#[derive(Debug, Default)]
struct ReadState {
    /// Paths whose helper thread has not returned yet.
    in_flight: HashSet<PathBuf>,
    /// End of the current tick's read budget.
    deadline: Option<Instant>,
}

fn lock(state: &Mutex<ReadState>) -> MutexGuard<'_, ReadState> {
    // Nothing panics while holding the lock, but a poisoned set is still valid.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SysfsReader {
    /// Creates a reader. `None` reads inline with no timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            state: Arc::default(),
        }
    }

    /// The per-read timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Starts a tick whose timed reads must all finish within `budget`.
    ///
    /// Once the budget is spent, remaining reads fail with
    /// [`MonitorError::BudgetExhausted`] without touching the file. Has no
    /// effect on a reader without a timeout.
    pub fn begin_tick(&self, budget: Duration) {
        lock(&self.state).deadline = Instant::now().checked_add(budget);
    }

    /// Clears the tick deadline set by [`begin_tick`](Self::begin_tick).
    pub fn end_tick(&self) {
        lock(&self.state).deadline = None;
    }

    /// Number of paths with a read still blocked in the kernel.
    pub fn stalled_reads(&self) -> usize {
        lock(&self.state).in_flight.len()
    }

    /// Reads a file and returns its trimmed content.
    pub fn read_string(&self, path: &Path) -> Result<String, MonitorError> {
        match self.timeout {
            None => read_trimmed(path),
            Some(timeout) => self.read_with_timeout(path, timeout),
        }
    }

    /// Reads a number and divides it by `scale` (e.g. `1000.0` for mV → V).
    ///
    /// Non-finite results are rejected as parse errors so a sensor can
    /// never inject `NaN` into an estimator.
    pub fn read_f64(&self, path: &Path, scale: f64) -> Result<f64, MonitorError> {
        let content = self.read_string(path)?;
        let raw: f64 = content.parse().map_err(|_| MonitorError::ParseError {
            path: path.display().to_string(),
            detail: format!("expected a number, got '{content}'"),
        })?;
        let value = raw / scale;
        if !value.is_finite() {
            return Err(MonitorError::ParseError {
                path: path.display().to_string(),
                detail: format!("non-finite value '{content}' (scale {scale})"),
            });
        }
        Ok(value)
    }

    /// Like [`read_f64`](Self::read_f64), but a failed read yields `None`.
    pub fn read_scaled(&self, path: &Path, scale: f64) -> Option<f64> {
        match self.read_f64(path, scale) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("sensor read failed, reporting absent: {e}");
                None
            }
        }
    }

    fn read_with_timeout(&self, path: &Path, timeout: Duration) -> Result<String, MonitorError> {
        let wait = {
            let mut state = lock(&self.state);
            if state.in_flight.contains(path) {
                return Err(MonitorError::Stalled {
                    path: path.display().to_string(),
                });
            }
            let wait = match state.deadline {
                Some(deadline) => timeout.min(deadline.saturating_duration_since(Instant::now())),
                None => timeout,
            };
            if wait.is_zero() {
                return Err(MonitorError::BudgetExhausted {
                    path: path.display().to_string(),
                });
            }
            state.in_flight.insert(path.to_path_buf());
            wait
        };

        let (tx, rx) = mpsc::sync_channel(1);
        let owned = path.to_path_buf();
        let shared = Arc::clone(&self.state);
        let spawned = std::thread::Builder::new()
            .name("sysfs-read".into())
            .spawn(move || {
                let result = read_trimmed(&owned);
                lock(&shared).in_flight.remove(&owned);
                // The receiver may be gone after a timeout.
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            lock(&self.state).in_flight.remove(path);
            return Err(MonitorError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        }

        match rx.recv_timeout(wait) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "read of {} blocked for {wait:?}; skipping it until it returns",
                    path.display()
                );
                Err(MonitorError::Timeout {
                    path: path.display().to_string(),
                    timeout_ms: wait.as_millis() as u64,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(MonitorError::ReadError {
                path: path.display().to_string(),
                source: std::io::Error::other("reader thread exited without a result"),
            }),
        }
    }
}

/// Reads a sysfs/procfs file and returns its trimmed content.
fn read_trimmed(path: &Path) -> Result<String, MonitorError> {
    if !path.exists() {
        return Err(MonitorError::NotAvailable {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| MonitorError::ReadError {
            path: path.display().to_string(),
            source: e,
        })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_read_scaled_millivolts() {
        let dir = scratch_dir("sysfs_mv");
        let p = write_file(&dir, "voltage_now", "12600\n");
        let v = SysfsReader::default().read_f64(&p, 1000.0).unwrap();
        assert!((v - 12.6).abs() < 1e-9);
    }

    #[test]
    fn test_negative_value() {
        let dir = scratch_dir("sysfs_neg");
        let p = write_file(&dir, "current_now", "-1500");
        let i = SysfsReader::default().read_f64(&p, 1000.0).unwrap();
        assert!((i + 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_file() {
        let result = SysfsReader::default().read_f64(Path::new("/nonexistent/sensor"), 1.0);
        assert!(matches!(result, Err(MonitorError::NotAvailable { .. })));
    }

    #[test]
    fn test_invalid_content() {
        let dir = scratch_dir("sysfs_invalid");
        let p = write_file(&dir, "temp", "not_a_number");
        let result = SysfsReader::default().read_f64(&p, 1.0);
        assert!(matches!(result, Err(MonitorError::ParseError { .. })));
    }

    #[test]
    fn test_nan_rejected() {
        let dir = scratch_dir("sysfs_nan");
        let p = write_file(&dir, "load", "NaN");
        assert!(SysfsReader::default().read_scaled(&p, 10.0).is_none());
    }

    #[test]
    fn test_read_with_timeout_succeeds() {
        let dir = scratch_dir("sysfs_timeout_ok");
        let p = write_file(&dir, "temp", "54321");
        let reader = SysfsReader::new(Some(Duration::from_secs(2)));
        let t = reader.read_f64(&p, 1000.0).unwrap();
        assert!((t - 54.321).abs() < 1e-9);
    }

    #[test]
    fn test_read_with_timeout_missing() {
        let reader = SysfsReader::new(Some(Duration::from_secs(2)));
        let result = reader.read_string(Path::new("/nonexistent/thermal/temp"));
        assert!(matches!(result, Err(MonitorError::NotAvailable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_read_times_out_once_then_is_skipped() {
        let dir = scratch_dir("sysfs_hung");
        let fifo = make_fifo(&dir, "in1_input");
        let reader = SysfsReader::new(Some(Duration::from_millis(100)));

        let start = Instant::now();
        let first = reader.read_string(&fifo);
        assert!(matches!(first, Err(MonitorError::Timeout { .. })));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(reader.stalled_reads(), 1);

        // Further reads neither wait nor start another thread.
        let start = Instant::now();
        for _ in 0..20 {
            assert!(matches!(
                reader.read_string(&fifo),
                Err(MonitorError::Stalled { .. })
            ));
        }
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(reader.stalled_reads(), 1);

        // Clones share the stall state.
        let clone = reader.clone();
        assert!(clone.read_scaled(&fifo, 1000.0).is_none());

        release_fifo(&fifo, "12000\n");
        assert!(wait_until(Duration::from_secs(2), || reader.stalled_reads() == 0));
    }

    #[cfg(unix)]
    #[test]
    fn test_tick_budget_caps_read_time() {
        let dir = scratch_dir("sysfs_budget");
        let hung: Vec<_> = (1..=4)
            .map(|n| make_fifo(&dir, &format!("curr{n}_input")))
            .collect();
        let healthy = write_file(&dir, "in1_input", "5000");
        let reader = SysfsReader::new(Some(Duration::from_millis(200)));

        reader.begin_tick(Duration::from_millis(300));
        let start = Instant::now();
        for path in &hung {
            assert!(reader.read_scaled(path, 1000.0).is_none());
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(250), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(550), "elapsed {elapsed:?}");
        assert!(matches!(
            reader.read_string(&healthy),
            Err(MonitorError::BudgetExhausted { .. })
        ));

        let stalled = reader.stalled_reads();
        assert!((1..hung.len()).contains(&stalled), "stalled {stalled}");

        // Next tick: healthy files read again, a hung one is skipped at once.
        reader.begin_tick(Duration::from_secs(1));
        let start = Instant::now();
        assert!((reader.read_f64(&healthy, 1000.0).unwrap() - 5.0).abs() < 1e-9);
        assert!(matches!(
            reader.read_string(&hung[0]),
            Err(MonitorError::Stalled { .. })
        ));
        assert!(start.elapsed() < Duration::from_millis(50));
        reader.end_tick();
        assert_eq!(reader.stalled_reads(), stalled);

        for path in &hung {
            release_fifo(path, "0");
        }
        assert!(wait_until(Duration::from_secs(2), || reader.stalled_reads() == 0));
    }
}
