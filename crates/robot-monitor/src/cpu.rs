// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CPU utilisation and per-core frequency.
//!
//! Reads CPU state from:
//! - `<cpu_base>/online`: the kernel's list of online cores (`"0-5"`).
//! - `<cpu_base>/cpu<N>/cpufreq/scaling_cur_freq`: per-core frequency (kHz).
//! - `/proc/stat`: aggregate jiffy counters; utilisation is the busy
//!   fraction of the delta between two consecutive samples.
//!
//! # Jetson specifics
//! The Orin NX runs its Cortex-A78AE cores in two clusters that can sit at
//! different frequencies, so every core is read and the mean is reported.

use crate::SysfsReader;
use std::path::{Path, PathBuf};

/// Aggregate jiffy counters from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CpuTimes {
    idle: u64,
    total: u64,
}

/// One CPU reading. Every field can be absent independently.
#[derive(Debug, Clone, Default)]
pub(crate) struct CpuReading {
    pub usage_pct: Option<f64>,
    pub core_freqs_mhz: Vec<f64>,
    pub avg_freq_mhz: Option<f64>,
}

/// Holds the core list and the previous `/proc/stat` counters.
#[derive(Debug)]
pub(crate) struct CpuMonitor {
    cpu_base: PathBuf,
    proc_stat_path: PathBuf,
    freq_scale: f64,
    cores: Vec<u32>,
    prev_times: Option<CpuTimes>,
}

impl CpuMonitor {
    pub fn new(
        reader: &SysfsReader,
        cpu_base: PathBuf,
        proc_stat_path: PathBuf,
        freq_scale: f64,
    ) -> Self {
        let cores = discover_cores(reader, &cpu_base);
        tracing::debug!("monitoring {} cpu cores: {cores:?}", cores.len());
        Self {
            cpu_base,
            proc_stat_path,
            freq_scale,
            cores,
            prev_times: None,
        }
    }

    pub fn cores(&self) -> &[u32] {
        &self.cores
    }

    pub fn sample(&mut self, reader: &SysfsReader) -> CpuReading {
        let usage_pct = self.sample_usage(reader);

        let core_freqs_mhz: Vec<f64> = self
            .cores
            .iter()
            .filter_map(|core| {
                let path = self
                    .cpu_base
                    .join(format!("cpu{core}/cpufreq/scaling_cur_freq"));
                reader.read_scaled(&path, self.freq_scale)
            })
            .collect();

        CpuReading {
            usage_pct,
            avg_freq_mhz: mean(&core_freqs_mhz),
            core_freqs_mhz,
        }
    }

    /// Utilisation since the previous call. The first call only records counters.
    fn sample_usage(&mut self, reader: &SysfsReader) -> Option<f64> {
        let current = match reader.read_string(&self.proc_stat_path) {
            Ok(content) => parse_proc_stat(&content),
            Err(e) => {
                tracing::debug!("cpu usage unavailable: {e}");
                None
            }
        };
        let previous = std::mem::replace(&mut self.prev_times, current);
        usage_between(previous?, current?)
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// Format: `cpu user nice system idle iowait irq softirq steal ...`.
/// Idle time is `idle + iowait`.
pub(crate) fn parse_proc_stat(content: &str) -> Option<CpuTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().ok())
        .collect::<Option<Vec<u64>>>()?;
    if fields.len() < 4 {
        return None;
    }
    // guest/guest_nice are already folded into user/nice.
    let counted = &fields[..fields.len().min(8)];
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        idle,
        total: counted.iter().sum(),
    })
}

/// Busy percentage between two counter snapshots.
pub(crate) fn usage_between(prev: CpuTimes, cur: CpuTimes) -> Option<f64> {
    let total = cur.total.checked_sub(prev.total)?;
    let idle = cur.idle.checked_sub(prev.idle)?;
    if total == 0 {
        return None;
    }
    let busy = total.saturating_sub(idle);
    Some((busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

/// Determines the indices of online CPU cores.
///
/// Tries `<cpu_base>/online` first (e.g., `"0,2-3"` → `[0, 2, 3]`), then
/// falls back to `std::thread::available_parallelism()`.
fn discover_cores(reader: &SysfsReader, cpu_base: &Path) -> Vec<u32> {
    if let Ok(content) = reader.read_string(&cpu_base.join("online")) {
        if let Some(cores) = parse_cpu_list(&content) {
            return cores;
        }
    }
    let n = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1);
    (0..n).collect()
}

/// Parses a kernel CPU list like `"0-3"` → `[0, 1, 2, 3]`, `"0,2-3"` → `[0, 2, 3]`.
pub(crate) fn parse_cpu_list(s: &str) -> Option<Vec<u32>> {
    let mut cores = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if let Some((start_s, end_s)) = part.split_once('-') {
            let start: u32 = start_s.trim().parse().ok()?;
            let end: u32 = end_s.trim().parse().ok()?;
            if end < start {
                return None;
            }
            cores.extend(start..=end);
        } else {
            cores.push(part.parse().ok()?);
        }
    }
    if cores.is_empty() {
        None
    } else {
        Some(cores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::test_support::{scratch_dir, write_file};

    const STAT_A: &str = "cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 50 0 50 350 50 0 0 0 0 0\n";
    const STAT_B: &str = "cpu  200 0 150 850 100 0 0 0 0 0\ncpu0 100 0 75 425 50 0 0 0 0 0\n";

    #[test]
    fn test_parse_cpu_list_simple() {
        assert_eq!(parse_cpu_list("0-3"), Some(vec![0, 1, 2, 3]));
        assert_eq!(parse_cpu_list("0"), Some(vec![0]));
    }

    #[test]
    fn test_parse_cpu_list_complex() {
        assert_eq!(parse_cpu_list("0,2-3"), Some(vec![0, 2, 3]));
        assert_eq!(parse_cpu_list("0-1,4-5"), Some(vec![0, 1, 4, 5]));
    }

    #[test]
    fn test_parse_cpu_list_invalid() {
        assert_eq!(parse_cpu_list(""), None);
        assert_eq!(parse_cpu_list("abc"), None);
        assert_eq!(parse_cpu_list("3-1"), None);
    }

    #[test]
    fn test_parse_proc_stat() {
        let t = parse_proc_stat(STAT_A).unwrap();
        assert_eq!(t.total, 1000);
        assert_eq!(t.idle, 800);
    }

    #[test]
    fn test_usage_between() {
        let a = parse_proc_stat(STAT_A).unwrap();
        let b = parse_proc_stat(STAT_B).unwrap();
        // delta total 300, delta idle 150 → 50 % busy
        let usage = usage_between(a, b).unwrap();
        assert!((usage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_usage_no_progress() {
        let a = parse_proc_stat(STAT_A).unwrap();
        assert_eq!(usage_between(a, a), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1000.0, 2000.0]), Some(1500.0));
    }

    #[test]
    fn test_monitor_averages_readable_cores() {
        let dir = scratch_dir("cpu_monitor");
        write_file(&dir, "online", "0-2");
        write_file(&dir, "cpu0/cpufreq/scaling_cur_freq", "1984000");
        write_file(&dir, "cpu1/cpufreq/scaling_cur_freq", "1016000");
        // cpu2 has no cpufreq node.
        let stat = write_file(&dir, "stat", STAT_A);

        let reader = SysfsReader::default();
        let mut cpu = CpuMonitor::new(&reader, dir.clone(), stat.clone(), 1000.0);
        assert_eq!(cpu.cores(), &[0, 1, 2]);

        let first = cpu.sample(&reader);
        assert_eq!(first.usage_pct, None);
        assert_eq!(first.core_freqs_mhz, vec![1984.0, 1016.0]);
        assert_eq!(first.avg_freq_mhz, Some(1500.0));

        std::fs::write(&stat, STAT_B).unwrap();
        let second = cpu.sample(&reader);
        assert!((second.usage_pct.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_frequencies_is_absent_not_zero() {
        let dir = scratch_dir("cpu_nofreq");
        write_file(&dir, "online", "0-1");
        let reader = SysfsReader::default();
        let mut cpu = CpuMonitor::new(&reader, dir.clone(), dir.join("stat"), 1000.0);
        let reading = cpu.sample(&reader);
        assert!(reading.core_freqs_mhz.is_empty());
        assert_eq!(reading.avg_freq_mhz, None);
        assert_eq!(reading.usage_pct, None);
    }
}
