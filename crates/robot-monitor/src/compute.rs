// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Compute-node telemetry: CPU, GPU, memory, temperatures and power rails.
//!
//! A [`ComputeSnapshot`] is rebuilt from scratch on every sample. Each
//! sub-read fails independently: a missing GPU load node leaves only
//! `gpu_util_pct` absent, never the whole snapshot.

use crate::cpu::CpuMonitor;
use crate::memory::MemoryUsage;
use crate::power::{self, RailMapping, RailRole};
use crate::{MonitorError, SysfsReader};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Sensor locations and scales for the compute module.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputeConfig {
    /// Base of the per-core cpufreq tree.
    pub cpu_base: PathBuf,
    /// Divisor from `scaling_cur_freq` to MHz (1000 for kHz).
    pub cpu_freq_scale: f64,
    pub proc_stat_path: PathBuf,
    pub meminfo_path: PathBuf,
    pub cpu_temp_path: PathBuf,
    /// Divisor to °C (1000 for millidegrees).
    pub cpu_temp_scale: f64,
    pub gpu_load_path: PathBuf,
    /// Divisor to percent (10 for the Tegra per-mille load node).
    pub gpu_load_scale: f64,
    pub gpu_freq_path: PathBuf,
    /// Divisor to MHz (1e6 for Hz).
    pub gpu_freq_scale: f64,
    pub gpu_temp_path: PathBuf,
    pub gpu_temp_scale: f64,
    /// Directory searched for INA3221 rails.
    pub ina_base: PathBuf,
    /// Channel index → summary role.
    #[serde(default)]
    pub rails: Vec<RailMapping>,
}

impl ComputeConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        crate::check_scale("compute.cpu_freq_scale", self.cpu_freq_scale)?;
        crate::check_scale("compute.cpu_temp_scale", self.cpu_temp_scale)?;
        crate::check_scale("compute.gpu_load_scale", self.gpu_load_scale)?;
        crate::check_scale("compute.gpu_freq_scale", self.gpu_freq_scale)?;
        crate::check_scale("compute.gpu_temp_scale", self.gpu_temp_scale)?;

        for (i, mapping) in self.rails.iter().enumerate() {
            if let Some(dup) = self.rails[..i]
                .iter()
                .find(|m| m.index == mapping.index || m.role == mapping.role)
            {
                return Err(MonitorError::invalid(
                    "compute.rails",
                    format!(
                        "rail {} ({:?}) conflicts with rail {} ({:?})",
                        mapping.index, mapping.role, dup.index, dup.role
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Default for ComputeConfig {
    /// Jetson Orin NX (GA10B GPU, INA3221 on I²C).
    fn default() -> Self {
        Self {
            cpu_base: PathBuf::from("/sys/devices/system/cpu"),
            cpu_freq_scale: 1000.0,
            proc_stat_path: PathBuf::from("/proc/stat"),
            meminfo_path: PathBuf::from("/proc/meminfo"),
            cpu_temp_path: PathBuf::from("/sys/devices/virtual/thermal/thermal_zone0/temp"),
            cpu_temp_scale: 1000.0,
            gpu_load_path: PathBuf::from("/sys/devices/gpu.0/load"),
            gpu_load_scale: 10.0,
            gpu_freq_path: PathBuf::from(
                "/sys/devices/17000000.ga10b/devfreq/17000000.ga10b/cur_freq",
            ),
            gpu_freq_scale: 1e6,
            gpu_temp_path: PathBuf::from("/sys/devices/virtual/thermal/thermal_zone1/temp"),
            gpu_temp_scale: 1000.0,
            ina_base: PathBuf::from("/sys/bus/i2c/drivers/ina3221x"),
            rails: vec![
                RailMapping {
                    index: 1,
                    role: RailRole::Total,
                },
                RailMapping {
                    index: 2,
                    role: RailRole::Compute,
                },
                RailMapping {
                    index: 3,
                    role: RailRole::Soc,
                },
            ],
        }
    }
}

/// A point-in-time reading of the compute module.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ComputeSnapshot {
    /// Busy percentage since the previous sample; absent on the first one.
    pub cpu_usage_pct: Option<f64>,
    /// Mean over the cores that reported a frequency.
    pub cpu_freq_mhz: Option<f64>,
    pub cpu_core_freqs_mhz: Vec<f64>,
    pub cpu_temp_c: Option<f64>,
    pub gpu_util_pct: Option<f64>,
    pub gpu_freq_mhz: Option<f64>,
    pub gpu_temp_c: Option<f64>,
    pub mem_used_mb: Option<f64>,
    pub mem_percent: Option<f64>,
    /// Every discovered rail, by raw name, in milliwatts.
    pub power_rails: BTreeMap<String, Option<f64>>,
    pub power_total_mw: Option<f64>,
    pub power_compute_mw: Option<f64>,
    pub power_soc_mw: Option<f64>,
    /// Unix timestamp in milliseconds when the snapshot was taken.
    pub timestamp_ms: u64,
}

impl ComputeSnapshot {
    /// The hottest available temperature, or `None` if neither sensor read.
    pub fn hottest_temp_c(&self) -> Option<f64> {
        match (self.cpu_temp_c, self.gpu_temp_c) {
            (Some(c), Some(g)) => Some(c.max(g)),
            (c, g) => c.or(g),
        }
    }

    /// Returns a summary string suitable for logging or CLI display.
    ///
    /// # Example output
    /// ```text
    /// CPU 42.0% @ 1420 MHz, GPU 12.0% @ 612 MHz, Temp 51.2°C, Mem 3120 MB (39%), Power 7450 mW
    /// ```
    pub fn summary(&self) -> String {
        fn opt(v: Option<f64>, prec: usize) -> String {
            v.map(|x| format!("{x:.prec$}"))
                .unwrap_or_else(|| "n/a".to_string())
        }
        format!(
            "CPU {}% @ {} MHz, GPU {}% @ {} MHz, Temp {}°C, Mem {} MB ({}%), Power {} mW",
            opt(self.cpu_usage_pct, 1),
            opt(self.cpu_freq_mhz, 0),
            opt(self.gpu_util_pct, 1),
            opt(self.gpu_freq_mhz, 0),
            opt(self.hottest_temp_c(), 1),
            opt(self.mem_used_mb, 0),
            opt(self.mem_percent, 0),
            opt(self.power_total_mw, 0),
        )
    }
}

/// Aggregates every compute sub-read into one [`ComputeSnapshot`].
#[derive(Debug)]
pub struct ComputeTelemetry {
    config: ComputeConfig,
    reader: SysfsReader,
    cpu: CpuMonitor,
}

impl ComputeTelemetry {
    pub fn new(config: ComputeConfig, reader: SysfsReader) -> Result<Self, MonitorError> {
        config.validate()?;
        let cpu = CpuMonitor::new(
            &reader,
            config.cpu_base.clone(),
            config.proc_stat_path.clone(),
            config.cpu_freq_scale,
        );
        Ok(Self {
            config,
            reader,
            cpu,
        })
    }

    /// Core indices discovered at construction.
    pub fn cores(&self) -> &[u32] {
        self.cpu.cores()
    }

    /// Takes a best-effort snapshot. Never fails; unreadable fields are `None`.
    pub fn sample(&mut self) -> ComputeSnapshot {
        let reader = &self.reader;
        let cfg = &self.config;

        let cpu = self.cpu.sample(reader);

        let memory = match MemoryUsage::read(reader, &cfg.meminfo_path) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::debug!("memory usage unavailable: {e}");
                None
            }
        };

        let rails = power::read_rails(reader, &cfg.ina_base, &cfg.rails);

        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        ComputeSnapshot {
            cpu_usage_pct: cpu.usage_pct,
            cpu_freq_mhz: cpu.avg_freq_mhz,
            cpu_core_freqs_mhz: cpu.core_freqs_mhz,
            cpu_temp_c: reader.read_scaled(&cfg.cpu_temp_path, cfg.cpu_temp_scale),
            gpu_util_pct: reader.read_scaled(&cfg.gpu_load_path, cfg.gpu_load_scale),
            gpu_freq_mhz: reader.read_scaled(&cfg.gpu_freq_path, cfg.gpu_freq_scale),
            gpu_temp_c: reader.read_scaled(&cfg.gpu_temp_path, cfg.gpu_temp_scale),
            mem_used_mb: memory.map(|m| m.used_mb()),
            mem_percent: memory.and_then(|m| m.percent()),
            power_total_mw: power::power_for(&rails, RailRole::Total),
            power_compute_mw: power::power_for(&rails, RailRole::Compute),
            power_soc_mw: power::power_for(&rails, RailRole::Soc),
            power_rails: power::rail_map(&rails),
            timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::test_support::{scratch_dir, write_file};
    use std::path::Path;

    /// Builds a config whose every path points inside `root`.
    fn config_in(root: &Path) -> ComputeConfig {
        ComputeConfig {
            cpu_base: root.join("cpu"),
            proc_stat_path: root.join("proc/stat"),
            meminfo_path: root.join("proc/meminfo"),
            cpu_temp_path: root.join("thermal/zone0"),
            gpu_load_path: root.join("gpu/load"),
            gpu_freq_path: root.join("gpu/cur_freq"),
            gpu_temp_path: root.join("thermal/zone1"),
            ina_base: root.join("ina3221x"),
            ..Default::default()
        }
    }

    fn populate(root: &Path) {
        write_file(root, "cpu/online", "0-1");
        write_file(root, "cpu/cpu0/cpufreq/scaling_cur_freq", "1500000");
        write_file(root, "cpu/cpu1/cpufreq/scaling_cur_freq", "1700000");
        write_file(root, "proc/stat", "cpu  10 0 10 80 0 0 0 0 0 0\n");
        write_file(root, "proc/meminfo", "MemTotal: 8000000 kB\nMemAvailable: 6000000 kB\n");
        write_file(root, "thermal/zone0", "51200");
        write_file(root, "thermal/zone1", "49800");
        write_file(root, "gpu/load", "375");
        write_file(root, "gpu/cur_freq", "612000000");
        write_file(root, "ina3221x/1-0040/in1_input", "5000");
        write_file(root, "ina3221x/1-0040/curr1_input", "1490");
        write_file(root, "ina3221x/1-0040/in2_input", "5000");
        write_file(root, "ina3221x/1-0040/curr2_input", "600");
        write_file(root, "ina3221x/1-0040/in3_input", "5000");
        write_file(root, "ina3221x/1-0040/curr3_input", "300");
    }

    #[test]
    fn test_full_snapshot() {
        let root = scratch_dir("compute_full");
        populate(&root);
        let mut telemetry = ComputeTelemetry::new(config_in(&root), SysfsReader::default()).unwrap();
        let snap = telemetry.sample();

        assert_eq!(snap.cpu_usage_pct, None);
        assert_eq!(snap.cpu_freq_mhz, Some(1600.0));
        assert_eq!(snap.cpu_core_freqs_mhz.len(), 2);
        assert!((snap.cpu_temp_c.unwrap() - 51.2).abs() < 1e-9);
        assert!((snap.gpu_util_pct.unwrap() - 37.5).abs() < 1e-9);
        assert!((snap.gpu_freq_mhz.unwrap() - 612.0).abs() < 1e-9);
        assert!((snap.mem_percent.unwrap() - 25.0).abs() < 1e-9);
        assert!((snap.power_total_mw.unwrap() - 7450.0).abs() < 1e-6);
        assert!((snap.power_compute_mw.unwrap() - 3000.0).abs() < 1e-6);
        assert!((snap.power_soc_mw.unwrap() - 1500.0).abs() < 1e-6);
        assert_eq!(snap.power_rails.len(), 3);
        assert_eq!(snap.hottest_temp_c(), Some(51.2));
        assert!(snap.timestamp_ms > 0);
    }

    #[test]
    fn test_second_sample_has_usage() {
        let root = scratch_dir("compute_usage");
        populate(&root);
        let mut telemetry = ComputeTelemetry::new(config_in(&root), SysfsReader::default()).unwrap();
        telemetry.sample();
        write_file(&root, "proc/stat", "cpu  40 0 20 140 0 0 0 0 0 0\n");
        let snap = telemetry.sample();
        // delta total 100, delta idle 60
        assert!((snap.cpu_usage_pct.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_failing_sensor_does_not_blank_snapshot() {
        let root = scratch_dir("compute_partial");
        populate(&root);
        std::fs::remove_file(root.join("gpu/load")).unwrap();
        std::fs::remove_file(root.join("thermal/zone0")).unwrap();
        std::fs::remove_file(root.join("ina3221x/1-0040/curr2_input")).unwrap();

        let mut telemetry = ComputeTelemetry::new(config_in(&root), SysfsReader::default()).unwrap();
        let snap = telemetry.sample();
        assert_eq!(snap.gpu_util_pct, None);
        assert_eq!(snap.cpu_temp_c, None);
        assert_eq!(snap.power_compute_mw, None);
        assert_eq!(snap.power_rails.get("in2"), Some(&None));

        assert!(snap.gpu_freq_mhz.is_some());
        assert!(snap.power_total_mw.is_some());
        assert_eq!(snap.hottest_temp_c(), Some(49.8));
        assert_eq!(snap.cpu_freq_mhz, Some(1600.0));
    }

    #[test]
    fn test_empty_platform_is_all_absent() {
        let root = scratch_dir("compute_empty");
        write_file(&root, "cpu/online", "0");
        let mut telemetry = ComputeTelemetry::new(config_in(&root), SysfsReader::default()).unwrap();
        let snap = telemetry.sample();
        assert_eq!(snap.cpu_freq_mhz, None);
        assert_eq!(snap.mem_used_mb, None);
        assert_eq!(snap.hottest_temp_c(), None);
        assert!(snap.power_rails.is_empty());
        assert!(snap.summary().contains("n/a"));
    }

    #[test]
    fn test_rejects_zero_scale_and_duplicate_roles() {
        let zero = ComputeConfig {
            gpu_freq_scale: 0.0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let mut dup = ComputeConfig::default();
        dup.rails.push(RailMapping {
            index: 4,
            role: RailRole::Total,
        });
        assert!(matches!(
            dup.validate(),
            Err(MonitorError::InvalidParameter { name: "compute.rails", .. })
        ));
    }

    #[test]
    fn test_summary_format() {
        let snap = ComputeSnapshot {
            cpu_usage_pct: Some(42.0),
            cpu_freq_mhz: Some(1420.0),
            gpu_util_pct: Some(12.0),
            gpu_freq_mhz: Some(612.0),
            cpu_temp_c: Some(51.2),
            mem_used_mb: Some(3120.0),
            mem_percent: Some(39.0),
            power_total_mw: Some(7450.0),
            ..Default::default()
        };
        let s = snap.summary();
        assert!(s.contains("CPU 42.0% @ 1420 MHz"));
        assert!(s.contains("Temp 51.2°C"));
        assert!(s.contains("Power 7450 mW"));
    }

    #[test]
    fn test_snapshot_json_fields() {
        let mut snap = ComputeSnapshot {
            cpu_freq_mhz: Some(1420.0),
            power_total_mw: Some(7450.0),
            timestamp_ms: 1_700_000_000_000,
            ..Default::default()
        };
        snap.power_rails.insert("VDD_IN".to_string(), Some(7450.0));
        snap.power_rails.insert("in4".to_string(), None);

        let json = serde_json::to_value(&snap).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "cpu_core_freqs_mhz",
                "cpu_freq_mhz",
                "cpu_temp_c",
                "cpu_usage_pct",
                "gpu_freq_mhz",
                "gpu_temp_c",
                "gpu_util_pct",
                "mem_percent",
                "mem_used_mb",
                "power_compute_mw",
                "power_rails",
                "power_soc_mw",
                "power_total_mw",
                "timestamp_ms",
            ]
        );
        assert!(obj["cpu_usage_pct"].is_null());
        assert_eq!(obj["power_rails"]["VDD_IN"], 7450.0);
        assert!(obj["power_rails"]["in4"].is_null());
        assert_eq!(obj["timestamp_ms"], 1_700_000_000_000u64);
    }
}
