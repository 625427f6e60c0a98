// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Power-rail discovery for INA3221-style monitors.
//!
//! The INA3221 hwmon driver exposes each channel `N` as
//! `in{N}_input` (bus voltage, mV), `curr{N}_input` (current, mA) and an
//! optional `in{N}_label` (e.g. `VDD_IN`). Rails are found by searching the
//! configured base directory, following symlinks down to a bounded depth,
//! since the device node usually sits a few links below the driver
//! directory (`ina3221x/1-0040/hwmon/hwmon3/`).
//!
//! On the Orin NX the channels are:
//! 1. `VDD_IN`: total module input
//! 2. `VDD_CPU_GPU_CV`: compute
//! 3. `VDD_SOC`

use crate::SysfsReader;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How deep below the base directory to search for rail files.
const MAX_SEARCH_DEPTH: usize = 4;

/// Sysfs back-links that lead out of the device tree.
const SKIPPED_ENTRIES: &[&str] = &["subsystem", "driver", "module", "firmware_node", "of_node"];

/// Summary role of a rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RailRole {
    Total,
    Compute,
    Soc,
}

/// Maps a channel index to a summary role.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RailMapping {
    pub index: u32,
    pub role: RailRole,
}

/// One discovered rail.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PowerRail {
    /// Label from `in{N}_label`, or `in{N}` when unlabelled.
    pub name: String,
    pub role: Option<RailRole>,
    pub power_mw: Option<f64>,
}

/// Finds and reads every rail under `base`.
///
/// Rails are ordered by path. If two devices expose the same name, later
/// ones are prefixed with their directory name, and a role index is only
/// assigned to its first occurrence.
pub(crate) fn read_rails(reader: &SysfsReader, base: &Path, roles: &[RailMapping]) -> Vec<PowerRail> {
    let mut found = Vec::new();
    collect_channels(base, 0, &mut found);
    found.sort();

    let mut rails: Vec<PowerRail> = Vec::with_capacity(found.len());
    let mut assigned: Vec<u32> = Vec::new();
    for (dir, index) in found {
        let mut name = reader
            .read_string(&dir.join(format!("in{index}_label")))
            .ok()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| format!("in{index}"));
        if rails.iter().any(|r| r.name == name) {
            let device = dir
                .file_name()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default();
            name = format!("{device}:{name}");
        }

        let role = if assigned.contains(&index) {
            None
        } else {
            roles.iter().find(|m| m.index == index).map(|m| m.role)
        };
        if role.is_some() {
            assigned.push(index);
        }

        let voltage_v = reader.read_scaled(&dir.join(format!("in{index}_input")), 1000.0);
        let current_a = reader.read_scaled(&dir.join(format!("curr{index}_input")), 1000.0);
        let power_mw = match (voltage_v, current_a) {
            (Some(v), Some(i)) => Some(v * i * 1000.0),
            _ => None,
        };
        tracing::trace!(rail = %name, index, ?voltage_v, ?current_a, ?power_mw, "read power rail");

        rails.push(PowerRail {
            name,
            role,
            power_mw,
        });
    }
    rails
}

/// Rail name → power (mW) for every discovered rail.
pub(crate) fn rail_map(rails: &[PowerRail]) -> BTreeMap<String, Option<f64>> {
    rails
        .iter()
        .map(|r| (r.name.clone(), r.power_mw))
        .collect()
}

/// Power of the rail carrying `role`, if that rail was found and readable.
pub(crate) fn power_for(rails: &[PowerRail], role: RailRole) -> Option<f64> {
    rails
        .iter()
        .find(|r| r.role == Some(role))
        .and_then(|r| r.power_mw)
}

fn collect_channels(dir: &Path, depth: usize, out: &mut Vec<(PathBuf, u32)>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if depth == 0 {
                tracing::debug!("power rail base {} unavailable: {e}", dir.display());
            }
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let path = entry.path();
        if let Some(index) = channel_index(&name) {
            out.push((dir.to_path_buf(), index));
        } else if depth < MAX_SEARCH_DEPTH
            && !SKIPPED_ENTRIES.contains(&&*name)
            && path.is_dir()
        {
            collect_channels(&path, depth + 1, out);
        }
    }
}

/// `"in3_input"` → `Some(3)`.
fn channel_index(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix("in")?.strip_suffix("_input")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::test_support::{scratch_dir, write_file};

    fn orin_roles() -> Vec<RailMapping> {
        vec![
            RailMapping { index: 1, role: RailRole::Total },
            RailMapping { index: 2, role: RailRole::Compute },
            RailMapping { index: 3, role: RailRole::Soc },
        ]
    }

    #[test]
    fn test_channel_index() {
        assert_eq!(channel_index("in1_input"), Some(1));
        assert_eq!(channel_index("in12_input"), Some(12));
        assert_eq!(channel_index("in_power0_input"), None);
        assert_eq!(channel_index("curr1_input"), None);
        assert_eq!(channel_index("in1_label"), None);
    }

    #[test]
    fn test_discovers_nested_rails_and_roles() {
        let base = scratch_dir("rails_nested");
        let dev = "1-0040/hwmon/hwmon3";
        write_file(&base, &format!("{dev}/in1_input"), "5000");
        write_file(&base, &format!("{dev}/curr1_input"), "1200");
        write_file(&base, &format!("{dev}/in1_label"), "VDD_IN");
        write_file(&base, &format!("{dev}/in2_input"), "5000");
        write_file(&base, &format!("{dev}/curr2_input"), "400");
        write_file(&base, &format!("{dev}/in4_input"), "3300");
        write_file(&base, &format!("{dev}/curr4_input"), "100");

        let rails = read_rails(&SysfsReader::default(), &base, &orin_roles());
        assert_eq!(rails.len(), 3);

        let total = rails.iter().find(|r| r.name == "VDD_IN").unwrap();
        assert_eq!(total.name, "VDD_IN");
        assert_eq!(total.role, Some(RailRole::Total));
        assert!((total.power_mw.unwrap() - 6000.0).abs() < 1e-9);

        assert!((power_for(&rails, RailRole::Compute).unwrap() - 2000.0).abs() < 1e-9);
        assert_eq!(power_for(&rails, RailRole::Soc), None);

        // Channel 4 has no role but is kept under its raw name.
        let map = rail_map(&rails);
        assert!((map["in4"].unwrap() - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_current_keeps_rail_without_power() {
        let base = scratch_dir("rails_partial");
        write_file(&base, "in3_input", "5000");
        let rails = read_rails(&SysfsReader::default(), &base, &orin_roles());
        assert_eq!(rails.len(), 1);
        assert_eq!(rails[0].name, "in3");
        assert_eq!(rails[0].power_mw, None);
        assert_eq!(power_for(&rails, RailRole::Soc), None);
    }

    #[test]
    fn test_missing_base_yields_no_rails() {
        let rails = read_rails(
            &SysfsReader::default(),
            Path::new("/nonexistent/ina3221x"),
            &orin_roles(),
        );
        assert!(rails.is_empty());
    }

    #[test]
    fn test_duplicate_names_are_disambiguated() {
        let base = scratch_dir("rails_dupe");
        write_file(&base, "dev_a/in1_input", "1000");
        write_file(&base, "dev_a/curr1_input", "1000");
        write_file(&base, "dev_b/in1_input", "2000");
        write_file(&base, "dev_b/curr1_input", "1000");

        let rails = read_rails(&SysfsReader::default(), &base, &orin_roles());
        let names: Vec<&str> = rails.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["in1", "dev_b:in1"]);
        assert_eq!(rails[0].role, Some(RailRole::Total));
        assert_eq!(rails[1].role, None);
    }
}
