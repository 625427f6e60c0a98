// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! System memory usage via `/proc/meminfo`.
//!
//! "Used" memory is `MemTotal - MemAvailable`: the kernel's estimate of
//! what a new allocation could not obtain without swapping. On Jetson
//! modules this includes memory carved out for the integrated GPU.

use crate::{MonitorError, SysfsReader};
use std::path::Path;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Memory usage derived from one `/proc/meminfo` read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MemoryUsage {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryUsage {
    pub fn read(reader: &SysfsReader, path: &Path) -> Result<Self, MonitorError> {
        let content = reader.read_string(path)?;
        Self::parse(&content, path)
    }

    /// Parses `/proc/meminfo`-formatted text.
    pub fn parse(content: &str, source_path: &Path) -> Result<Self, MonitorError> {
        let mut total_kb = None;
        let mut available_kb = None;

        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let slot = match parts.next() {
                Some("MemTotal:") => &mut total_kb,
                Some("MemAvailable:") => &mut available_kb,
                _ => continue,
            };
            let value = parts.next().unwrap_or_default();
            *slot = Some(value.parse::<u64>().map_err(|_| MonitorError::ParseError {
                path: source_path.display().to_string(),
                detail: format!("expected integer kB value, got '{value}'"),
            })?);

            if total_kb.is_some() && available_kb.is_some() {
                break;
            }
        }

        let missing = |key: &str| MonitorError::ParseError {
            path: source_path.display().to_string(),
            detail: format!("{key} not found"),
        };
        let total_kb: u64 = total_kb.ok_or_else(|| missing("MemTotal"))?;
        let available_kb: u64 = available_kb.ok_or_else(|| missing("MemAvailable"))?;

        Ok(Self {
            total_bytes: total_kb * 1024,
            available_bytes: available_kb.min(total_kb) * 1024,
        })
    }

    pub fn used_mb(&self) -> f64 {
        (self.total_bytes - self.available_bytes) as f64 / BYTES_PER_MB
    }

    /// Used memory as a percentage of total, `None` when total is zero.
    pub fn percent(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.total_bytes - self.available_bytes) as f64 / self.total_bytes as f64 * 100.0)
    }
}
