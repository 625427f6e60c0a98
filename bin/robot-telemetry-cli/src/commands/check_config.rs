// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `robot-telemetry check-config` command.

use super::load_config;
use std::path::Path;

pub fn execute(config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    config.validate()?;

    println!("{}", config.to_toml()?);

    let degenerate = config.bounds.degenerate_maxima();
    if degenerate.is_empty() {
        eprintln!("configuration OK");
    } else {
        eprintln!(
            "configuration OK; non-positive maxima map to ratio 0.0: {}",
            degenerate.join(", ")
        );
    }
    Ok(())
}
