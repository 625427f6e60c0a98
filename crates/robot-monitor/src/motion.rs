// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Mechanical power, distance and energy integration for the drive base.
//!
//! Power is the steady-state rolling-resistance approximation
//!
//! ```text
//! P = c_rr * m * g * |v| / eta
//! ```
//!
//! which ignores acceleration, slope, aerodynamic drag and regenerative
//! braking. It is a load indicator, not a dynamics model.
//!
//! # Reverse motion
//! Negative speed is accepted. The odometer is signed, so `distance_m`
//! decreases while reversing. Power uses `|v|`, so `energy_j` never
//! decreases regardless of direction.

use crate::MonitorError;
use std::time::Instant;

/// Standard gravity in m/s².
pub const GRAVITY_MPS2: f64 = 9.81;

/// Mechanical parameters of the platform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotorConfig {
    pub mass_kg: f64,
    /// Rolling-resistance coefficient (dimensionless).
    pub rolling_coeff: f64,
    /// Drivetrain efficiency in `(0, 1]`.
    pub drivetrain_efficiency: f64,
    /// Speed at start-up in m/s.
    pub init_speed: f64,
}

impl MotorConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if !(self.mass_kg.is_finite() && self.mass_kg > 0.0) {
            return Err(MonitorError::invalid(
                "motor.mass_kg",
                format!("must be positive, got {}", self.mass_kg),
            ));
        }
        if !(self.rolling_coeff.is_finite() && self.rolling_coeff >= 0.0) {
            return Err(MonitorError::invalid(
                "motor.rolling_coeff",
                format!("must be non-negative, got {}", self.rolling_coeff),
            ));
        }
        if !(self.drivetrain_efficiency > 0.0 && self.drivetrain_efficiency <= 1.0) {
            return Err(MonitorError::invalid(
                "motor.drivetrain_efficiency",
                format!("must lie in (0, 1], got {}", self.drivetrain_efficiency),
            ));
        }
        if !self.init_speed.is_finite() {
            return Err(MonitorError::invalid("motor.init_speed", "must be finite"));
        }
        Ok(())
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            mass_kg: 18.0,
            rolling_coeff: 0.015,
            drivetrain_efficiency: 0.90,
            init_speed: 0.0,
        }
    }
}

/// Integrator state.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MotionState {
    pub speed_mps: f64,
    pub distance_m: f64,
    pub energy_j: f64,
}

/// Result of one motion sample.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MotionSnapshot {
    pub speed_mps: f64,
    pub mech_power_w: f64,
    pub distance_m: f64,
    pub energy_j: f64,
}

/// Integrates distance and mechanical energy from the current speed.
#[derive(Debug, Clone)]
pub struct MotionEstimator {
    /// Constant part of the power model: `c_rr * m * g / eta`.
    watts_per_mps: f64,
    state: MotionState,
    last_sample: Option<Instant>,
}

impl MotionEstimator {
    pub fn new(config: &MotorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        Ok(Self {
            watts_per_mps: config.rolling_coeff * config.mass_kg * GRAVITY_MPS2
                / config.drivetrain_efficiency,
            state: MotionState {
                speed_mps: config.init_speed,
                ..Default::default()
            },
            last_sample: None,
        })
    }

    /// Sets the commanded or measured speed in m/s.
    pub fn set_speed(&mut self, speed_mps: f64) -> Result<(), MonitorError> {
        if !speed_mps.is_finite() {
            return Err(MonitorError::invalid(
                "speed_mps",
                format!("must be finite, got {speed_mps}"),
            ));
        }
        self.state.speed_mps = speed_mps;
        Ok(())
    }

    /// Mechanical power at the current speed, in watts.
    pub fn mechanical_power_w(&self) -> f64 {
        self.watts_per_mps * self.state.speed_mps.abs()
    }

    /// Advances the integrators to `now`. The first call sets the baseline.
    pub fn sample(&mut self, now: Instant) -> MotionSnapshot {
        let dt_s = self
            .last_sample
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_sample = Some(now);

        let power = self.mechanical_power_w();
        self.state.distance_m += self.state.speed_mps * dt_s;
        self.state.energy_j += power * dt_s;

        MotionSnapshot {
            speed_mps: self.state.speed_mps,
            mech_power_w: power,
            distance_m: self.state.distance_m,
            energy_j: self.state.energy_j,
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }
}
