use std::f64::consts::{FRAC_PI_2, PI};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::params::{validate_time_step, ControllerParams, PendulumParams};
use crate::SimError;

/// Runtime configuration for the ADRC pendulum simulation.
///
/// `Default` is the reference run: 1000 steps of 10 ms, setpoint pi/2
/// switching to pi after 5 s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed integration step [s]
    pub time_step: f64,
    /// Number of simulation steps
    pub iterations: usize,
    /// Reference before the switch [rad]
    pub setpoint_initial: f64,
    /// Reference after the switch [rad]
    pub setpoint_final: f64,
    /// Time the reference must exceed before switching [s]
    pub setpoint_switch_time: f64,
    /// Standard deviation of additive noise on the measured angle [rad]
    pub measurement_noise_std: f64,
    /// RNG seed for measurement noise
    pub seed: u64,
    pub controller: ControllerParams,
    pub pendulum: PendulumParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            iterations: 1000,
            setpoint_initial: FRAC_PI_2,
            setpoint_final: PI,
            setpoint_switch_time: 5.0,
            measurement_noise_std: 0.0,
            seed: 42,
            controller: ControllerParams::default(),
            pendulum: PendulumParams::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        validate_time_step(self.time_step)?;

        if self.iterations == 0 {
            return Err(SimError::InvalidConfig(
                "iterations must be greater than zero".to_string(),
            ));
        }

        if !self.setpoint_initial.is_finite()
            || !self.setpoint_final.is_finite()
            || !self.setpoint_switch_time.is_finite()
        {
            return Err(SimError::InvalidConfig(
                "setpoint schedule values must be finite".to_string(),
            ));
        }

        if !self.measurement_noise_std.is_finite() || self.measurement_noise_std < 0.0 {
            return Err(SimError::InvalidConfig(
                "measurement_noise_std must be finite and >= 0".to_string(),
            ));
        }

        self.controller.validate()?;
        self.pendulum.validate()?;
        Ok(())
    }

    /// Simulated duration covered by the log [s]
    pub fn duration(&self) -> f64 {
        self.iterations as f64 * self.time_step
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, SimError> {
        let config: SimConfig = toml::from_str(raw)?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, SimError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
