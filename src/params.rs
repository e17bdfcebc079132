//! Controller and plant parameters
//!
//! Reference values are the tuning used for the pendulum demonstration:
//! observer bandwidth 60 rad/s (l1 = 3w, l2 = 3w^2, l3 = w^3) and controller
//! bandwidth 6 rad/s (k_p = wc^2, k_d = 2wc).

use serde::{Deserialize, Serialize};

use crate::SimError;

pub(crate) fn validate_time_step(dt: f64) -> Result<(), SimError> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(SimError::InvalidConfig(format!(
            "time_step must be finite and > 0, got {dt}"
        )));
    }
    Ok(())
}

/// Gains of the ADRC observer and control law
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParams {
    /// Observer gain on the output estimate
    pub l1: f64,
    /// Observer gain on the rate estimate
    pub l2: f64,
    /// Observer gain on the disturbance estimate
    pub l3: f64,
    /// Proportional gain
    pub k_p: f64,
    /// Derivative gain
    pub k_d: f64,
    /// Input gain of the plant model (must be non-zero)
    pub b0: f64,
}

impl ControllerParams {
    /// Create new controller parameters
    pub fn new(l1: f64, l2: f64, l3: f64, k_p: f64, k_d: f64, b0: f64) -> Self {
        Self {
            l1,
            l2,
            l3,
            k_p,
            k_d,
            b0,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let values = [
            ("l1", self.l1),
            ("l2", self.l2),
            ("l3", self.l3),
            ("k_p", self.k_p),
            ("k_d", self.k_d),
            ("b0", self.b0),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::InvalidConfig(format!("{name} must be finite")));
        }

        if self.b0 == 0.0 {
            return Err(SimError::InvalidConfig(
                "b0 must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self::new(180.0, 10_800.0, 216_000.0, 36.0, 12.0, 2.0)
    }
}

/// Physical constants of the damped pendulum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumParams {
    /// Bob mass [kg]
    pub mass: f64,
    /// Rod length [m]
    pub length: f64,
    /// Viscous damping [N m s]
    pub damping: f64,
    /// Gravitational acceleration [m/s^2]
    pub gravity: f64,
}

impl PendulumParams {
    pub fn new(mass: f64, length: f64, damping: f64, gravity: f64) -> Self {
        Self {
            mass,
            length,
            damping,
            gravity,
        }
    }

    /// Moment of inertia about the pivot, m * l^2
    pub fn inertia(&self) -> f64 {
        self.mass * self.length * self.length
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let values = [
            ("mass", self.mass),
            ("length", self.length),
            ("damping", self.damping),
            ("gravity", self.gravity),
        ];
        if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::InvalidConfig(format!("{name} must be finite")));
        }

        if self.mass <= 0.0 {
            return Err(SimError::InvalidConfig(
                "mass must be greater than zero".to_string(),
            ));
        }

        if self.length <= 0.0 {
            return Err(SimError::InvalidConfig(
                "length must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self::new(0.5, 1.0, 0.5, 9.81)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_params_are_valid() {
        assert!(ControllerParams::default().validate().is_ok());
        assert!(PendulumParams::default().validate().is_ok());
    }

    #[test]
    fn test_zero_b0_rejected() {
        let params = ControllerParams {
            b0: 0.0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("b0"));
    }

    #[test]
    fn test_negative_b0_accepted() {
        let params = ControllerParams {
            b0: -2.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_non_positive_mass_and_length_rejected() {
        let zero_mass = PendulumParams {
            mass: 0.0,
            ..Default::default()
        };
        let negative_length = PendulumParams {
            length: -1.0,
            ..Default::default()
        };
        assert!(zero_mass.validate().unwrap_err().to_string().contains("mass"));
        assert!(negative_length
            .validate()
            .unwrap_err()
            .to_string()
            .contains("length"));
    }

    #[test]
    fn test_nan_gain_rejected() {
        let params = ControllerParams {
            l2: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().unwrap_err().to_string().contains("l2"));
    }

    #[test]
    fn test_inertia() {
        let params = PendulumParams::new(0.5, 2.0, 0.0, 9.81);
        assert!((params.inertia() - 2.0).abs() < 1e-12);
    }
}
