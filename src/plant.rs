//! Damped nonlinear pendulum
//!
//! `m l^2 theta'' = tau - k theta' - m g l sin(theta)`
//!
//! Integrated with semi-implicit Euler: the velocity is advanced first and the
//! updated velocity advances the angle. The angle is never wrapped.

use crate::params::{validate_time_step, PendulumParams};
use crate::state::PendulumState;
use crate::SimError;

#[derive(Debug, Clone)]
pub struct Pendulum {
    params: PendulumParams,
    dt: f64,
    state: PendulumState,
}

impl Pendulum {
    /// Create a pendulum at rest
    pub fn new(params: PendulumParams, dt: f64) -> Result<Self, SimError> {
        Self::with_state(params, dt, PendulumState::rest())
    }

    /// Create a pendulum from an explicit initial state
    pub fn with_state(
        params: PendulumParams,
        dt: f64,
        initial: PendulumState,
    ) -> Result<Self, SimError> {
        params.validate()?;
        validate_time_step(dt)?;

        Ok(Self {
            params,
            dt,
            state: initial,
        })
    }

    /// Angular acceleration for the given torque at the current state
    pub fn angular_acceleration(&self, torque: f64) -> f64 {
        let p = &self.params;
        let s = &self.state;
        (torque - p.damping * s.omega - p.mass * p.gravity * p.length * s.theta.sin())
            / p.inertia()
    }

    /// Apply `torque` for one time step and return the new angle
    pub fn step(&mut self, torque: f64) -> f64 {
        let alpha = self.angular_acceleration(torque);

        self.state.omega += alpha * self.dt;
        self.state.theta += self.state.omega * self.dt;

        self.state.theta
    }

    pub fn state(&self) -> PendulumState {
        self.state
    }

    /// Current angle [rad]
    pub fn angle(&self) -> f64 {
        self.state.theta
    }

    pub fn params(&self) -> &PendulumParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_params_fail_construction() {
        let zero_mass = PendulumParams {
            mass: 0.0,
            ..Default::default()
        };
        let zero_length = PendulumParams {
            length: 0.0,
            ..Default::default()
        };
        assert!(Pendulum::new(zero_mass, 0.01).is_err());
        assert!(Pendulum::new(zero_length, 0.01).is_err());
        assert!(Pendulum::new(PendulumParams::default(), -0.01).is_err());
    }

    #[test]
    fn test_rest_is_equilibrium() {
        let mut pendulum = Pendulum::new(PendulumParams::default(), 0.01).unwrap();
        for _ in 0..1000 {
            assert_eq!(pendulum.step(0.0), 0.0);
        }
        assert_eq!(pendulum.state(), PendulumState::rest());
    }

    #[test]
    fn test_semi_implicit_step() {
        let params = PendulumParams::default();
        let dt = 0.01;
        let mut pendulum =
            Pendulum::with_state(params, dt, PendulumState::new(0.1, 0.0)).unwrap();

        let m = params.mass;
        let l = params.length;
        let alpha = (0.0 - 0.0 - m * params.gravity * l * 0.1_f64.sin()) / (m * l * l);
        let omega1 = 0.0 + alpha * dt;
        let theta1 = 0.1 + omega1 * dt;

        let theta = pendulum.step(0.0);
        assert_eq!(pendulum.state().omega, omega1);
        assert_eq!(theta, theta1);
        // Explicit Euler would have left the angle untouched
        assert!(theta < 0.1);
    }

    #[test]
    fn test_damping_opposes_velocity() {
        let params = PendulumParams::new(1.0, 1.0, 0.5, 0.0);
        let pendulum = Pendulum::with_state(params, 0.01, PendulumState::new(0.0, 2.0)).unwrap();
        assert!((pendulum.angular_acceleration(0.0) + 1.0).abs() < 1e-12);
        assert!((pendulum.angular_acceleration(1.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_is_not_wrapped() {
        // Frictionless, gravity-free pendulum spun by a constant torque
        let params = PendulumParams::new(1.0, 1.0, 0.0, 0.0);
        let mut pendulum = Pendulum::new(params, 0.01).unwrap();
        let mut theta = 0.0;
        for _ in 0..1000 {
            theta = pendulum.step(1.0);
        }
        assert!(theta > 2.0 * std::f64::consts::PI);
    }
}
