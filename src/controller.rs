//! ADRC controller
//!
//! Combines the extended state observer with a PD control law on the
//! estimated state that cancels the estimated total disturbance:
//!
//! `u = (k_p * (r - z1) - k_d * z2 - z3) / b0`

use crate::observer::ExtendedStateObserver;
use crate::params::{validate_time_step, ControllerParams};
use crate::state::ObserverState;
use crate::SimError;

/// ADRC controller
#[derive(Debug, Clone)]
pub struct AdrcController {
    params: ControllerParams,
    observer: ExtendedStateObserver,
    /// Control input computed at the previous step
    u_prev: f64,
}

impl AdrcController {
    /// Create a new controller. Fails if `b0` is zero or `dt` is not positive.
    pub fn new(params: ControllerParams, dt: f64) -> Result<Self, SimError> {
        params.validate()?;
        validate_time_step(dt)?;

        Ok(Self {
            observer: ExtendedStateObserver::new(&params, dt),
            params,
            u_prev: 0.0,
        })
    }

    /// Perform one control step
    ///
    /// # Arguments
    /// * `y` - Measured plant output
    /// * `r` - Reference
    ///
    /// # Returns
    /// The control input to apply over the next interval
    pub fn step(&mut self, y: f64, r: f64) -> f64 {
        // The observer sees the input that produced this measurement
        let z = self.observer.update(y, self.u_prev);

        let p = &self.params;
        let u = (p.k_p * (r - z.z1) - p.k_d * z.z2 - z.z3) / p.b0;

        self.u_prev = u;
        u
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    /// Current observer estimate
    pub fn estimate(&self) -> ObserverState {
        self.observer.state()
    }

    /// Estimated total disturbance (z3)
    pub fn disturbance(&self) -> f64 {
        self.observer.disturbance()
    }

    /// Last control input returned by [`step`](Self::step)
    pub fn last_control(&self) -> f64 {
        self.u_prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_b0_fails_construction() {
        let params = ControllerParams {
            b0: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            AdrcController::new(params, 0.01),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bad_time_step_fails_construction() {
        assert!(AdrcController::new(ControllerParams::default(), 0.0).is_err());
        assert!(AdrcController::new(ControllerParams::default(), f64::NAN).is_err());
    }

    #[test]
    fn test_first_step_from_rest() {
        let mut ctrl = AdrcController::new(ControllerParams::default(), 0.01).unwrap();
        let r = std::f64::consts::FRAC_PI_2;

        // y = 0 and z = 0, so the estimate is unchanged and u = k_p * r / b0
        let u = ctrl.step(0.0, r);
        assert!((u - 36.0 * r / 2.0).abs() < 1e-12);
        assert_eq!(ctrl.estimate(), ObserverState::zero());
        assert_eq!(ctrl.last_control(), u);
    }

    #[test]
    fn test_observer_uses_previous_control() {
        let params = ControllerParams::new(1.0, 1.0, 1.0, 1.0, 0.0, 2.0);
        let dt = 0.5;
        let mut ctrl = AdrcController::new(params, dt).unwrap();

        // Step 1: estimate stays zero, u1 = k_p * r / b0 = 1.5
        let u1 = ctrl.step(0.0, 3.0);
        assert!((u1 - 1.5).abs() < 1e-12);

        // Step 2: z2 picks up b0 * u1 * dt, not b0 * u2 * dt
        ctrl.step(0.0, 3.0);
        let z = ctrl.estimate();
        assert!(z.z1.abs() < 1e-12);
        assert!((z.z2 - 2.0 * u1 * dt).abs() < 1e-12);
        assert!(z.z3.abs() < 1e-12);
    }

    #[test]
    fn test_control_law_uses_updated_estimate() {
        let params = ControllerParams::new(10.0, 0.0, 0.0, 4.0, 0.0, 1.0);
        let mut ctrl = AdrcController::new(params, 0.1).unwrap();

        // z1 becomes l1 * y * dt = 1.0 before the control law runs
        let u = ctrl.step(1.0, 0.0);
        assert!((ctrl.estimate().z1 - 1.0).abs() < 1e-12);
        assert!((u + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_disturbance_cancelled_in_control() {
        let params = ControllerParams::new(0.0, 0.0, 10.0, 0.0, 0.0, 2.0);
        let mut ctrl = AdrcController::new(params, 0.1).unwrap();

        // Only z3 moves: z3 = l3 * y * dt = 1.0, u = -z3 / b0
        let u = ctrl.step(1.0, 0.0);
        assert!((ctrl.disturbance() - 1.0).abs() < 1e-12);
        assert!((u + 0.5).abs() < 1e-12);
    }
}
