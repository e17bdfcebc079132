//! Extended state observer
//!
//! Third-order linear ESO for a second-order plant with input gain b0. The
//! observer is driven by the measured output and the control input that was
//! applied over the previous interval (zero-order hold), and is advanced with
//! explicit Euler integration.

use crate::params::ControllerParams;
use crate::state::ObserverState;

/// Linear extended state observer
#[derive(Debug, Clone)]
pub struct ExtendedStateObserver {
    l1: f64,
    l2: f64,
    l3: f64,
    b0: f64,
    dt: f64,
    /// Current state estimate
    state: ObserverState,
}

impl ExtendedStateObserver {
    /// Create an observer with a zero initial estimate
    pub fn new(params: &ControllerParams, dt: f64) -> Self {
        Self {
            l1: params.l1,
            l2: params.l2,
            l3: params.l3,
            b0: params.b0,
            dt,
            state: ObserverState::zero(),
        }
    }

    /// Observer derivatives at the current estimate
    ///
    /// # Arguments
    /// * `y` - Measured plant output
    /// * `u_prev` - Control input applied during the previous interval
    pub fn derivatives(&self, y: f64, u_prev: f64) -> ObserverState {
        let z = self.state;
        ObserverState::new(
            -self.l1 * z.z1 + z.z2 + self.l1 * y,
            -self.l2 * z.z1 + z.z3 + self.l2 * y + self.b0 * u_prev,
            -self.l3 * z.z1 + self.l3 * y,
        )
    }

    /// Advance the estimate by one time step and return it
    pub fn update(&mut self, y: f64, u_prev: f64) -> ObserverState {
        // All three derivatives are taken from the pre-update estimate
        let dz = self.derivatives(y, u_prev);

        self.state.z1 += dz.z1 * self.dt;
        self.state.z2 += dz.z2 * self.dt;
        self.state.z3 += dz.z3 * self.dt;

        self.state
    }

    /// Get the current state estimate
    pub fn state(&self) -> ObserverState {
        self.state
    }

    /// Estimated total disturbance
    pub fn disturbance(&self) -> f64 {
        self.state.z3
    }
}
