//! State representations
//!
//! The observer state consists of three components:
//! - z1: estimated output (angle)
//! - z2: estimated rate (angular velocity)
//! - z3: estimated total disturbance
//!
//! The pendulum state is the true angle and angular velocity.

/// State of the extended state observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverState {
    /// Estimated output
    pub z1: f64,
    /// Estimated rate
    pub z2: f64,
    /// Estimated total disturbance
    pub z3: f64,
}

impl ObserverState {
    pub fn new(z1: f64, z2: f64, z3: f64) -> Self {
        Self { z1, z2, z3 }
    }

    pub fn zero() -> Self {
        Self {
            z1: 0.0,
            z2: 0.0,
            z3: 0.0,
        }
    }
}

impl Default for ObserverState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Physical state of the pendulum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumState {
    /// Angle [rad], unbounded
    pub theta: f64,
    /// Angular velocity [rad/s]
    pub omega: f64,
}

impl PendulumState {
    pub fn new(theta: f64, omega: f64) -> Self {
        Self { theta, omega }
    }

    /// Hanging straight down, not moving
    pub fn rest() -> Self {
        Self {
            theta: 0.0,
            omega: 0.0,
        }
    }
}

impl Default for PendulumState {
    fn default() -> Self {
        Self::rest()
    }
}
