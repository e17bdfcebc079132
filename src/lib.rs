//! ADRC Pendulum
//!
//! Closed-loop simulation of an Active Disturbance Rejection Control (ADRC)
//! controller regulating a damped nonlinear pendulum. The controller's
//! extended state observer tracks the angle (z1), its rate (z2) and the lumped
//! total disturbance (z3); the control law cancels the estimated disturbance
//! and applies PD action on the estimate. Both the observer and the plant are
//! advanced with fixed-step Euler integration inside a deterministic loop.

pub mod config;
pub mod controller;
pub mod observer;
pub mod output;
pub mod params;
pub mod plant;
pub mod plot;
pub mod sim;
pub mod state;

use std::path::PathBuf;

use thiserror::Error;

// Re-export main types
pub use config::SimConfig;
pub use controller::AdrcController;
pub use observer::ExtendedStateObserver;
pub use output::{LogWriter, RunSummary, SummaryAccumulator};
pub use params::{ControllerParams, PendulumParams};
pub use plant::Pendulum;
pub use sim::{run_simulation, SetpointSchedule, SimPhase, SimStep, Simulation, TrajectorySink};
pub use state::{ObserverState, PendulumState};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to open log sink {}: {source}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("plot error: {0}")]
    Plot(String),
}

impl SimError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimError::InvalidConfig(_) | SimError::Toml(_) => 2,
            SimError::SinkOpen { .. } => 3,
            SimError::Io(_) | SimError::Csv(_) | SimError::Json(_) | SimError::Plot(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let config = SimError::InvalidConfig("b0 must be non-zero".to_string());
        let sink = SimError::SinkOpen {
            path: PathBuf::from("/nonexistent/data.txt"),
            source: csv::Error::from(std::io::Error::from(std::io::ErrorKind::NotFound)),
        };
        let io = SimError::Io(std::io::Error::from(std::io::ErrorKind::Other));

        assert_eq!(config.exit_code(), 2);
        assert_eq!(sink.exit_code(), 3);
        assert_eq!(io.exit_code(), 1);
        assert!(sink.to_string().contains("/nonexistent/data.txt"));
    }
}
