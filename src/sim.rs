//! Simulation driver
//!
//! Runs the ADRC controller and the pendulum in lock-step for a fixed number
//! of iterations and hands one [`SimStep`] per iteration to a sink.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::SimConfig;
use crate::controller::AdrcController;
use crate::plant::Pendulum;
use crate::SimError;

/// Time-triggered step reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointSchedule {
    pub initial: f64,
    pub final_value: f64,
    pub switch_time: f64,
}

impl SetpointSchedule {
    pub fn new(initial: f64, final_value: f64, switch_time: f64) -> Self {
        Self {
            initial,
            final_value,
            switch_time,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.setpoint_initial,
            config.setpoint_final,
            config.setpoint_switch_time,
        )
    }

    /// Reference at time `t`. Level-triggered: every `t` past the switch time
    /// yields the final value.
    pub fn evaluate(&self, t: f64) -> f64 {
        if t > self.switch_time {
            self.final_value
        } else {
            self.initial
        }
    }
}

/// One logged simulation step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimStep {
    /// Time at the start of the step [s]
    pub t: f64,
    /// Control input (torque) applied over the step [N m]
    pub control: f64,
    /// Pendulum angle at the end of the step [rad]
    pub angle: f64,
    /// Reference used for the step [rad]
    pub setpoint: f64,
    /// Observer disturbance estimate z3
    pub disturbance: f64,
}

impl SimStep {
    pub fn tracking_error(&self) -> f64 {
        self.setpoint - self.angle
    }
}

/// Append-only destination for simulation steps
pub trait TrajectorySink {
    fn record(&mut self, step: &SimStep) -> Result<(), SimError>;
}

impl TrajectorySink for Vec<SimStep> {
    fn record(&mut self, step: &SimStep) -> Result<(), SimError> {
        self.push(*step);
        Ok(())
    }
}

impl<T: TrajectorySink + ?Sized> TrajectorySink for &mut T {
    fn record(&mut self, step: &SimStep) -> Result<(), SimError> {
        (**self).record(step)
    }
}

/// Records every step into both sinks, first `A` then `B`
impl<A: TrajectorySink, B: TrajectorySink> TrajectorySink for (A, B) {
    fn record(&mut self, step: &SimStep) -> Result<(), SimError> {
        self.0.record(step)?;
        self.1.record(step)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    NotStarted,
    Running,
    Completed,
}

/// Additive Gaussian noise on the measured angle
struct MeasurementNoise {
    rng: StdRng,
    dist: Normal<f64>,
}

impl MeasurementNoise {
    fn from_config(config: &SimConfig) -> Result<Option<Self>, SimError> {
        if config.measurement_noise_std == 0.0 {
            return Ok(None);
        }

        let dist = Normal::new(0.0, config.measurement_noise_std)
            .map_err(|e| SimError::InvalidConfig(format!("measurement noise: {e}")))?;
        Ok(Some(Self {
            rng: StdRng::seed_from_u64(config.seed),
            dist,
        }))
    }

    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Closed-loop simulation context
pub struct Simulation<S: TrajectorySink> {
    dt: f64,
    iterations: usize,
    schedule: SetpointSchedule,
    controller: AdrcController,
    plant: Pendulum,
    noise: Option<MeasurementNoise>,
    sink: S,
    /// Time of the next step
    t: f64,
    iteration: usize,
    setpoint: f64,
    phase: SimPhase,
}

impl<S: TrajectorySink> Simulation<S> {
    /// Validate `config` and build the controller and plant. Nothing is
    /// recorded until the first [`step`](Self::step).
    pub fn new(config: &SimConfig, sink: S) -> Result<Self, SimError> {
        config.validate()?;

        let controller = AdrcController::new(config.controller, config.time_step)?;
        let plant = Pendulum::new(config.pendulum, config.time_step)?;
        let schedule = SetpointSchedule::from_config(config);

        Ok(Self {
            dt: config.time_step,
            iterations: config.iterations,
            setpoint: schedule.initial,
            schedule,
            controller,
            plant,
            noise: MeasurementNoise::from_config(config)?,
            sink,
            t: 0.0,
            iteration: 0,
            phase: SimPhase::NotStarted,
        })
    }

    /// Advance one step. Returns `None` once all iterations have run.
    pub fn step(&mut self) -> Result<Option<SimStep>, SimError> {
        match self.phase {
            SimPhase::Completed => return Ok(None),
            SimPhase::NotStarted => {
                info!(
                    iterations = self.iterations,
                    dt = self.dt,
                    setpoint = self.schedule.initial,
                    "simulation started"
                );
                self.phase = SimPhase::Running;
            }
            SimPhase::Running => {}
        }

        let setpoint = self.schedule.evaluate(self.t);
        if setpoint != self.setpoint {
            debug!(t = self.t, from = self.setpoint, to = setpoint, "setpoint switched");
        }
        self.setpoint = setpoint;

        let mut measured = self.plant.angle();
        if let Some(noise) = self.noise.as_mut() {
            measured += noise.sample();
        }

        // Fresh every step; only the controller keeps the previous input
        let control = self.controller.step(measured, setpoint);
        let angle = self.plant.step(control);

        let step = SimStep {
            t: self.t,
            control,
            angle,
            setpoint,
            disturbance: self.controller.disturbance(),
        };
        trace!(?step, "step");
        self.sink.record(&step)?;

        self.iteration += 1;
        self.t = self.iteration as f64 * self.dt;

        if self.iteration >= self.iterations {
            self.phase = SimPhase::Completed;
            info!(
                iterations = self.iteration,
                angle = angle,
                setpoint = setpoint,
                "simulation completed"
            );
        }

        Ok(Some(step))
    }

    /// Run all remaining iterations and hand back the sink
    pub fn run(mut self) -> Result<S, SimError> {
        while self.step()?.is_some() {}
        Ok(self.sink)
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Time of the next step
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Number of completed steps
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Setpoint used by the latest step
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn controller(&self) -> &AdrcController {
        &self.controller
    }

    pub fn plant(&self) -> &Pendulum {
        &self.plant
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Run a full simulation and collect every step in memory
pub fn run_simulation(config: &SimConfig) -> Result<Vec<SimStep>, SimError> {
    Simulation::new(config, Vec::new())?.run()
}

/// Calculate RMS error
pub fn rms_error(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = errors.iter().map(|&e| e * e).sum();
    (sum_sq / errors.len() as f64).sqrt()
}

/// Largest absolute control input
pub fn peak_control(results: &[SimStep]) -> f64 {
    results
        .iter()
        .map(|s| s.control.abs())
        .fold(0.0f64, f64::max)
}

/// Index of the first step whose setpoint differs from the first step's
pub fn setpoint_switch_index(results: &[SimStep]) -> Option<usize> {
    let first = results.first()?.setpoint;
    results.iter().position(|s| s.setpoint != first)
}

/// Time from the setpoint switch until the tracking error stays within
/// `band` times the step size for the rest of the run.
///
/// Returns `None` if there is no switch or the error is still outside the
/// band at the last step.
pub fn settling_time(results: &[SimStep], band: f64) -> Option<f64> {
    let switch = setpoint_switch_index(results)?;
    let step_size = (results[switch].setpoint - results[0].setpoint).abs();
    let tolerance = band * step_size;

    let after = &results[switch..];
    match after
        .iter()
        .rposition(|s| s.tracking_error().abs() > tolerance)
    {
        None => Some(0.0),
        Some(last) if last + 1 == after.len() => None,
        Some(last) => Some(after[last + 1].t - after[0].t),
    }
}
