use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, Terminator, Writer, WriterBuilder};
use serde::Serialize;

use crate::config::SimConfig;
use crate::sim::{SimStep, TrajectorySink};
use crate::SimError;

/// Tolerance band for settling time, as a fraction of the setpoint step
pub const SETTLING_BAND: f64 = 0.02;

fn fmt_f64(v: f64) -> String {
    format!("{v:.6}")
}

fn log_writer_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(b' ')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'));
    builder
}

/// Plain-text trajectory log.
///
/// One line per step, no header:
/// `time control_input angle setpoint disturbance_estimate`
pub struct LogWriter<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl LogWriter<File> {
    /// Create (or truncate) the log file at `path`
    pub fn create(path: &Path) -> Result<Self, SimError> {
        let writer = log_writer_builder()
            .from_path(path)
            .map_err(|source| SimError::SinkOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { writer, rows: 0 })
    }
}

impl<W: Write> LogWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: log_writer_builder().from_writer(inner),
            rows: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush buffered rows and return the underlying writer
    pub fn finish(mut self) -> Result<W, SimError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| SimError::Io(e.into_error()))
    }
}

impl<W: Write> TrajectorySink for LogWriter<W> {
    fn record(&mut self, step: &SimStep) -> Result<(), SimError> {
        self.writer.write_record([
            fmt_f64(step.t),
            fmt_f64(step.control),
            fmt_f64(step.angle),
            fmt_f64(step.setpoint),
            fmt_f64(step.disturbance),
        ])?;
        self.rows += 1;
        Ok(())
    }
}

/// Parse a trajectory log back into steps
pub fn read_log<R: Read>(reader: R) -> Result<Vec<SimStep>, SimError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_reader(reader);

    let mut steps = Vec::new();
    for row in rdr.deserialize() {
        let step: SimStep = row?;
        steps.push(step);
    }
    Ok(steps)
}

/// Headline metrics of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub iterations: usize,
    pub final_time: f64,
    pub final_angle: f64,
    pub final_setpoint: f64,
    pub final_disturbance: f64,
    pub rms_tracking_error: f64,
    pub peak_control: f64,
    /// Seconds after the setpoint switch, `None` if it never settled
    pub settling_time: Option<f64>,
}

impl RunSummary {
    pub fn from_results(config: &SimConfig, results: &[SimStep]) -> Self {
        let mut acc = SummaryAccumulator::new(config);
        for step in results {
            acc.observe(step);
        }
        acc.summary()
    }
}

/// Builds a [`RunSummary`] one step at a time, without keeping the trajectory
#[derive(Debug, Clone)]
pub struct SummaryAccumulator {
    time_step: f64,
    setpoint_initial: f64,
    count: usize,
    sum_sq_error: f64,
    peak_control: f64,
    first_setpoint: Option<f64>,
    last: Option<SimStep>,
    /// Time of the first step after the switch and the size of the setpoint step
    switch: Option<(f64, f64)>,
    /// Start of the current run of in-band steps after the switch
    settled_since: Option<f64>,
}

impl SummaryAccumulator {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            time_step: config.time_step,
            setpoint_initial: config.setpoint_initial,
            count: 0,
            sum_sq_error: 0.0,
            peak_control: 0.0,
            first_setpoint: None,
            last: None,
            switch: None,
            settled_since: None,
        }
    }

    pub fn observe(&mut self, step: &SimStep) {
        let first = *self.first_setpoint.get_or_insert(step.setpoint);

        let error = step.tracking_error();
        self.count += 1;
        self.sum_sq_error += error * error;
        self.peak_control = self.peak_control.max(step.control.abs());

        if self.switch.is_none() && step.setpoint != first {
            self.switch = Some((step.t, (step.setpoint - first).abs()));
        }

        if let Some((_, step_size)) = self.switch {
            if error.abs() > SETTLING_BAND * step_size {
                self.settled_since = None;
            } else if self.settled_since.is_none() {
                self.settled_since = Some(step.t);
            }
        }

        self.last = Some(*step);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn summary(&self) -> RunSummary {
        let last = self.last.as_ref();
        let rms_tracking_error = if self.count == 0 {
            0.0
        } else {
            (self.sum_sq_error / self.count as f64).sqrt()
        };

        RunSummary {
            iterations: self.count,
            final_time: last.map(|s| s.t + self.time_step).unwrap_or(0.0),
            final_angle: last.map(|s| s.angle).unwrap_or(0.0),
            final_setpoint: last.map(|s| s.setpoint).unwrap_or(self.setpoint_initial),
            final_disturbance: last.map(|s| s.disturbance).unwrap_or(0.0),
            rms_tracking_error,
            peak_control: self.peak_control,
            settling_time: match (self.switch, self.settled_since) {
                (Some((switch_t, _)), Some(since)) => Some(since - switch_t),
                _ => None,
            },
        }
    }
}

impl TrajectorySink for SummaryAccumulator {
    fn record(&mut self, step: &SimStep) -> Result<(), SimError> {
        self.observe(step);
        Ok(())
    }
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), SimError> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    Ok(())
}
