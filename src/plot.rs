//! Trajectory plots
//!
//! Three stacked panels over time: angle and setpoint in degrees, control
//! torque, and the disturbance estimate f(t).

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::output::read_log;
use crate::sim::SimStep;
use crate::SimError;

fn plot_err<E: std::fmt::Display>(e: E) -> SimError {
    SimError::Plot(e.to_string())
}

/// Finite `(min, max)` of the values with a small margin, never empty
fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (-1.0, 1.0);
    }

    let pad = ((hi - lo) * 0.05).max(1e-3);
    (lo - pad, hi + pad)
}

struct Series<'a> {
    label: &'a str,
    color: RGBColor,
    points: Vec<(f64, f64)>,
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    y_desc: &str,
    t_max: f64,
    series: &[Series<'_>],
) -> Result<(), SimError> {
    let (y_min, y_max) = value_range(series.iter().flat_map(|s| s.points.iter().map(|(_, y)| y)));

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..t_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Time [s]")
        .y_desc(y_desc)
        .draw()
        .map_err(plot_err)?;

    for s in series {
        let color = s.color;
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), &color))
            .map_err(plot_err)?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], color.stroke_width(3)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .border_style(BLACK)
        .background_style(WHITE.mix(0.7))
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

/// Render the response, command and disturbance panels to a PNG at `path`
pub fn plot_trajectory(steps: &[SimStep], path: &Path) -> Result<(), SimError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(path, (1280, 1080)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((3, 1));

    let t_max = steps.last().map(|s| s.t).unwrap_or(0.0).max(1e-3);

    draw_panel(
        &panels[0],
        "theta [deg]",
        t_max,
        &[
            Series {
                label: "Response",
                color: BLUE,
                points: steps.iter().map(|s| (s.t, s.angle.to_degrees())).collect(),
            },
            Series {
                label: "Setpoint",
                color: RED,
                points: steps.iter().map(|s| (s.t, s.setpoint.to_degrees())).collect(),
            },
        ],
    )?;
    draw_panel(
        &panels[1],
        "tau [N m]",
        t_max,
        &[Series {
            label: "Command",
            color: BLUE,
            points: steps.iter().map(|s| (s.t, s.control)).collect(),
        }],
    )?;
    draw_panel(
        &panels[2],
        "f(t)",
        t_max,
        &[Series {
            label: "Disturbance estimate",
            color: BLUE,
            points: steps.iter().map(|s| (s.t, s.disturbance)).collect(),
        }],
    )?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Read a trajectory log from `log_path` and plot it to `png_path`
pub fn plot_log_file(log_path: &Path, png_path: &Path) -> Result<usize, SimError> {
    let steps = read_log(BufReader::new(File::open(log_path)?))?;
    plot_trajectory(&steps, png_path)?;
    Ok(steps.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::output::LogWriter;
    use crate::sim::{run_simulation, Simulation};

    #[test]
    fn test_value_range() {
        let values = [1.0, f64::NAN, -3.0, 5.0];
        let (lo, hi) = value_range(values.iter());
        assert!(lo < -3.0 && hi > 5.0);

        let flat = [2.0, 2.0];
        let (lo, hi) = value_range(flat.iter());
        assert!(lo < 2.0 && hi > 2.0);

        assert_eq!(value_range([f64::NAN].iter()), (-1.0, 1.0));
    }

    #[test]
    fn test_plot_trajectory_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("response.png");
        let config = SimConfig {
            iterations: 200,
            ..Default::default()
        };
        let results = run_simulation(&config).unwrap();

        plot_trajectory(&results, &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_plot_from_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("data.txt");
        let png_path = dir.path().join("data.png");
        let config = SimConfig::default();

        Simulation::new(&config, LogWriter::create(&log_path).unwrap())
            .unwrap()
            .run()
            .unwrap()
            .finish()
            .unwrap();

        let rows = plot_log_file(&log_path, &png_path).unwrap();
        assert_eq!(rows, config.iterations);
        assert!(fs::metadata(&png_path).unwrap().len() > 0);
    }

    #[test]
    fn test_plot_missing_log_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = plot_log_file(&dir.path().join("absent.txt"), &dir.path().join("x.png"))
            .unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
