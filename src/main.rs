use std::path::PathBuf;

use adrc_pendulum::output::write_summary_json;
use adrc_pendulum::plot::plot_log_file;
use adrc_pendulum::{LogWriter, SimConfig, SimError, Simulation, SummaryAccumulator};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "ADRC control of a nonlinear pendulum")]
struct Cli {
    /// TOML configuration file (defaults to the reference configuration)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trajectory log path
    #[arg(long, default_value = "data.txt")]
    output: PathBuf,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Plot the written log (response, command, disturbance) to this PNG
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Number of simulation steps
    #[arg(long)]
    iterations: Option<usize>,

    /// Integration step in seconds
    #[arg(long)]
    time_step: Option<f64>,

    /// Time after which the setpoint switches, in seconds
    #[arg(long)]
    switch_time: Option<f64>,

    /// Standard deviation of measurement noise on the angle [rad]
    #[arg(long)]
    noise_std: Option<f64>,

    /// Seed for measurement noise
    #[arg(long)]
    seed: Option<u64>,

    /// Log at debug level when RUST_LOG is not set
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    if let Err(error) = try_main(cli) {
        eprintln!("adrc-pendulum failed: {error}");
        std::process::exit(error.exit_code());
    }
}

/// RUST_LOG wins when set and parseable; otherwise `--verbose` picks the level.
fn log_filter(env: Option<&str>, verbose: bool) -> EnvFilter {
    if let Some(directives) = env.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    EnvFilter::new(if verbose { "debug" } else { "info" })
}

fn setup_tracing(verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(env.as_deref(), verbose);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn try_main(cli: Cli) -> Result<(), SimError> {
    let mut cfg = match cli.config.as_deref() {
        Some(path) => SimConfig::from_toml_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(v) = cli.iterations {
        cfg.iterations = v;
    }
    if let Some(v) = cli.time_step {
        cfg.time_step = v;
    }
    if let Some(v) = cli.switch_time {
        cfg.setpoint_switch_time = v;
    }
    if let Some(v) = cli.noise_std {
        cfg.measurement_noise_std = v;
    }
    if let Some(v) = cli.seed {
        cfg.seed = v;
    }
    cfg.validate()?;

    // Open the sink before any step runs so a bad path aborts the whole run
    let log = LogWriter::create(&cli.output)?;
    let sink = (log, SummaryAccumulator::new(&cfg));
    let (log, acc) = Simulation::new(&cfg, sink)?.run()?;
    log.finish()?;

    let summary = acc.summary();
    info!(
        path = %cli.output.display(),
        rows = summary.iterations,
        rms_tracking_error = summary.rms_tracking_error,
        "log written"
    );

    if let Some(path) = cli.summary.as_deref() {
        write_summary_json(path, &summary)?;
        info!(path = %path.display(), "summary written");
    }

    if let Some(path) = cli.plot.as_deref() {
        let rows = plot_log_file(&cli.output, path)?;
        info!(path = %path.display(), rows, "plot written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_rust_log_overrides_verbose_flag() {
        let filter = log_filter(Some("trace"), false);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = log_filter(Some("warn"), true);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_cli_level_applies_without_rust_log() {
        assert_eq!(log_filter(None, false).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(None, true).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("  "), true).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_plot_flag_parses() {
        let cli = Cli::try_parse_from(["adrc-pendulum", "--plot", "out/data.png"]).unwrap();
        assert_eq!(cli.plot, Some(PathBuf::from("out/data.png")));
        assert_eq!(cli.output, PathBuf::from("data.txt"));
    }
}
