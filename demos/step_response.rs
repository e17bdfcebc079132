//! Step Response Example
//!
//! Runs the reference ADRC pendulum configuration, compares it against a
//! noisy-measurement run and prints tracking metrics

use adrc_pendulum::output::{RunSummary, SETTLING_BAND};
use adrc_pendulum::plot::plot_log_file;
use adrc_pendulum::sim::{run_simulation, setpoint_switch_index};
use adrc_pendulum::{LogWriter, SimConfig, SimError, TrajectorySink};
use std::fs;
use std::path::Path;

fn print_summary(label: &str, summary: &RunSummary) {
    println!("{label}:");
    println!("  RMS tracking error: {:.6} rad", summary.rms_tracking_error);
    println!("  Peak control:       {:.3} N m", summary.peak_control);
    println!("  Final angle:        {:.6} rad", summary.final_angle);
    println!("  Final disturbance:  {:.6}", summary.final_disturbance);
    match summary.settling_time {
        Some(t) => println!("  Settling time ({}%): {:.2} s", SETTLING_BAND * 100.0, t),
        None => println!("  Settling time ({}%): not settled", SETTLING_BAND * 100.0),
    }
}

fn main() -> Result<(), SimError> {
    println!("Running ADRC Pendulum Step Response...\n");

    fs::create_dir_all("out")?;

    let config = SimConfig::default();
    println!("Configuration:");
    println!("  Time step: {}", config.time_step);
    println!("  Total steps: {}", config.iterations);
    println!(
        "  Setpoint: {:.4} -> {:.4} rad after t > {} s",
        config.setpoint_initial, config.setpoint_final, config.setpoint_switch_time
    );
    println!(
        "  Observer gains: {} / {} / {}",
        config.controller.l1, config.controller.l2, config.controller.l3
    );
    println!(
        "  Control gains: k_p = {}, k_d = {}, b0 = {}",
        config.controller.k_p, config.controller.k_d, config.controller.b0
    );
    println!();

    let clean = run_simulation(&config)?;

    let noisy_config = SimConfig {
        measurement_noise_std: 0.005,
        ..config.clone()
    };
    let noisy = run_simulation(&noisy_config)?;

    if let Some(idx) = setpoint_switch_index(&clean) {
        println!("Setpoint switched at step {} (t = {:.2} s)\n", idx, clean[idx].t);
    }

    println!("METRICS SUMMARY");
    println!("===============\n");
    print_summary("Noiseless", &RunSummary::from_results(&config, &clean));
    println!();
    print_summary("Noisy measurement", &RunSummary::from_results(&noisy_config, &noisy));

    let log_path = Path::new("out/data.txt");
    let mut log = LogWriter::create(log_path)?;
    for step in &clean {
        log.record(step)?;
    }
    log.finish()?;

    let plot_path = Path::new("out/step_response.png");
    plot_log_file(log_path, plot_path)?;

    println!("\nLog written to: {}", log_path.display());
    println!("Plot written to: {}", plot_path.display());
    println!("Done!");

    Ok(())
}
