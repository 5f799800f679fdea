use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use loopsim::{rms_error, run_closed_loop, LoopConfig, LoopOutput};

#[derive(Debug, Parser)]
#[command(name = "loopsim")]
#[command(about = "PID closed-loop step response with sensor noise and actuator saturation")]
struct Cli {
    /// TOML file with loop settings; missing keys use the reference values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the noise generator
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    kp: Option<f64>,

    #[arg(long)]
    ki: Option<f64>,

    #[arg(long)]
    kd: Option<f64>,
}

fn load_config(cli: &Cli) -> Result<LoopConfig> {
    let mut config = match &cli.config {
        Some(path) => LoopConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config file: {}", path.display()))?,
        None => LoopConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(kp) = cli.kp {
        config.gains.kp = kp;
    }
    if let Some(ki) = cli.ki {
        config.gains.ki = ki;
    }
    if let Some(kd) = cli.kd {
        config.gains.kd = kd;
    }

    Ok(config)
}

fn format_poly(coeffs: &[f64]) -> String {
    let parts: Vec<String> = coeffs.iter().map(|c| format!("{c}")).collect();
    format!("[{}]", parts.join(", "))
}

fn print_summary(config: &LoopConfig, out: &LoopOutput) -> Result<()> {
    let cl = &out.closed_loop;
    let m = &out.metrics;

    println!("PID gains: Kp = {}, Ki = {}, Kd = {}", config.gains.kp, config.gains.ki, config.gains.kd);
    println!("Closed loop numerator:   {}", format_poly(cl.numerator()));
    println!("Closed loop denominator: {}", format_poly(cl.denominator()));

    println!("Poles:");
    for p in cl.poles() {
        println!("  {:+.4} {:+.4}j", p.re, p.im);
    }
    println!("Stable: {}", cl.is_stable());
    match cl.dc_gain() {
        Some(g) => println!("DC gain: {g:.6}"),
        None => println!("DC gain: unbounded"),
    }

    println!("\nStep response ({} samples):", out.t.len());
    println!("  Final value:  {:.6}", m.final_value);
    println!("  Peak:         {:.6} at t = {:.3}", m.peak, m.peak_time);
    println!("  Overshoot:    {:.2}%", m.overshoot_percent);
    match m.rise_time {
        Some(t) => println!("  Rise time:    {t:.3}"),
        None => println!("  Rise time:    n/a"),
    }
    match m.settling_time {
        Some(t) => println!("  Settling (2%): {t:.3}"),
        None => println!("  Settling (2%): not settled"),
    }

    let noise_rms = rms_error(&out.y, &out.y_noisy)?;
    let clip_rms = rms_error(&out.y_noisy, &out.y_noisy_saturated)?;
    let clipped = out
        .y_noisy
        .iter()
        .zip(&out.y_noisy_saturated)
        .filter(|(a, b)| a != b)
        .count();

    println!("\nPost-processing:");
    println!("  Noise level {} -> RMS deviation {:.4}", config.noise_level, noise_rms);
    println!(
        "  Saturation +/-{} -> {} clipped samples, RMS deviation {:.4}",
        config.max_control_signal, clipped, clip_rms
    );

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let out = run_closed_loop(&config).context("closed-loop simulation failed")?;
    print_summary(&config, &out)?;

    Ok(())
}
