//! Closed-loop simulation harness
//!
//! Builds the plant and PID controller from a [`LoopConfig`], closes the
//! loop, simulates the step response and applies noise then saturation.

use tracing::{info, info_span};

use crate::compose::{feedback, series, FeedbackSign};
use crate::config::LoopConfig;
use crate::noise::{NoiseModel, SaturationLimit};
use crate::response::{step_response, StepMetrics};
use crate::transfer::TransferFunction;
use crate::LoopError;

/// Everything one closed-loop run produces
#[derive(Debug, Clone)]
pub struct LoopOutput {
    /// Closed-loop transfer function T = CG / (1 + CG)
    pub closed_loop: TransferFunction,
    pub t: Vec<f64>,
    /// Noise-free step response
    pub y: Vec<f64>,
    /// Response with sensor noise
    pub y_noisy: Vec<f64>,
    /// Noisy response clipped to the actuator limit
    pub y_noisy_saturated: Vec<f64>,
    pub metrics: StepMetrics,
}

/// Run the full pipeline for one configuration
pub fn run_closed_loop(config: &LoopConfig) -> Result<LoopOutput, LoopError> {
    let span = info_span!(
        "closed_loop",
        kp = config.gains.kp,
        ki = config.gains.ki,
        kd = config.gains.kd
    );
    let _guard = span.enter();

    config.validate()?;
    let grid = config.time_grid()?;
    let noise = NoiseModel::new(config.noise_level, config.seed)?;
    let limit = SaturationLimit::new(config.max_control_signal)?;

    let plant = TransferFunction::plant(&config.plant)?;
    let controller = TransferFunction::pid(&config.gains)?;
    let open_loop = series(&controller, &plant)?;
    let closed_loop = feedback(&open_loop, FeedbackSign::Negative)?;

    let result = step_response(&closed_loop, &grid)?;
    let metrics = StepMetrics::from_result(&result, closed_loop.dc_gain());
    let (t, y) = result.into_parts();

    let y_noisy = noise.apply(&y)?;
    let y_noisy_saturated = limit.apply(&y_noisy);

    info!(
        samples = t.len(),
        stable = closed_loop.is_stable(),
        final_value = metrics.final_value,
        clipped = y_noisy
            .iter()
            .filter(|v| v.abs() > limit.limit())
            .count(),
        "closed-loop run complete"
    );

    Ok(LoopOutput {
        closed_loop,
        t,
        y,
        y_noisy,
        y_noisy_saturated,
        metrics,
    })
}

/// RMS difference between two equally long sequences
pub fn rms_error(a: &[f64], b: &[f64]) -> Result<f64, LoopError> {
    if a.len() != b.len() {
        return Err(LoopError::InvalidParameter(format!(
            "length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let sum_sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok((sum_sq / a.len() as f64).sqrt())
}
