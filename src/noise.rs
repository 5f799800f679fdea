//! Sensor noise and actuator saturation
//!
//! Post-processing applied to a sampled response: additive zero-mean
//! Gaussian noise followed by symmetric clipping.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::LoopError;

/// Additive Gaussian sensor noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseModel {
    /// Standard deviation of each draw
    noise_level: f64,
    /// Fixed seed for reproducible draws
    seed: Option<u64>,
}

impl NoiseModel {
    /// Create a noise model. Without a seed every call to [`apply`](Self::apply)
    /// draws fresh entropy.
    pub fn new(noise_level: f64, seed: Option<u64>) -> Result<Self, LoopError> {
        if !noise_level.is_finite() || noise_level < 0.0 {
            return Err(LoopError::InvalidParameter(format!(
                "noise_level must be finite and >= 0, got {noise_level}"
            )));
        }
        Ok(Self { noise_level, seed })
    }

    pub fn noise_level(&self) -> f64 {
        self.noise_level
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Add one independent draw to every sample
    pub fn apply(&self, y: &[f64]) -> Result<Vec<f64>, LoopError> {
        if self.noise_level == 0.0 {
            return Ok(y.to_vec());
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.apply_with_rng(y, &mut rng)
    }

    /// Add noise using a caller-supplied random source
    pub fn apply_with_rng<R: Rng + ?Sized>(
        &self,
        y: &[f64],
        rng: &mut R,
    ) -> Result<Vec<f64>, LoopError> {
        if self.noise_level == 0.0 {
            return Ok(y.to_vec());
        }

        let dist = Normal::new(0.0, self.noise_level)
            .map_err(|e| LoopError::InvalidParameter(format!("noise distribution: {e}")))?;
        Ok(y.iter().map(|&v| v + dist.sample(rng)).collect())
    }
}

/// Symmetric actuator limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationLimit {
    max_control_signal: f64,
}

impl SaturationLimit {
    pub fn new(max_control_signal: f64) -> Result<Self, LoopError> {
        if !max_control_signal.is_finite() || max_control_signal <= 0.0 {
            return Err(LoopError::InvalidParameter(format!(
                "saturation limit must be finite and > 0, got {max_control_signal}"
            )));
        }
        Ok(Self { max_control_signal })
    }

    pub fn limit(&self) -> f64 {
        self.max_control_signal
    }

    /// Clip every sample to [-limit, +limit]
    pub fn apply(&self, y: &[f64]) -> Vec<f64> {
        let l = self.max_control_signal;
        y.iter().map(|&v| v.clamp(-l, l)).collect()
    }
}

/// `y + N(0, noise_level^2)` with fresh entropy
pub fn add_noise(y: &[f64], noise_level: f64) -> Result<Vec<f64>, LoopError> {
    NoiseModel::new(noise_level, None)?.apply(y)
}

/// `clip(y, -limit, +limit)`
pub fn saturate(y: &[f64], limit: f64) -> Result<Vec<f64>, LoopError> {
    Ok(SaturationLimit::new(limit)?.apply(y))
}
