//! Loop configuration
//!
//! Every tunable of the closed-loop run lives here: controller gains, plant
//! coefficients, the simulated horizon and the post-processing parameters.
//! Defaults reproduce the reference run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::response::TimeGrid;
use crate::LoopError;

/// PID controller gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
}

impl PidGains {
    /// Create new PID gains
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    /// Reference gains (Kp = 50, Ki = 100, Kd = 10)
    pub fn default_gains() -> Self {
        Self {
            kp: 50.0,
            ki: 100.0,
            kd: 10.0,
        }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::default_gains()
    }
}

/// Plant transfer function coefficients, highest degree first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
}

impl Default for PlantConfig {
    /// G(s) = 1 / (s^3 + 3s^2 + 5s + 1)
    fn default() -> Self {
        Self {
            numerator: vec![1.0],
            denominator: vec![1.0, 3.0, 5.0, 1.0],
        }
    }
}

/// Simulated time span, sampled uniformly with both ends included
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    pub start: f64,
    pub end: f64,
    pub samples: usize,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 10.0,
            samples: 500,
        }
    }
}

/// Full configuration of one closed-loop run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub gains: PidGains,
    pub plant: PlantConfig,
    pub horizon: HorizonConfig,
    /// Standard deviation of the additive sensor noise
    pub noise_level: f64,
    /// Symmetric actuator limit
    pub max_control_signal: f64,
    /// Noise seed; `None` draws fresh entropy on every run
    pub seed: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            plant: PlantConfig::default(),
            horizon: HorizonConfig::default(),
            noise_level: 0.05,
            max_control_signal: 10.0,
            seed: None,
        }
    }
}

impl LoopConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, LoopError> {
        let cfg: LoopConfig = toml::from_str(raw)?;
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, LoopError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Check the horizon and post-processing parameters.
    ///
    /// Gains are only required to be finite; their sign is left to the caller.
    pub fn validate(&self) -> Result<(), LoopError> {
        let PidGains { kp, ki, kd } = self.gains;
        if !(kp.is_finite() && ki.is_finite() && kd.is_finite()) {
            return Err(LoopError::InvalidParameter(
                "controller gains must be finite".to_string(),
            ));
        }

        let HorizonConfig { start, end, samples } = self.horizon;
        if !start.is_finite() || !end.is_finite() {
            return Err(LoopError::InvalidParameter(
                "horizon start and end must be finite".to_string(),
            ));
        }
        if start < 0.0 {
            return Err(LoopError::InvalidParameter(
                "horizon start must be >= 0".to_string(),
            ));
        }
        if end <= start {
            return Err(LoopError::InvalidParameter(
                "horizon end must be greater than start".to_string(),
            ));
        }
        if samples < 2 {
            return Err(LoopError::InvalidParameter(
                "horizon needs at least 2 samples".to_string(),
            ));
        }

        if !self.noise_level.is_finite() || self.noise_level < 0.0 {
            return Err(LoopError::InvalidParameter(
                "noise_level must be finite and >= 0".to_string(),
            ));
        }

        if !self.max_control_signal.is_finite() || self.max_control_signal <= 0.0 {
            return Err(LoopError::InvalidParameter(
                "max_control_signal must be finite and > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn time_grid(&self) -> Result<TimeGrid, LoopError> {
        TimeGrid::linspace(self.horizon.start, self.horizon.end, self.horizon.samples)
    }
}
