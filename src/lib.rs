//! loopsim - closed-loop PID simulation
//!
//! Builds a plant and a PID controller as Laplace-domain transfer functions,
//! closes the loop with unity feedback, simulates the unit step response and
//! corrupts it with sensor noise and actuator saturation.

pub mod compose;
pub mod config;
pub mod noise;
pub mod poly;
pub mod response;
pub mod sim;
pub mod statespace;
pub mod transfer;

use thiserror::Error;

// Re-export main types
pub use compose::{feedback, parallel, series, FeedbackSign};
pub use config::{HorizonConfig, LoopConfig, PidGains, PlantConfig};
pub use noise::{add_noise, saturate, NoiseModel, SaturationLimit};
pub use response::{step_response, SimulationResult, StepMetrics, TimeGrid};
pub use sim::{rms_error, run_closed_loop, LoopOutput};
pub use statespace::StateSpace;
pub use transfer::TransferFunction;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("simulation failed: {0}")]
    Simulation(String),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
