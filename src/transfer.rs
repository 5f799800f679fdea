//! Laplace-domain transfer functions
//!
//! A transfer function is the rational function N(s) / D(s) of two real
//! polynomials. Instances are immutable; composition produces new values.

use nalgebra::Complex;

use crate::config::{PidGains, PlantConfig};
use crate::poly;
use crate::LoopError;

/// Rational transfer function N(s) / D(s)
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    /// Numerator coefficients, highest degree first
    numerator: Vec<f64>,
    /// Denominator coefficients, highest degree first
    denominator: Vec<f64>,
}

impl TransferFunction {
    /// Create a transfer function from literal coefficients.
    ///
    /// Coefficients are kept exactly as given. Fails if either polynomial is
    /// empty, a coefficient is not finite, or the denominator is identically
    /// zero.
    pub fn new(numerator: Vec<f64>, denominator: Vec<f64>) -> Result<Self, LoopError> {
        if numerator.is_empty() {
            return Err(LoopError::InvalidModel("numerator is empty".to_string()));
        }
        if denominator.is_empty() {
            return Err(LoopError::InvalidModel("denominator is empty".to_string()));
        }
        if numerator
            .iter()
            .chain(denominator.iter())
            .any(|c| !c.is_finite())
        {
            return Err(LoopError::InvalidModel(
                "coefficients must be finite".to_string(),
            ));
        }
        if poly::is_zero(&denominator) {
            return Err(LoopError::InvalidModel(
                "denominator is identically zero".to_string(),
            ));
        }

        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Plant G(s) from configured coefficients
    pub fn plant(plant: &PlantConfig) -> Result<Self, LoopError> {
        Self::new(plant.numerator.clone(), plant.denominator.clone())
    }

    /// Ideal PID controller C(s) = (Kd s^2 + Kp s + Ki) / s
    pub fn pid(gains: &PidGains) -> Result<Self, LoopError> {
        Self::new(vec![gains.kd, gains.kp, gains.ki], vec![1.0, 0.0])
    }

    pub fn numerator(&self) -> &[f64] {
        &self.numerator
    }

    pub fn denominator(&self) -> &[f64] {
        &self.denominator
    }

    /// Degree of the denominator, ignoring leading zeros
    pub fn order(&self) -> usize {
        poly::degree(&self.denominator)
    }

    /// True when deg N <= deg D
    pub fn is_proper(&self) -> bool {
        poly::degree(&self.numerator) <= self.order()
    }

    /// Value at a real point
    pub fn evaluate(&self, s: f64) -> f64 {
        poly::evaluate(&self.numerator, s) / poly::evaluate(&self.denominator, s)
    }

    /// Value at a complex point, e.g. `s = jw` for frequency response
    pub fn evaluate_complex(&self, s: Complex<f64>) -> Complex<f64> {
        poly::evaluate_complex(&self.numerator, s) / poly::evaluate_complex(&self.denominator, s)
    }

    /// Steady-state gain, the value at `s = 0`.
    ///
    /// Shared factors of `s` are cancelled first. Returns `None` when a pole
    /// at the origin remains (the gain is unbounded).
    pub fn dc_gain(&self) -> Option<f64> {
        let num = poly::trim_leading_zeros(&self.numerator);
        let den = poly::trim_leading_zeros(&self.denominator);

        // Number of trailing zeros = multiplicity of the root at s = 0
        let num_zeros = num.iter().rev().take_while(|&&c| c == 0.0).count();
        let den_zeros = den.iter().rev().take_while(|&&c| c == 0.0).count();

        if num_zeros == num.len() {
            return Some(0.0);
        }
        if den_zeros > num_zeros {
            return None;
        }
        if num_zeros > den_zeros {
            return Some(0.0);
        }

        let shift = num_zeros;
        Some(num[num.len() - 1 - shift] / den[den.len() - 1 - shift])
    }

    /// Roots of the denominator
    pub fn poles(&self) -> Vec<Complex<f64>> {
        poly::roots(&self.denominator)
    }

    /// Roots of the numerator
    pub fn zeros(&self) -> Vec<Complex<f64>> {
        poly::roots(&self.numerator)
    }

    /// True when every pole lies strictly in the left half-plane
    pub fn is_stable(&self) -> bool {
        self.poles().iter().all(|p| p.re < 0.0)
    }

    /// Poles with nonnegative real part
    pub fn unstable_poles(&self) -> Vec<Complex<f64>> {
        self.poles().into_iter().filter(|p| p.re >= 0.0).collect()
    }
}
