//! Series, parallel and feedback interconnection of transfer functions
//!
//! All operations are plain polynomial arithmetic on the operands'
//! coefficients. Common factors are never cancelled, so `series` of a PID
//! controller and a plant keeps the controller's integrator pole even where a
//! zero could absorb it.

use tracing::debug;

use crate::poly;
use crate::transfer::TransferFunction;
use crate::LoopError;

/// Sign of the feedback path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackSign {
    /// T = H / (1 + H)
    #[default]
    Negative,
    /// T = H / (1 - H)
    Positive,
}

/// Cascade `a` then `b`: (Na Nb) / (Da Db), unreduced
pub fn series(a: &TransferFunction, b: &TransferFunction) -> Result<TransferFunction, LoopError> {
    let numerator = poly::multiply(a.numerator(), b.numerator());
    let denominator = poly::multiply(a.denominator(), b.denominator());
    finish("series", numerator, denominator)
}

/// Sum of outputs: (Na Db + Nb Da) / (Da Db)
pub fn parallel(
    a: &TransferFunction,
    b: &TransferFunction,
) -> Result<TransferFunction, LoopError> {
    let numerator = poly::add(
        &poly::multiply(a.numerator(), b.denominator()),
        &poly::multiply(b.numerator(), a.denominator()),
    );
    let denominator = poly::multiply(a.denominator(), b.denominator());
    finish("parallel", numerator, denominator)
}

/// Close a unity feedback loop around `h`.
///
/// The numerator is kept; the denominator becomes Dh + Nh (negative) or
/// Dh - Nh (positive), aligned on the constant term.
pub fn feedback(h: &TransferFunction, sign: FeedbackSign) -> Result<TransferFunction, LoopError> {
    let denominator = match sign {
        FeedbackSign::Negative => poly::add(h.denominator(), h.numerator()),
        FeedbackSign::Positive => poly::subtract(h.denominator(), h.numerator()),
    };

    if poly::is_zero(&denominator) {
        return Err(LoopError::InvalidModel(
            "feedback cancels the closed-loop denominator".to_string(),
        ));
    }

    finish("feedback", h.numerator().to_vec(), denominator)
}

fn finish(
    op: &'static str,
    numerator: Vec<f64>,
    denominator: Vec<f64>,
) -> Result<TransferFunction, LoopError> {
    if poly::is_zero(&denominator) {
        return Err(LoopError::InvalidModel(format!(
            "{op} produced a zero denominator"
        )));
    }

    let numerator = poly::trim_leading_zeros(&numerator);
    let denominator = poly::trim_leading_zeros(&denominator);
    debug!(
        op,
        num_degree = numerator.len() - 1,
        den_degree = denominator.len() - 1,
        "composed transfer function"
    );

    TransferFunction::new(numerator, denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PidGains, PlantConfig};

    fn tf(num: &[f64], den: &[f64]) -> TransferFunction {
        TransferFunction::new(num.to_vec(), den.to_vec()).unwrap()
    }

    #[test]
    fn test_series_is_unreduced() {
        // (s + 1)/(s + 2) * 1/(s + 1): the shared (s + 1) must survive
        let a = tf(&[1.0, 1.0], &[1.0, 2.0]);
        let b = tf(&[1.0], &[1.0, 1.0]);
        let c = series(&a, &b).unwrap();
        assert_eq!(c.numerator(), &[1.0, 1.0]);
        assert_eq!(c.denominator(), &[1.0, 3.0, 2.0]);
        assert_eq!(c.order(), 2);
    }

    #[test]
    fn test_reference_closed_loop_polynomials() {
        let plant = TransferFunction::plant(&PlantConfig::default()).unwrap();
        let pid = TransferFunction::pid(&PidGains::default()).unwrap();

        let open_loop = series(&pid, &plant).unwrap();
        assert_eq!(open_loop.numerator(), &[10.0, 50.0, 100.0]);
        assert_eq!(open_loop.denominator(), &[1.0, 3.0, 5.0, 1.0, 0.0]);

        let closed = feedback(&open_loop, FeedbackSign::Negative).unwrap();
        assert_eq!(closed.numerator(), &[10.0, 50.0, 100.0]);
        assert_eq!(closed.denominator(), &[1.0, 3.0, 15.0, 51.0, 100.0]);
        assert_eq!(closed.dc_gain(), Some(1.0));
    }

    #[test]
    fn test_positive_feedback() {
        // 1/(s + 3) with positive feedback -> 1/(s + 2)
        let h = tf(&[1.0], &[1.0, 3.0]);
        let closed = feedback(&h, FeedbackSign::Positive).unwrap();
        assert_eq!(closed.denominator(), &[1.0, 2.0]);
    }

    #[test]
    fn test_feedback_trims_cancelled_leading_term() {
        // H = -s / (s + 1): 1 + H has denominator (s + 1) - s = 1
        let h = tf(&[-1.0, 0.0], &[1.0, 1.0]);
        let closed = feedback(&h, FeedbackSign::Negative).unwrap();
        assert_eq!(closed.denominator(), &[1.0]);
        assert_eq!(closed.numerator(), &[-1.0, 0.0]);
    }

    #[test]
    fn test_feedback_degenerate_denominator() {
        // H = -1: 1 + H = 0
        let h = tf(&[-1.0], &[1.0]);
        assert!(matches!(
            feedback(&h, FeedbackSign::Negative),
            Err(LoopError::InvalidModel(_))
        ));

        // H = (s + 2)/(s + 2) with positive feedback: D - N = 0
        let h = tf(&[1.0, 2.0], &[1.0, 2.0]);
        assert!(matches!(
            feedback(&h, FeedbackSign::Positive),
            Err(LoopError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_parallel() {
        // 1/s + 1/(s + 1) = (2s + 1) / (s^2 + s)
        let a = tf(&[1.0], &[1.0, 0.0]);
        let b = tf(&[1.0], &[1.0, 1.0]);
        let c = parallel(&a, &b).unwrap();
        assert_eq!(c.numerator(), &[2.0, 1.0]);
        assert_eq!(c.denominator(), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_default_sign_is_negative() {
        assert_eq!(FeedbackSign::default(), FeedbackSign::Negative);
    }
}
