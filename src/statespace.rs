//! State-space realization of a SISO transfer function
//!
//!   dx/dt = A x + B u
//!   y     = C x + D u
//!
//! using the controllable canonical (companion) form: the first row of A
//! holds the negated, normalized denominator coefficients and the
//! subdiagonal is the identity.

use nalgebra::{DMatrix, DVector};

use crate::poly;
use crate::transfer::TransferFunction;
use crate::LoopError;

/// SISO state-space model
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace {
    /// State matrix (n x n)
    pub a: DMatrix<f64>,
    /// Input column (n)
    pub b: DVector<f64>,
    /// Output row (n)
    pub c: DVector<f64>,
    /// Direct feedthrough
    pub d: f64,
}

impl StateSpace {
    /// Realize a proper transfer function.
    ///
    /// Leading zeros are stripped and the denominator is normalized so its
    /// leading coefficient is one. Improper functions have no realization.
    pub fn from_transfer_function(tf: &TransferFunction) -> Result<Self, LoopError> {
        if !tf.is_proper() {
            return Err(LoopError::InvalidModel(format!(
                "improper transfer function (numerator degree {} > denominator degree {}) has no state-space realization",
                poly::degree(tf.numerator()),
                tf.order()
            )));
        }

        let den = poly::trim_leading_zeros(tf.denominator());
        let num = poly::trim_leading_zeros(tf.numerator());
        let lead = den[0];
        let n = den.len() - 1;

        let den: Vec<f64> = den.iter().map(|&x| x / lead).collect();
        let mut num_padded = vec![0.0; den.len() - num.len()];
        num_padded.extend(num.iter().map(|&x| x / lead));

        let d = num_padded[0];

        let mut a = DMatrix::<f64>::zeros(n, n);
        for j in 0..n {
            a[(0, j)] = -den[j + 1];
        }
        for i in 1..n {
            a[(i, i - 1)] = 1.0;
        }

        let mut b = DVector::<f64>::zeros(n);
        if n > 0 {
            b[0] = 1.0;
        }

        // Strictly proper remainder N - D*den
        let c = DVector::from_iterator(n, (0..n).map(|i| num_padded[i + 1] - d * den[i + 1]));

        Ok(Self { a, b, c, d })
    }

    /// Number of states
    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// Output for a given state and input
    pub fn output(&self, x: &DVector<f64>, u: f64) -> f64 {
        self.c.dot(x) + self.d * u
    }
}
