//! Polynomial arithmetic on coefficient vectors
//!
//! Coefficients are stored highest degree first, so `[1.0, 3.0, 5.0, 1.0]`
//! is `s^3 + 3s^2 + 5s + 1`.

use nalgebra::{Complex, DMatrix};

/// Product of two polynomials (full convolution, nothing cancelled)
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Sum of two polynomials.
///
/// The shorter operand is zero-padded on the high-degree side so that equal
/// powers of `s` line up.
pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().max(b.len());
    let pad_a = len - a.len();
    let pad_b = len - b.len();

    (0..len)
        .map(|i| {
            let x = if i >= pad_a { a[i - pad_a] } else { 0.0 };
            let y = if i >= pad_b { b[i - pad_b] } else { 0.0 };
            x + y
        })
        .collect()
}

/// Difference `a - b`, aligned like [`add`]
pub fn subtract(a: &[f64], b: &[f64]) -> Vec<f64> {
    let negated: Vec<f64> = b.iter().map(|&c| -c).collect();
    add(a, &negated)
}

/// Evaluate at a real point (Horner)
pub fn evaluate(p: &[f64], s: f64) -> f64 {
    p.iter().fold(0.0, |acc, &c| acc * s + c)
}

/// Evaluate at a complex point (Horner)
pub fn evaluate_complex(p: &[f64], s: Complex<f64>) -> Complex<f64> {
    p.iter()
        .fold(Complex::new(0.0, 0.0), |acc, &c| acc * s + Complex::new(c, 0.0))
}

/// Drop leading zero coefficients, keeping at least one coefficient
pub fn trim_leading_zeros(p: &[f64]) -> Vec<f64> {
    match p.iter().position(|&c| c != 0.0) {
        Some(first) => p[first..].to_vec(),
        None if p.is_empty() => Vec::new(),
        None => vec![0.0],
    }
}

/// True for the empty polynomial or one whose coefficients are all exactly zero
pub fn is_zero(p: &[f64]) -> bool {
    p.iter().all(|&c| c == 0.0)
}

/// Degree after trimming leading zeros (the zero polynomial has degree 0)
pub fn degree(p: &[f64]) -> usize {
    trim_leading_zeros(p).len().saturating_sub(1)
}

/// Roots via the eigenvalues of the companion matrix.
///
/// Leading zeros are ignored. Constant and zero polynomials have no roots.
pub fn roots(p: &[f64]) -> Vec<Complex<f64>> {
    let p = trim_leading_zeros(p);
    if p.len() < 2 {
        return Vec::new();
    }

    let n = p.len() - 1;
    let lead = p[0];
    let mut companion = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        companion[(0, j)] = -p[j + 1] / lead;
    }
    for i in 1..n {
        companion[(i, i - 1)] = 1.0;
    }

    companion.complex_eigenvalues().iter().copied().collect()
}
