//! Step response simulation
//!
//! The transfer function is realized in state space and driven by a unit
//! step applied at the first grid point. Each interval is advanced with the
//! exact zero-order-hold discretization
//!
//!   exp([[A, B], [0, 0]] h) = [[Ad, Bd], [0, 1]],   x+ = Ad x + Bd u
//!
//! so accuracy does not depend on the sample spacing.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::statespace::StateSpace;
use crate::transfer::TransferFunction;
use crate::LoopError;

/// Relative tolerance below which two interval lengths share a discretization
const STEP_REUSE_TOL: f64 = 1e-12;

/// Settling band as a fraction of the reference value
const SETTLING_BAND: f64 = 0.02;

/// Validated simulation time points: at least two, finite, nonnegative and
/// strictly increasing
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    pub fn new(points: Vec<f64>) -> Result<Self, LoopError> {
        if points.len() < 2 {
            return Err(LoopError::InvalidParameter(format!(
                "time grid needs at least 2 points, got {}",
                points.len()
            )));
        }
        if let Some(bad) = points.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(LoopError::InvalidParameter(format!(
                "time points must be finite and nonnegative, got {bad}"
            )));
        }
        if let Some(idx) = points.windows(2).position(|w| w[1] <= w[0]) {
            return Err(LoopError::InvalidParameter(format!(
                "time grid must be strictly increasing (t[{}] = {} >= t[{}] = {})",
                idx,
                points[idx],
                idx + 1,
                points[idx + 1]
            )));
        }

        Ok(Self { points })
    }

    /// `samples` evenly spaced points from `start` to `end`, both included
    pub fn linspace(start: f64, end: f64, samples: usize) -> Result<Self, LoopError> {
        if samples < 2 {
            return Err(LoopError::InvalidParameter(format!(
                "time grid needs at least 2 points, got {samples}"
            )));
        }

        let span = end - start;
        let denom = (samples - 1) as f64;
        let mut points: Vec<f64> = (0..samples)
            .map(|idx| start + span * idx as f64 / denom)
            .collect();
        points[samples - 1] = end;

        Self::new(points)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for TimeGrid {
    /// 500 points over [0, 10]
    fn default() -> Self {
        let denom = 499.0;
        Self {
            points: (0..500).map(|idx| 10.0 * idx as f64 / denom).collect(),
        }
    }
}

/// Sampled output `y` at times `t`
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    t: Vec<f64>,
    y: Vec<f64>,
}

impl SimulationResult {
    pub fn t(&self) -> &[f64] {
        &self.t
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.t, self.y)
    }
}

/// Unit step response of `tf` sampled on `grid`.
///
/// The state is zero at `grid[0]`, where the step is applied, so the first
/// sample equals the direct feedthrough. Unstable poles are reported with a
/// warning and the samples are still returned; a non-finite state or output
/// fails the whole call.
pub fn step_response(tf: &TransferFunction, grid: &TimeGrid) -> Result<SimulationResult, LoopError> {
    let ss = StateSpace::from_transfer_function(tf)?;

    let unstable = tf.unstable_poles();
    if !unstable.is_empty() {
        warn!(
            count = unstable.len(),
            max_real = unstable.iter().map(|p| p.re).fold(f64::MIN, f64::max),
            "transfer function has poles in the closed right half-plane; response may diverge"
        );
    }

    let t = grid.as_slice();
    let n = ss.order();
    let mut y = Vec::with_capacity(t.len());

    if n == 0 {
        y.resize(t.len(), ss.d);
        return Ok(SimulationResult { t: t.to_vec(), y });
    }

    let mut x = DVector::<f64>::zeros(n);
    y.push(ss.output(&x, 1.0));

    let mut cached: Option<(f64, DMatrix<f64>, DVector<f64>)> = None;
    let mut discretizations = 0usize;

    for k in 1..t.len() {
        let h = t[k] - t[k - 1];
        let reuse = matches!(
            &cached,
            Some((h_prev, _, _)) if (h - h_prev).abs() <= STEP_REUSE_TOL * h.max(1.0)
        );
        if !reuse {
            let (ad, bd) = discretize(&ss, h);
            cached = Some((h, ad, bd));
            discretizations += 1;
        }

        if let Some((_, ad, bd)) = &cached {
            x = ad * &x + bd;
        }

        let yk = ss.output(&x, 1.0);
        if !yk.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(LoopError::Simulation(format!(
                "non-finite response at t = {} (sample {k})",
                t[k]
            )));
        }
        y.push(yk);
    }

    debug!(
        samples = t.len(),
        states = n,
        discretizations,
        "step response complete"
    );

    Ok(SimulationResult { t: t.to_vec(), y })
}

/// Zero-order-hold discretization over an interval of length `h`
fn discretize(ss: &StateSpace, h: f64) -> (DMatrix<f64>, DVector<f64>) {
    let n = ss.order();
    let mut m = DMatrix::<f64>::zeros(n + 1, n + 1);
    m.view_mut((0, 0), (n, n)).copy_from(&(&ss.a * h));
    for i in 0..n {
        m[(i, n)] = ss.b[i] * h;
    }

    let e = m.exp();
    let ad = e.view((0, 0), (n, n)).clone_owned();
    let bd = e.column(n).rows(0, n).clone_owned();
    (ad, bd)
}

/// Transient characteristics of a step response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    /// Value the metrics are measured against
    pub reference: f64,
    /// Last sample
    pub final_value: f64,
    /// Largest sample
    pub peak: f64,
    /// Time of the largest sample
    pub peak_time: f64,
    /// Peak excess over the reference, in percent (0 if never exceeded)
    pub overshoot_percent: f64,
    /// First time the response reaches 90% of the reference after crossing 10%
    pub rise_time: Option<f64>,
    /// Time after which the response stays within 2% of the reference
    pub settling_time: Option<f64>,
}

impl StepMetrics {
    /// Measure `result` against `reference`, or against its last sample when
    /// no reference is given.
    pub fn from_result(result: &SimulationResult, reference: Option<f64>) -> Self {
        let t = result.t();
        let y = result.y();
        let final_value = y.last().copied().unwrap_or(0.0);
        let reference = reference.unwrap_or(final_value);

        let (peak_idx, peak) = y
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, v)| if v > best.1 { (i, v) } else { best });
        let peak_time = t.get(peak_idx).copied().unwrap_or(0.0);

        let overshoot_percent = if reference != 0.0 && peak > reference {
            (peak - reference) / reference.abs() * 100.0
        } else {
            0.0
        };

        let rise_time = if reference > 0.0 {
            let low = y.iter().position(|&v| v >= 0.1 * reference);
            let high = y.iter().position(|&v| v >= 0.9 * reference);
            match (low, high) {
                (Some(lo), Some(hi)) if hi >= lo => Some(t[hi] - t[lo]),
                _ => None,
            }
        } else {
            None
        };

        let band = SETTLING_BAND * reference.abs().max(f64::EPSILON);
        let settling_time = match y.iter().rposition(|&v| (v - reference).abs() > band) {
            None => t.first().copied(),
            Some(idx) if idx + 1 < t.len() => Some(t[idx + 1]),
            Some(_) => None,
        };

        Self {
            reference,
            final_value,
            peak,
            peak_time,
            overshoot_percent,
            rise_time,
            settling_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tf(num: &[f64], den: &[f64]) -> TransferFunction {
        TransferFunction::new(num.to_vec(), den.to_vec()).unwrap()
    }

    #[test]
    fn test_time_grid_validation() {
        assert!(matches!(
            TimeGrid::new(vec![0.0]),
            Err(LoopError::InvalidParameter(_))
        ));
        assert!(matches!(
            TimeGrid::new(vec![0.0, 2.0, 1.0]),
            Err(LoopError::InvalidParameter(_))
        ));
        assert!(matches!(
            TimeGrid::new(vec![0.0, 1.0, 1.0]),
            Err(LoopError::InvalidParameter(_))
        ));
        assert!(matches!(
            TimeGrid::new(vec![-1.0, 1.0]),
            Err(LoopError::InvalidParameter(_))
        ));
        assert!(matches!(
            TimeGrid::new(vec![0.0, f64::INFINITY]),
            Err(LoopError::InvalidParameter(_))
        ));
        assert!(TimeGrid::new(vec![0.0, 10.0]).is_ok());
    }

    #[test]
    fn test_linspace_and_default() {
        let grid = TimeGrid::linspace(0.0, 10.0, 500).unwrap();
        assert_eq!(grid.len(), 500);
        assert_eq!(grid.as_slice()[0], 0.0);
        assert_eq!(grid.as_slice()[499], 10.0);
        let step = 10.0 / 499.0;
        assert!((grid.as_slice()[1] - step).abs() < 1e-15);

        let default = TimeGrid::default();
        assert_eq!(default.len(), 500);
        assert_eq!(default.as_slice()[499], 10.0);
        assert!(matches!(
            TimeGrid::linspace(0.0, 10.0, 1),
            Err(LoopError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_first_order_matches_analytic() {
        // 1/(s + 1): y = 1 - exp(-t)
        let grid = TimeGrid::linspace(0.0, 5.0, 51).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, 1.0]), &grid).unwrap();
        assert_eq!(result.len(), 51);
        for (&t, &y) in result.t().iter().zip(result.y()) {
            assert!((y - (1.0 - (-t).exp())).abs() < 1e-10, "t = {t}, y = {y}");
        }
    }

    #[test]
    fn test_second_order_matches_analytic() {
        // 1/(s + 1)^2: y = 1 - (1 + t) exp(-t)
        let grid = TimeGrid::linspace(0.0, 8.0, 81).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, 2.0, 1.0]), &grid).unwrap();
        for (&t, &y) in result.t().iter().zip(result.y()) {
            let expected = 1.0 - (1.0 + t) * (-t).exp();
            assert!((y - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_nonuniform_grid() {
        let grid = TimeGrid::new(vec![0.0, 0.1, 0.5, 0.6, 3.0]).unwrap();
        let result = step_response(&tf(&[2.0], &[1.0, 2.0]), &grid).unwrap();
        for (&t, &y) in result.t().iter().zip(result.y()) {
            assert!((y - (1.0 - (-2.0 * t).exp())).abs() < 1e-10);
        }
    }

    #[test]
    fn test_feedthrough_initial_value() {
        // (s + 2)/(s + 1): y(0) = D = 1, y(inf) = 2
        let grid = TimeGrid::linspace(0.0, 20.0, 201).unwrap();
        let result = step_response(&tf(&[1.0, 2.0], &[1.0, 1.0]), &grid).unwrap();
        assert_eq!(result.y()[0], 1.0);
        assert!((result.y()[200] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_static_gain_is_constant() {
        let grid = TimeGrid::linspace(0.0, 1.0, 5).unwrap();
        let result = step_response(&tf(&[4.0], &[2.0]), &grid).unwrap();
        assert_eq!(result.y(), &[2.0; 5]);
    }

    #[test]
    fn test_grid_offset_applies_step_at_first_point() {
        let grid = TimeGrid::new(vec![2.0, 3.0]).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, 1.0]), &grid).unwrap();
        assert_eq!(result.y()[0], 0.0);
        assert!((result.y()[1] - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_improper_is_rejected() {
        let grid = TimeGrid::default();
        assert!(matches!(
            step_response(&tf(&[1.0, 0.0], &[1.0]), &grid),
            Err(LoopError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_unstable_still_returns_values() {
        // 1/(s - 1): y = exp(t) - 1
        let grid = TimeGrid::linspace(0.0, 5.0, 11).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, -1.0]), &grid).unwrap();
        let expected = 5.0f64.exp() - 1.0;
        assert!((result.y()[10] - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn test_overflow_is_simulation_error() {
        // 1/(s - 100) over 10 s grows like exp(1000)
        let grid = TimeGrid::linspace(0.0, 10.0, 101).unwrap();
        assert!(matches!(
            step_response(&tf(&[1.0], &[1.0, -100.0]), &grid),
            Err(LoopError::Simulation(_))
        ));
    }

    #[test]
    fn test_metrics_first_order() {
        let grid = TimeGrid::linspace(0.0, 10.0, 1001).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, 1.0]), &grid).unwrap();
        let m = StepMetrics::from_result(&result, Some(1.0));
        assert_eq!(m.overshoot_percent, 0.0);
        // ln(9) ~ 2.197
        let rise = m.rise_time.unwrap();
        assert!((rise - 9.0f64.ln()).abs() < 0.02);
        // ln(50) ~ 3.912
        let settle = m.settling_time.unwrap();
        assert!((settle - 50.0f64.ln()).abs() < 0.02);
    }

    #[test]
    fn test_metrics_underdamped_overshoot() {
        // wn = 1, zeta = 0.2: overshoot = exp(-pi zeta / sqrt(1 - zeta^2))
        let grid = TimeGrid::linspace(0.0, 60.0, 6001).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, 0.4, 1.0]), &grid).unwrap();
        let m = StepMetrics::from_result(&result, Some(1.0));
        let zeta: f64 = 0.2;
        let expected = (-std::f64::consts::PI * zeta / (1.0 - zeta * zeta).sqrt()).exp() * 100.0;
        assert!((m.overshoot_percent - expected).abs() < 0.1);
        assert!(m.settling_time.is_some());
    }

    #[test]
    fn test_metrics_never_settles() {
        let grid = TimeGrid::linspace(0.0, 5.0, 51).unwrap();
        let result = step_response(&tf(&[1.0], &[1.0, -1.0]), &grid).unwrap();
        let m = StepMetrics::from_result(&result, Some(-1.0));
        assert!(m.settling_time.is_none());
    }
}
