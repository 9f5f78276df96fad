//! Interpolation kernels for tabulated material data.
//!
//! - [`LogLogTable`]: piecewise linear interpolation in log-log space, used for
//!   attenuation and absorption coefficients.
//! - [`AkimaSpline`]: Akima's shape-preserving cubic, used for the buildup
//!   factor coefficients over the logarithm of energy.
//!
//! Neither kernel extrapolates. Callers check [`LogLogTable::contains`] or the
//! spline bounds before evaluating.

use ndarray::Array1;

use crate::error::{Result, ShieldingError};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn loglog_exact_at_nodes() {
        let table = LogLogTable::new(array![0.01, 0.1, 1.0, 10.0], array![5.12, 0.1541, 0.06358, 0.02045]).unwrap();
        assert_eq!(table.eval(0.01), Some(5.12));
        assert_eq!(table.eval(1.0), Some(0.06358));
        assert_eq!(table.eval(10.0), Some(0.02045));
    }

    #[test]
    fn loglog_reproduces_power_law() {
        // y = 3 x^-2 is a straight line in log-log space
        let x = array![0.1, 1.0, 10.0];
        let y = x.mapv(|v: f64| 3.0 * v.powi(-2));
        let table = LogLogTable::new(x, y).unwrap();
        let e: f64 = 0.5;
        let expected = 3.0 * e.powi(-2);
        let value = table.eval(e).unwrap();
        assert!((value - expected).abs() / expected < 1e-12, "value: {}", value);
    }

    #[test]
    fn loglog_does_not_extrapolate() {
        let table = LogLogTable::new(array![1.0, 2.0], array![1.0, 0.5]).unwrap();
        assert!(table.eval(0.999).is_none());
        assert!(table.eval(2.001).is_none());
        assert!(!table.contains(f64::NAN));
        assert_eq!(table.bounds(), (1.0, 2.0));
    }

    #[test]
    fn loglog_rejects_bad_tables() {
        assert!(LogLogTable::new(array![1.0], array![1.0]).is_err());
        assert!(LogLogTable::new(array![1.0, 2.0], array![1.0]).is_err());
        assert!(LogLogTable::new(array![2.0, 1.0], array![1.0, 1.0]).is_err());
        assert!(LogLogTable::new(array![1.0, 2.0], array![1.0, 0.0]).is_err());
        assert!(LogLogTable::new(array![0.0, 2.0], array![1.0, 1.0]).is_err());
    }

    #[test]
    fn akima_passes_through_nodes() {
        let x = array![0.0, 1.0, 2.5, 3.0, 4.5, 6.0];
        let y = array![1.0, 2.0, 0.5, 0.7, 3.0, 2.0];
        let spline = AkimaSpline::new(x.clone(), y.clone()).unwrap();
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert!((spline.eval(*xi) - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn akima_reproduces_linear_data() {
        let x = array![-2.0, -1.0, 0.5, 1.0, 3.0];
        let y = x.mapv(|v| 2.0 * v - 1.0);
        let spline = AkimaSpline::new(x, y).unwrap();
        for q in [-1.7, -0.2, 0.75, 2.2] {
            assert!((spline.eval(q) - (2.0 * q - 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn akima_does_not_overshoot_a_step() {
        let x = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let spline = AkimaSpline::new(x, y).unwrap();
        for i in 0..=50 {
            let q = i as f64 * 0.1;
            let v = spline.eval(q);
            assert!((-1e-12..=1.0 + 1e-12).contains(&v), "overshoot {} at {}", v, q);
        }
        // flat regions stay flat
        assert!(spline.eval(0.5).abs() < 1e-12);
        assert!((spline.eval(4.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn akima_two_points_is_linear() {
        let spline = AkimaSpline::new(array![1.0, 3.0], array![2.0, 6.0]).unwrap();
        assert!((spline.eval(2.0) - 4.0).abs() < 1e-12);
    }
}

/// Checks that a grid has at least two strictly increasing values and that the
/// value array matches it.
fn validate_grid(x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
    if x.len() < 2 {
        return Err(ShieldingError::Library(format!(
            "a table needs at least 2 points, got {}",
            x.len()
        )));
    }
    if x.len() != y.len() {
        return Err(ShieldingError::Library(format!(
            "table grid has {} points but {} values",
            x.len(),
            y.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ShieldingError::Library("table contains non-finite values".into()));
    }
    if x.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(ShieldingError::Library(
            "table grid must be strictly increasing".into(),
        ));
    }
    Ok(())
}

/// Index of the interval `[x[i], x[i+1]]` holding `q`, clamped to the table.
fn segment(x: &Array1<f64>, q: f64) -> usize {
    let n = x.len();
    let above = x
        .as_slice()
        .map(|s| s.partition_point(|v| *v <= q))
        .unwrap_or_else(|| x.iter().take_while(|v| **v <= q).count());
    above.saturating_sub(1).min(n - 2)
}

/// Linear interpolation of `log10(y)` against `log10(x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLogTable {
    x: Array1<f64>,
    y: Array1<f64>,
    log_x: Array1<f64>,
    log_y: Array1<f64>,
}

impl LogLogTable {
    /// Builds a table. Abscissae must be positive and strictly increasing and
    /// ordinates positive.
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        validate_grid(&x, &y)?;
        if x[0] <= 0.0 || y.iter().any(|v| *v <= 0.0) {
            return Err(ShieldingError::Library(
                "log-log tables need positive energies and coefficients".into(),
            ));
        }
        let log_x = x.mapv(f64::log10);
        let log_y = y.mapv(f64::log10);
        Ok(Self { x, y, log_x, log_y })
    }

    /// The closed interval covered by the table.
    pub fn bounds(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn contains(&self, q: f64) -> bool {
        let (lo, hi) = self.bounds();
        q >= lo && q <= hi
    }

    /// Interpolated value, or `None` outside the table.
    pub fn eval(&self, q: f64) -> Option<f64> {
        if !self.contains(q) {
            return None;
        }
        let i = segment(&self.x, q);
        if q == self.x[i] {
            return Some(self.y[i]);
        }
        if q == self.x[i + 1] {
            return Some(self.y[i + 1]);
        }
        let lq = q.log10();
        let slope = (self.log_y[i + 1] - self.log_y[i]) / (self.log_x[i + 1] - self.log_x[i]);
        Some(10f64.powf(self.log_y[i] + (lq - self.log_x[i]) * slope))
    }
}

/// Akima piecewise cubic Hermite interpolant.
///
/// Node derivatives are weighted averages of neighbouring secant slopes, with
/// weights given by the differences of the slopes on either side. Flat runs in
/// the data therefore stay flat and isolated jumps do not ring. Tables with
/// only two nodes fall back to a straight line.
#[derive(Debug, Clone, PartialEq)]
pub struct AkimaSpline {
    x: Array1<f64>,
    y: Array1<f64>,
    /// Node derivatives.
    t: Array1<f64>,
}

impl AkimaSpline {
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        validate_grid(&x, &y)?;
        let n = x.len();

        // secant slopes padded with two extrapolated slopes on each side
        let mut m = Array1::<f64>::zeros(n + 3);
        for i in 0..n - 1 {
            m[i + 2] = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
        }
        if n == 2 {
            let t = Array1::from_elem(2, m[2]);
            return Ok(Self { x, y, t });
        }
        m[1] = 2.0 * m[2] - m[3];
        m[0] = 2.0 * m[1] - m[2];
        m[n + 1] = 2.0 * m[n] - m[n - 1];
        m[n + 2] = 2.0 * m[n + 1] - m[n];

        let f1: Array1<f64> = (0..n).map(|i| (m[i + 3] - m[i + 2]).abs()).collect();
        let f2: Array1<f64> = (0..n).map(|i| (m[i + 1] - m[i]).abs()).collect();
        let f12 = &f1 + &f2;
        let f12_max = f12.fold(0.0f64, |acc, v| acc.max(*v));

        let t = (0..n)
            .map(|i| {
                if f12[i] > 1e-9 * f12_max {
                    (f1[i] * m[i + 1] + f2[i] * m[i + 2]) / f12[i]
                } else {
                    0.5 * (m[i + 3] + m[i])
                }
            })
            .collect();

        Ok(Self { x, y, t })
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Evaluates the spline. Queries outside the nodes use the end polynomial.
    pub fn eval(&self, q: f64) -> f64 {
        let i = segment(&self.x, q);
        let h = self.x[i + 1] - self.x[i];
        let m = (self.y[i + 1] - self.y[i]) / h;
        let (t0, t1) = (self.t[i], self.t[i + 1]);
        let p2 = (3.0 * m - 2.0 * t0 - t1) / h;
        let p3 = (t0 + t1 - 2.0 * m) / (h * h);
        let dx = q - self.x[i];
        self.y[i] + dx * (t0 + dx * (p2 + dx * p3))
    }
}
