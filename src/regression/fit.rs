use super::error::FitError;
use super::kernel::Kernel;

/// Rows whose relative kernel weight is at or below this do not count as
/// support for the local fit.
pub const MIN_SUPPORT_WEIGHT: f64 = 1e-12;

/// Relative size below which a diagonal entry of R marks the system as
/// rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

// ---------------------------------------------------------------------------
// LocalFit – the polynomial fitted around one query point
// ---------------------------------------------------------------------------

/// A polynomial in `t = (x - center) / scale` fitted around `center`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFit {
    pub center: f64,
    pub scale: f64,
    /// Degree actually used; may be lower than the requested order.
    pub degree: usize,
    /// Coefficients of `1, t, t², …`.
    pub coefficients: Vec<f64>,
}

impl LocalFit {
    /// The regression estimate at `center`.
    pub fn value(&self) -> f64 {
        self.coefficients[0]
    }

    /// Evaluate the local polynomial at an arbitrary `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

// ---------------------------------------------------------------------------
// LocalRegression – kernel + bandwidth + order
// ---------------------------------------------------------------------------

/// Kernel-weighted local polynomial regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalRegression {
    kernel: Kernel,
    bandwidth: f64,
    order: usize,
}

impl LocalRegression {
    pub fn new(kernel: Kernel, bandwidth: f64, order: usize) -> Result<Self, FitError> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(FitError::InvalidBandwidth(bandwidth));
        }
        Ok(Self {
            kernel,
            bandwidth,
            order,
        })
    }

    /// Fit the local polynomial centred at `x0`.
    pub fn fit_at(&self, xs: &[f64], ys: &[f64], x0: f64) -> Result<LocalFit, FitError> {
        validate_inputs(xs, ys)?;
        self.fit_validated(xs, ys, x0)
    }

    /// Regression estimate at `x0`.
    pub fn predict(&self, xs: &[f64], ys: &[f64], x0: f64) -> Result<f64, FitError> {
        self.fit_at(xs, ys, x0).map(|fit| fit.value())
    }

    /// Regression estimates at every point of `grid`.
    ///
    /// A query with no usable support (a compact kernel window with no
    /// training point in it) yields `None`; the other queries are still
    /// fitted. Invalid training data fails the whole call.
    pub fn predict_many(
        &self,
        xs: &[f64],
        ys: &[f64],
        grid: &[f64],
    ) -> Result<Vec<Option<f64>>, FitError> {
        validate_inputs(xs, ys)?;
        grid.iter()
            .map(|&x0| match self.fit_validated(xs, ys, x0) {
                Ok(fit) => Ok(Some(fit.value())),
                Err(e) if e.is_local() => Ok(None),
                Err(e) => Err(e),
            })
            .collect()
    }

    fn fit_validated(&self, xs: &[f64], ys: &[f64], x0: f64) -> Result<LocalFit, FitError> {
        if !x0.is_finite() {
            return Err(FitError::NonFinite(format!("query x = {x0}")));
        }
        let weights = self.kernel.weights(xs, x0, self.bandwidth)?;
        fit_weighted(xs, ys, &weights, x0, self.order)
    }
}

/// Nadaraya-Watson estimate: the kernel-weighted average of `ys` at `x0`.
pub fn nadaraya_watson(
    kernel: Kernel,
    bandwidth: f64,
    xs: &[f64],
    ys: &[f64],
    x0: f64,
) -> Result<f64, FitError> {
    validate_inputs(xs, ys)?;
    let weights = kernel.weights(xs, x0, bandwidth)?;
    let (num, den) = weights
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(num, den), (&w, &y)| (num + w * y, den + w));
    Ok(num / den)
}

/// Check that the training arrays are non-empty, paired, and finite.
pub fn validate_inputs(xs: &[f64], ys: &[f64]) -> Result<(), FitError> {
    if xs.is_empty() {
        return Err(FitError::EmptyInput);
    }
    if xs.len() != ys.len() {
        return Err(FitError::MismatchedInputs {
            x_len: xs.len(),
            y_len: ys.len(),
        });
    }
    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if !x.is_finite() {
            return Err(FitError::NonFinite(format!("x[{i}] = {x}")));
        }
        if !y.is_finite() {
            return Err(FitError::NonFinite(format!("y[{i}] = {y}")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Weighted least squares
// ---------------------------------------------------------------------------

fn fit_weighted(
    xs: &[f64],
    ys: &[f64],
    weights: &[f64],
    x0: f64,
    order: usize,
) -> Result<LocalFit, FitError> {
    let support: Vec<usize> = (0..xs.len())
        .filter(|&i| weights[i] > MIN_SUPPORT_WEIGHT)
        .collect();
    if support.is_empty() {
        return Err(FitError::Singular { x0 });
    }

    let mut distinct: Vec<f64> = support.iter().map(|&i| xs[i]).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    let scale = support
        .iter()
        .map(|&i| (xs[i] - x0).abs())
        .fold(0.0_f64, f64::max);
    let scale = if scale > 0.0 { scale } else { 1.0 };

    let rows: Vec<(f64, f64, f64)> = support
        .iter()
        .map(|&i| ((xs[i] - x0) / scale, ys[i], weights[i].sqrt()))
        .collect();

    let mut degree = order.min(distinct.len() - 1);
    loop {
        match solve_least_squares(&rows, degree) {
            Some(coefficients) => {
                return Ok(LocalFit {
                    center: x0,
                    scale,
                    degree,
                    coefficients,
                });
            }
            None if degree > 0 => {
                log::debug!("rank deficient at x = {x0}, lowering degree from {degree}");
                degree -= 1;
            }
            None => return Err(FitError::Singular { x0 }),
        }
    }
}

/// Solve `min ‖diag(s)(V β - y)‖` for a Vandermonde `V` of the given degree
/// with Householder QR. `rows` holds `(t, y, sqrt(w))`. Returns `None` when
/// the system is numerically rank deficient.
fn solve_least_squares(rows: &[(f64, f64, f64)], degree: usize) -> Option<Vec<f64>> {
    let p = degree + 1;
    if rows.len() < p {
        return None;
    }

    // Column-major copy of the scaled design matrix.
    let mut a: Vec<Vec<f64>> = (0..p)
        .map(|j| {
            rows.iter()
                .map(|&(t, _, s)| s * t.powi(j as i32))
                .collect()
        })
        .collect();
    let mut b: Vec<f64> = rows.iter().map(|&(_, y, s)| s * y).collect();
    let mut diag = vec![0.0; p];

    for k in 0..p {
        let norm = a[k][k..].iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if a[k][k] > 0.0 { -norm } else { norm };
        diag[k] = alpha;

        let mut v = a[k][k..].to_vec();
        v[0] -= alpha;
        let v_norm2: f64 = v.iter().map(|x| x * x).sum();
        if v_norm2 == 0.0 {
            continue;
        }

        for col in a.iter_mut().skip(k + 1) {
            reflect(&v, v_norm2, &mut col[k..]);
        }
        reflect(&v, v_norm2, &mut b[k..]);
    }

    let max_diag = diag.iter().map(|d| d.abs()).fold(0.0_f64, f64::max);
    if diag.iter().any(|d| d.abs() <= RANK_TOLERANCE * max_diag) {
        return None;
    }

    // Back substitution; R[k][j] for j > k lives in a[j][k].
    let mut beta = vec![0.0; p];
    for k in (0..p).rev() {
        let tail: f64 = ((k + 1)..p).map(|j| a[j][k] * beta[j]).sum();
        beta[k] = (b[k] - tail) / diag[k];
    }
    Some(beta)
}

/// Apply the Householder reflection `I - 2 v vᵀ / ‖v‖²` to `target`.
fn reflect(v: &[f64], v_norm2: f64, target: &mut [f64]) {
    let dot: f64 = v.iter().zip(target.iter()).map(|(vi, ti)| vi * ti).sum();
    let f = 2.0 * dot / v_norm2;
    for (ti, vi) in target.iter_mut().zip(v) {
        *ti -= f * vi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} vs {b} (tol {tol})");
    }

    #[test]
    fn order_zero_is_weighted_average() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 2.0, 5.0];
        let reg = LocalRegression::new(Kernel::Gaussian, 0.8, 0).unwrap();
        for x0 in [-1.0, 0.5, 1.7, 4.0] {
            let expected = nadaraya_watson(Kernel::Gaussian, 0.8, &xs, &ys, x0).unwrap();
            assert_close(reg.predict(&xs, &ys, x0).unwrap(), expected, 1e-12);
        }
    }

    #[test]
    fn local_linear_reproduces_a_line() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64 * 0.3).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x - 1.0).collect();
        let reg = LocalRegression::new(Kernel::Gaussian, 0.5, 1).unwrap();
        for x0 in [-2.0, 0.0, 1.1, 2.7, 5.0] {
            assert_close(reg.predict(&xs, &ys, x0).unwrap(), 2.0 * x0 - 1.0, 1e-9);
        }
    }

    #[test]
    fn local_quadratic_reproduces_a_parabola() {
        let xs: Vec<f64> = (0..15).map(|i| -1.0 + i as f64 * 0.15).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.5 * x * x - x + 3.0).collect();
        let reg = LocalRegression::new(Kernel::Tricube, 0.6, 2).unwrap();
        for x0 in [-0.9, 0.0, 0.33, 1.0] {
            let expected = 0.5 * x0 * x0 - x0 + 3.0;
            assert_close(reg.predict(&xs, &ys, x0).unwrap(), expected, 1e-9);
        }
    }

    #[test]
    fn high_order_interpolates_training_points() {
        let xs = [0.0, 0.4, 1.1, 1.5, 2.3];
        let ys = [1.0, -0.5, 0.7, 2.0, 0.1];
        for order in [4, 7] {
            let reg = LocalRegression::new(Kernel::Gaussian, 1.0, order).unwrap();
            for (&x, &y) in xs.iter().zip(&ys) {
                assert_close(reg.predict(&xs, &ys, x).unwrap(), y, 1e-8);
            }
        }
    }

    #[test]
    fn vanishing_bandwidth_returns_training_values() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [4.0, -1.0, 2.5, 0.0];
        for order in [0, 1, 3] {
            let reg = LocalRegression::new(Kernel::Gaussian, 1e-3, order).unwrap();
            for (&x, &y) in xs.iter().zip(&ys) {
                assert_close(reg.predict(&xs, &ys, x).unwrap(), y, 1e-12);
            }
        }
    }

    #[test]
    fn degree_is_capped_by_distinct_support() {
        let xs = [1.0, 1.0, 1.0];
        let ys = [1.0, 2.0, 3.0];
        let reg = LocalRegression::new(Kernel::Gaussian, 1.0, 2).unwrap();
        let fit = reg.fit_at(&xs, &ys, 0.5).unwrap();
        assert_eq!(fit.degree, 0);
        assert_close(fit.value(), 2.0, 1e-12);
    }

    #[test]
    fn local_polynomial_evaluates_to_value_at_center() {
        let xs = [0.0, 0.5, 1.0, 1.5, 2.0];
        let ys = [0.0, 0.4, 0.9, 1.0, 0.8];
        let reg = LocalRegression::new(Kernel::Gaussian, 0.7, 2).unwrap();
        let fit = reg.fit_at(&xs, &ys, 0.8).unwrap();
        assert_close(fit.evaluate(0.8), fit.value(), 1e-14);
        assert_eq!(fit.coefficients.len(), 3);
    }

    #[test]
    fn predict_many_matches_predict() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 1.0, 0.0, 1.0, 0.0];
        let reg = LocalRegression::new(Kernel::Epanechnikov, 1.5, 1).unwrap();
        let grid = [0.0, 0.5, 2.2, 4.0];
        let many = reg.predict_many(&xs, &ys, &grid).unwrap();
        for (&x0, &v) in grid.iter().zip(&many) {
            assert_eq!(v, Some(reg.predict(&xs, &ys, x0).unwrap()));
        }
    }

    #[test]
    fn predict_many_leaves_unsupported_queries_empty() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [1.0, 2.0, 3.0];
        let reg = LocalRegression::new(Kernel::Epanechnikov, 0.5, 1).unwrap();
        let many = reg.predict_many(&xs, &ys, &[-3.0, 1.0, 5.0]).unwrap();
        assert_eq!(many[0], None);
        assert_close(many[1].unwrap(), 2.0, 1e-12);
        assert_eq!(many[2], None);

        assert_eq!(
            reg.predict_many(&[0.0, 1.0], &[0.0], &[0.5]),
            Err(FitError::MismatchedInputs { x_len: 2, y_len: 1 })
        );
    }

    #[test]
    fn invalid_inputs_are_reported() {
        let reg = LocalRegression::new(Kernel::Gaussian, 1.0, 1).unwrap();
        assert_eq!(reg.predict(&[], &[], 0.0), Err(FitError::EmptyInput));
        assert_eq!(
            reg.predict(&[0.0, 1.0], &[0.0], 0.0),
            Err(FitError::MismatchedInputs { x_len: 2, y_len: 1 })
        );
        assert!(matches!(
            reg.predict(&[0.0, f64::NAN], &[0.0, 1.0], 0.0),
            Err(FitError::NonFinite(_))
        ));
        assert!(matches!(
            reg.predict(&[0.0, 1.0], &[0.0, 1.0], f64::INFINITY),
            Err(FitError::NonFinite(_))
        ));
        assert!(matches!(
            LocalRegression::new(Kernel::Gaussian, 0.0, 1),
            Err(FitError::InvalidBandwidth(_))
        ));
    }

    #[test]
    fn compact_kernel_outside_data_has_no_support() {
        let reg = LocalRegression::new(Kernel::Uniform, 0.5, 1).unwrap();
        let err = reg.predict(&[0.0, 1.0], &[0.0, 1.0], 10.0).unwrap_err();
        assert!(matches!(err, FitError::NoSupport { .. }));
    }
}
