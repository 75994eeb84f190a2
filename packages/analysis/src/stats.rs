//! Small statistical building blocks: Pearson correlation with a two-sided
//! p-value, simple least-squares regression, and column standardization.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::AnalysisError;

/// Minimum number of paired observations for correlation or regression.
pub const MIN_POINTS: usize = 2;

/// Pearson correlation coefficient and its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pearson {
    /// Coefficient, in `[-1, 1]`.
    pub coefficient: f64,
    /// Probability of a coefficient at least this extreme under the null
    /// hypothesis of no correlation, in `[0, 1]`.
    pub p_value: f64,
}

/// Ordinary least-squares fit of `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Coefficient of determination, in `[0, 1]`.
    pub r_squared: f64,
}

/// Centered sums of a validated pair of series.
///
/// Both the correlation and the regression line derive from these, so a
/// caller that needs both computes them once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedMoments {
    len: usize,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl PairedMoments {
    /// Validates `x` and `y` and computes their centered sums.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the series cannot be paired (see
    /// [`check_paired`]) or either series has zero variance.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, AnalysisError> {
        check_paired(x, y)?;

        let mean_x = mean(x);
        let mean_y = mean(y);
        let (sxx, syy, sxy) = x
            .iter()
            .zip(y)
            .fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), (&a, &b)| {
                let dx = a - mean_x;
                let dy = b - mean_y;
                (dx.mul_add(dx, sxx), dy.mul_add(dy, syy), dx.mul_add(dy, sxy))
            });

        if is_degenerate(sxx, x) || is_degenerate(syy, y) {
            return Err(AnalysisError::numerical(
                "constant series has zero variance",
            ));
        }

        Ok(Self {
            len: x.len(),
            mean_x,
            mean_y,
            sxx,
            syy,
            sxy,
        })
    }

    /// Pearson coefficient and its two-sided p-value.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NumericalFailure`] if the t distribution
    /// cannot be built.
    pub fn pearson(&self) -> Result<Pearson, AnalysisError> {
        let coefficient = (self.sxy / (self.sxx.sqrt() * self.syy.sqrt())).clamp(-1.0, 1.0);
        let p_value = two_sided_p_value(coefficient, self.len)?;

        Ok(Pearson {
            coefficient,
            p_value,
        })
    }

    /// Least-squares line of `y` on `x`.
    #[must_use]
    pub fn linear_fit(&self) -> LinearFit {
        let slope = self.sxy / self.sxx;
        let intercept = slope.mul_add(-self.mean_x, self.mean_y);
        let r_squared = (self.sxy * self.sxy / (self.sxx * self.syy)).clamp(0.0, 1.0);

        LinearFit {
            slope,
            intercept,
            r_squared,
        }
    }
}

/// Checks that two series can be paired: equal length, at least
/// [`MIN_POINTS`] points, all values finite.
///
/// # Errors
///
/// * [`AnalysisError::MismatchedLengths`] if the lengths differ
/// * [`AnalysisError::InsufficientData`] if there are fewer than two points
/// * [`AnalysisError::NumericalFailure`] if any value is NaN or infinite
pub fn check_paired(x: &[f64], y: &[f64]) -> Result<(), AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::MismatchedLengths {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() < MIN_POINTS {
        return Err(AnalysisError::InsufficientData {
            required: MIN_POINTS,
            actual: x.len(),
        });
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(AnalysisError::numerical("series contains non-finite values"));
    }
    Ok(())
}

/// Computes the Pearson correlation between `x` and `y`.
///
/// The p-value comes from a Student's t test with `n - 2` degrees of
/// freedom. With exactly two points any line fits perfectly and the p-value
/// is 1.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the series cannot be paired (see
/// [`check_paired`]) or either series has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Pearson, AnalysisError> {
    PairedMoments::new(x, y)?.pearson()
}

/// Fits `y` on `x` by ordinary least squares.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the series cannot be paired (see
/// [`check_paired`]) or either series has zero variance.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, AnalysisError> {
    Ok(PairedMoments::new(x, y)?.linear_fit())
}

#[allow(clippy::cast_precision_loss)]
fn two_sided_p_value(r: f64, len: usize) -> Result<f64, AnalysisError> {
    if len <= MIN_POINTS {
        return Ok(1.0);
    }

    let freedom = (len - MIN_POINTS) as f64;
    let denominator = r.mul_add(-r, 1.0);
    if denominator <= 0.0 {
        return Ok(0.0);
    }

    let t = r * (freedom / denominator).sqrt();
    let dist = StudentsT::new(0.0, 1.0, freedom)
        .map_err(|e| AnalysisError::numerical(format!("t distribution: {e}")))?;

    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}

/// Arithmetic mean. Returns 0 for an empty slice.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Rescales every column of `rows` to zero mean and unit (population)
/// variance.
///
/// Columns without variance become all zeros.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn standardize<const N: usize>(rows: &[[f64; N]]) -> Vec<[f64; N]> {
    let mut scaled = rows.to_vec();
    if rows.is_empty() {
        return scaled;
    }

    let n = rows.len() as f64;
    for col in 0..N {
        let column: Vec<f64> = rows.iter().map(|row| row[col]).collect();
        let mu = mean(&column);
        let ss = column.iter().map(|v| (v - mu).powi(2)).sum::<f64>();

        if is_degenerate(ss, &column) {
            for row in &mut scaled {
                row[col] = 0.0;
            }
            continue;
        }

        let sd = (ss / n).sqrt();
        for row in &mut scaled {
            row[col] = (row[col] - mu) / sd;
        }
    }

    scaled
}

/// A series has no variance when all its values are equal, or when every
/// deviation from the mean is within about one ulp of the values themselves.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn is_degenerate(centered_ss: f64, values: &[f64]) -> bool {
    if values.windows(2).all(|w| w[0] == w[1]) {
        return true;
    }
    let scale = values.iter().map(|v| v * v).sum::<f64>();
    centered_ss <= values.len() as f64 * f64::EPSILON.powi(2) * scale
}
