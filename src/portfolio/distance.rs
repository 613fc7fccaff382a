//! # Correlation Distance
//!
//! $$
//! \rho_{ij} = \frac{\Sigma_{ij}}{\sqrt{\Sigma_{ii}\Sigma_{jj}}}, \qquad
//! d_{ij} = \sqrt{\tfrac12 (1-\rho_{ij})}
//! $$
//!
//! Maps a covariance matrix to a bounded, zero-diagonal distance matrix.

use ndarray::Array2;

use crate::error::HrpError;
use crate::error::Result;
use super::types::CovarianceMatrix;

/// Correlation matrix from covariance, clipped to `[-1, 1]`.
///
/// Assets with zero variance get zero off-diagonal correlation. Only the
/// upper triangle is read, so the result is exactly symmetric.
pub fn correlation_from_covariance(cov: &CovarianceMatrix) -> Array2<f64> {
  let n = cov.len();
  let sd: Vec<f64> = (0..n).map(|i| cov.variance(i).max(0.0).sqrt()).collect();

  Array2::from_shape_fn((n, n), |(i, j)| {
    let (i, j) = (i.min(j), i.max(j));
    let denom = sd[i] * sd[j];
    if i == j {
      1.0
    } else if denom > 1e-15 {
      (cov.values()[[i, j]] / denom).clamp(-1.0, 1.0)
    } else {
      0.0
    }
  })
}

/// Symmetric, zero-diagonal dissimilarities between assets.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
  values: Array2<f64>,
}

impl DistanceMatrix {
  /// Wrap an arbitrary dissimilarity matrix.
  ///
  /// The matrix must be square, finite, non-negative and symmetric; the
  /// diagonal is forced to zero.
  pub fn new(mut values: Array2<f64>) -> Result<Self> {
    let (rows, cols) = values.dim();
    if rows != cols {
      return Err(HrpError::validation(format!(
        "distance matrix must be square, got ({rows}, {cols})"
      )));
    }
    if values.iter().any(|d| !d.is_finite() || *d < 0.0) {
      return Err(HrpError::validation("distances must be finite and non-negative"));
    }
    for i in 0..rows {
      for j in (i + 1)..rows {
        if (values[[i, j]] - values[[j, i]]).abs() > 1e-12 {
          return Err(HrpError::validation(format!(
            "distance matrix is not symmetric at ({i}, {j})"
          )));
        }
      }
      values[[i, i]] = 0.0;
    }

    Ok(Self { values })
  }

  /// `sqrt(0.5 * (1 - corr))` over the upper triangle, mirrored below.
  pub fn from_correlation(corr: &Array2<f64>) -> Result<Self> {
    let (rows, cols) = corr.dim();
    if rows != cols {
      return Err(HrpError::validation(format!(
        "correlation matrix must be square, got ({rows}, {cols})"
      )));
    }

    Self::new(Array2::from_shape_fn((rows, cols), |(i, j)| {
      let c = corr[[i.min(j), i.max(j)]];
      (0.5 * (1.0 - c.clamp(-1.0, 1.0))).max(0.0).sqrt()
    }))
  }

  pub fn from_covariance(cov: &CovarianceMatrix) -> Result<Self> {
    Self::from_correlation(&correlation_from_covariance(cov))
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.nrows()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn get(&self, i: usize, j: usize) -> f64 {
    self.values[[i, j]]
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  fn cov(values: Array2<f64>) -> CovarianceMatrix {
    let assets = (0..values.nrows()).map(|i| format!("X{i}")).collect();
    CovarianceMatrix::new(assets, values).unwrap()
  }

  #[test]
  fn distance_maps_correlation_extremes() {
    let c = cov(array![[1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]]);
    let d = DistanceMatrix::from_covariance(&c).unwrap();

    assert_abs_diff_eq!(d.get(0, 1), 0.0, epsilon = 1e-12);
    assert_relative_eq!(d.get(0, 2), 1.0, epsilon = 1e-12);
    for i in 0..3 {
      assert_eq!(d.get(i, i), 0.0);
    }
  }

  #[test]
  fn correlation_is_clipped_against_rounding() {
    let c = cov(array![[0.04, 0.0400000001], [0.0400000001, 0.04]]);
    let corr = correlation_from_covariance(&c);
    assert!(corr[[0, 1]] <= 1.0);

    let uncorrelated = cov(array![[0.04, 0.0], [0.0, 0.01]]);
    let d = DistanceMatrix::from_covariance(&uncorrelated).unwrap();
    assert_relative_eq!(d.get(0, 1), 0.5_f64.sqrt(), epsilon = 1e-12);
  }

  #[test]
  fn near_collinear_covariance_within_tolerance_gives_symmetric_distances() {
    // Symmetric only to 1e-12, with the first two assets almost collinear.
    let c = cov(array![
      [0.04, 0.04 - 1e-12, 0.0],
      [0.04, 0.04, 0.0],
      [0.0, 0.0, 0.01]
    ]);
    let d = DistanceMatrix::from_covariance(&c).unwrap();

    assert_eq!(d.get(0, 1), d.get(1, 0));
    assert!(d.get(0, 1) < 1e-5);
  }

  #[test]
  fn new_rejects_negative_distances() {
    assert!(DistanceMatrix::new(array![[0.0, -0.1], [-0.1, 0.0]]).is_err());
    assert!(DistanceMatrix::new(array![[0.0, 0.1, 0.2]]).is_err());
  }
}
