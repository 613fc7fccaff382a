//! # Portfolio Types
//!
//! $$
//! \Sigma = \Sigma^\top \succeq 0, \qquad \sum_i w_i = 1, \ w_i \ge 0
//! $$
//!
//! Labelled covariance matrices and weight vectors shared across stages.

use ndarray::Array1;
use ndarray::Array2;

use crate::error::HrpError;
use crate::error::Result;

const SYMMETRY_TOL: f64 = 1e-10;

/// Annualized covariance matrix with asset labels for rows and columns.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceMatrix {
  assets: Vec<String>,
  values: Array2<f64>,
}

impl CovarianceMatrix {
  /// Validate shape, finiteness and symmetry.
  pub fn new(assets: Vec<String>, values: Array2<f64>) -> Result<Self> {
    let n = assets.len();
    if n == 0 {
      return Err(HrpError::validation("covariance matrix has no assets"));
    }
    if values.dim() != (n, n) {
      return Err(HrpError::validation(format!(
        "covariance matrix is {:?}, expected ({n}, {n})",
        values.dim()
      )));
    }
    if values.iter().any(|v| !v.is_finite()) {
      return Err(HrpError::data_quality("covariance matrix has non-finite entries"));
    }
    for i in 0..n {
      for j in (i + 1)..n {
        let scale = values[[i, j]].abs().max(values[[j, i]].abs()).max(1.0);
        if (values[[i, j]] - values[[j, i]]).abs() > SYMMETRY_TOL * scale {
          return Err(HrpError::validation(format!(
            "covariance matrix is not symmetric at ({i}, {j})"
          )));
        }
      }
    }

    Ok(Self { assets, values })
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.assets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }

  pub fn variance(&self, i: usize) -> f64 {
    self.values[[i, i]]
  }

  pub fn index_of(&self, asset: &str) -> Option<usize> {
    self.assets.iter().position(|a| a == asset)
  }
}

/// Long-only weights keyed by asset, in original asset order.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector {
  assets: Vec<String>,
  weights: Array1<f64>,
}

impl WeightVector {
  pub fn new(assets: Vec<String>, weights: Array1<f64>) -> Result<Self> {
    if assets.len() != weights.len() {
      return Err(HrpError::validation(format!(
        "{} assets but {} weights",
        assets.len(),
        weights.len()
      )));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
      return Err(HrpError::validation("weights must be finite and non-negative"));
    }

    Ok(Self { assets, weights })
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn values(&self) -> &Array1<f64> {
    &self.weights
  }

  pub fn get(&self, asset: &str) -> Option<f64> {
    self
      .assets
      .iter()
      .position(|a| a == asset)
      .map(|i| self.weights[i])
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
    self
      .assets
      .iter()
      .map(String::as_str)
      .zip(self.weights.iter().copied())
  }

  pub fn sum(&self) -> f64 {
    self.weights.sum()
  }

  pub fn len(&self) -> usize {
    self.assets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }
}
