//! # Portfolio Metrics
//!
//! $$
//! \mathbb E[R_p] = \mathbf w^\top \mu, \qquad \sigma_p = \sqrt{\mathbf w^\top \Sigma \mathbf w}
//! $$
//!
//! Expected return, volatility and Sharpe ratio of a weight vector.

use impl_new_derive::ImplNew;
use ndarray::Array1;

use crate::error::HrpError;
use crate::error::Result;
use super::types::CovarianceMatrix;
use super::types::WeightVector;

/// Model performance of a weight vector.
#[derive(ImplNew, Clone, Copy, Debug, Default, PartialEq)]
pub struct PortfolioPerformance {
  /// Expected annual return.
  pub expected_return: f64,
  /// Annual volatility.
  pub volatility: f64,
  /// `(expected_return - risk_free) / volatility`, zero for a riskless book.
  pub sharpe: f64,
}

/// Expected return, volatility and Sharpe ratio.
///
/// `mean_returns` is aligned with `cov.assets()`; `weights` may list the same
/// assets in any order.
pub fn portfolio_performance(
  weights: &WeightVector,
  mean_returns: &Array1<f64>,
  cov: &CovarianceMatrix,
  risk_free: f64,
) -> Result<PortfolioPerformance> {
  let n = cov.len();
  if mean_returns.len() != n {
    return Err(HrpError::validation(format!(
      "{} mean returns for {n} covariance assets",
      mean_returns.len()
    )));
  }
  if weights.len() != n {
    return Err(HrpError::validation(format!(
      "{} weights for {n} covariance assets",
      weights.len()
    )));
  }

  let mut w = Array1::<f64>::zeros(n);
  let mut filled = vec![false; n];
  for (asset, weight) in weights.iter() {
    let i = cov
      .index_of(asset)
      .ok_or_else(|| HrpError::validation(format!("asset `{asset}` missing from covariance")))?;
    if filled[i] {
      return Err(HrpError::validation(format!("asset `{asset}` weighted twice")));
    }
    filled[i] = true;
    w[i] = weight;
  }

  let expected_return = w.dot(mean_returns);
  let volatility = w.dot(&cov.values().dot(&w)).max(0.0).sqrt();
  let sharpe = if volatility > 1e-15 {
    (expected_return - risk_free) / volatility
  } else {
    0.0
  };

  Ok(PortfolioPerformance::new(expected_return, volatility, sharpe))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  fn names(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn single_asset_volatility_is_its_standard_deviation() {
    let cov = CovarianceMatrix::new(names(&["A"]), array![[0.0625]]).unwrap();
    let w = WeightVector::new(names(&["A"]), array![1.0]).unwrap();
    let perf = portfolio_performance(&w, &array![0.08], &cov, 0.0).unwrap();

    assert_relative_eq!(perf.volatility, 0.25, epsilon = 1e-12);
    assert_relative_eq!(perf.expected_return, 0.08, epsilon = 1e-12);
    assert_relative_eq!(perf.sharpe, 0.32, epsilon = 1e-12);
  }

  #[test]
  fn weights_are_matched_by_label() {
    let cov =
      CovarianceMatrix::new(names(&["A", "B"]), array![[0.04, 0.01], [0.01, 0.09]]).unwrap();
    let w = WeightVector::new(names(&["B", "A"]), array![0.25, 0.75]).unwrap();
    let perf = portfolio_performance(&w, &array![0.1, 0.2], &cov, 0.02).unwrap();

    let var: f64 = 0.75 * 0.75 * 0.04 + 0.25 * 0.25 * 0.09 + 2.0 * 0.75 * 0.25 * 0.01;
    assert_relative_eq!(perf.expected_return, 0.125, epsilon = 1e-12);
    assert_relative_eq!(perf.volatility, var.sqrt(), epsilon = 1e-12);
  }

  #[test]
  fn mismatched_asset_sets_fail_validation() {
    let cov =
      CovarianceMatrix::new(names(&["A", "B"]), array![[0.04, 0.0], [0.0, 0.09]]).unwrap();
    let w = WeightVector::new(names(&["A", "C"]), array![0.5, 0.5]).unwrap();
    let err = portfolio_performance(&w, &array![0.1, 0.2], &cov, 0.0).unwrap_err();
    assert!(matches!(err, HrpError::Validation(_)));

    let short = WeightVector::new(names(&["A"]), array![1.0]).unwrap();
    assert!(portfolio_performance(&short, &array![0.1, 0.2], &cov, 0.0).is_err());
  }
}
