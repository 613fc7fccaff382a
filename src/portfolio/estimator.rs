//! # Return / Covariance Estimator
//!
//! $$
//! \hat\mu_i = f\,\bar r_i, \qquad
//! \hat\Sigma_{ij} = \frac{f}{T-1}\sum_{t=1}^{T}(r_{t,i}-\bar r_i)(r_{t,j}-\bar r_j)
//! $$
//!
//! Annualized mean historical returns and sample covariance from a cleaned
//! price table. `f` is the sampling frequency (252 for daily bars).

use std::str::FromStr;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use ndarray::s;
use ndarray_stats::CorrelationExt;
use tracing::debug;

use crate::error::HrpError;
use crate::error::Result;
use super::prices::PriceTable;
use super::types::CovarianceMatrix;

/// Trading days per year.
pub const TRADING_DAYS: usize = 252;

/// Period return definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnKind {
  /// `p_t / p_{t-1} - 1`
  #[default]
  Simple,
  /// `ln(p_t / p_{t-1})`
  Log,
}

impl FromStr for ReturnKind {
  type Err = HrpError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "simple" | "pct" => Ok(Self::Simple),
      "log" => Ok(Self::Log),
      other => Err(HrpError::validation(format!("unknown return kind `{other}`"))),
    }
  }
}

/// Estimator settings.
#[derive(Clone, Debug)]
pub struct EstimatorConfig {
  /// Periods per year used to annualize mean and covariance.
  pub frequency: usize,
  /// Return definition fed into the covariance.
  pub returns: ReturnKind,
  /// Use the compound annual growth rate instead of the scaled arithmetic mean.
  pub compounding: bool,
}

impl Default for EstimatorConfig {
  fn default() -> Self {
    Self {
      frequency: TRADING_DAYS,
      returns: ReturnKind::Simple,
      compounding: false,
    }
  }
}

/// Annualized return and risk estimates for one price table.
#[derive(Clone, Debug)]
pub struct ReturnEstimates {
  /// Mean returns aligned with `covariance.assets()`.
  pub mean_returns: Array1<f64>,
  pub covariance: CovarianceMatrix,
}

/// Period returns with shape `(observations - 1, assets)`.
pub fn period_returns(prices: ArrayView2<'_, f64>, kind: ReturnKind) -> Array2<f64> {
  if prices.nrows() < 2 {
    return Array2::zeros((0, prices.ncols()));
  }

  let prev = prices.slice(s![..-1, ..]);
  let next = prices.slice(s![1.., ..]);
  let ratio = &next / &prev;

  match kind {
    ReturnKind::Simple => ratio - 1.0,
    ReturnKind::Log => ratio.mapv(f64::ln),
  }
}

/// Estimate annualized mean returns and sample covariance.
pub fn estimate(table: &PriceTable, config: &EstimatorConfig) -> Result<ReturnEstimates> {
  if table.n_assets() < 2 {
    return Err(HrpError::validation(format!(
      "need at least 2 assets, got {}",
      table.n_assets()
    )));
  }
  if table.n_observations() < 2 {
    return Err(HrpError::validation(format!(
      "need at least 2 observations, got {}",
      table.n_observations()
    )));
  }
  if table.has_gaps() {
    return Err(HrpError::data_quality("price table has missing values; clean it first"));
  }
  if config.frequency == 0 {
    return Err(HrpError::validation("sampling frequency must be positive"));
  }

  let prices = table.prices();
  let returns = period_returns(prices, config.returns);
  let n_returns = returns.nrows();

  if n_returns < 2 {
    return Err(HrpError::data_quality(
      "need at least 2 return observations for a sample covariance",
    ));
  }
  if let Some((t, i)) = returns.indexed_iter().find(|(_, r)| !r.is_finite()).map(|(ix, _)| ix) {
    return Err(HrpError::data_quality(format!(
      "non-finite return for `{}` at {}",
      table.assets()[i],
      table.dates()[t + 1]
    )));
  }

  let freq = config.frequency as f64;

  let mean_returns = if config.compounding {
    let first = prices.row(0);
    let last = prices.row(prices.nrows() - 1);
    let growth = &last / &first;
    growth.mapv(|g| g.powf(freq / n_returns as f64) - 1.0)
  } else {
    returns
      .mean_axis(Axis(0))
      .ok_or_else(|| HrpError::data_quality("no returns to average"))?
      * freq
  };

  if mean_returns.iter().any(|m| !m.is_finite()) {
    return Err(HrpError::data_quality("mean returns are not finite"));
  }

  let cov = returns
    .t()
    .cov(1.0)
    .map_err(|e| HrpError::data_quality(e.to_string()))?
    * freq;

  debug!(
    assets = table.n_assets(),
    returns = n_returns,
    kind = ?config.returns,
    "estimated mean returns and covariance"
  );

  Ok(ReturnEstimates {
    mean_returns,
    covariance: CovarianceMatrix::new(table.assets().to_vec(), cov)?,
  })
}
