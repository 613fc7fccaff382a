//! # HRP Engine
//!
//! $$
//! P \xrightarrow{\ \hat\mu,\hat\Sigma\ } d \xrightarrow{\ \text{link}\ } \mathcal T
//! \xrightarrow{\ \pi\ } \mathbf w \to (\mathbb E[R_p], \sigma_p),\ q
//! $$
//!
//! High-level orchestration of the HRP pipeline. Any failing stage ends the
//! run with that stage's error.

use std::collections::HashMap;

use tracing::debug;
use tracing::info;

use crate::config::RunConfig;
use crate::error::HrpError;
use crate::error::Result;
use crate::market_data::MarketDataProvider;
use super::allocation::Allocation;
use super::allocation::ShareRounding;
use super::allocation::allocate_capital;
use super::bisection::BisectionSplit;
use super::bisection::ensure_positive_variances;
use super::bisection::recursive_bisection;
use super::distance::DistanceMatrix;
use super::estimator::EstimatorConfig;
use super::estimator::ReturnEstimates;
use super::estimator::estimate;
use super::linkage::LinkageMethod;
use super::linkage::LinkageTree;
use super::linkage::cluster;
use super::metrics::PortfolioPerformance;
use super::metrics::portfolio_performance;
use super::prices::PriceTable;
use super::quasi_diag::AssetOrdering;
use super::quasi_diag::quasi_diagonalize;
use super::types::CovarianceMatrix;
use super::types::WeightVector;

/// Runtime configuration for [`HrpEngine`].
#[derive(Clone, Debug, Default)]
pub struct HrpEngineConfig {
  /// Return and covariance estimation.
  pub estimator: EstimatorConfig,
  /// Inter-cluster distance rule.
  pub linkage: LinkageMethod,
  /// Where recursive bisection cuts each slice.
  pub split: BisectionSplit,
  /// Risk-free rate used for the Sharpe ratio.
  pub risk_free: f64,
  /// Bisect independent halves on the rayon pool.
  pub parallel: bool,
  /// Whole or fractional share counts.
  pub rounding: ShareRounding,
}

/// Weights and the clustering that produced them.
#[derive(Clone, Debug)]
pub struct HrpWeights {
  /// Dendrogram over the covariance's assets.
  pub tree: LinkageTree,
  /// Quasi-diagonal leaf order of `tree`.
  pub ordering: AssetOrdering,
  /// Weights in the covariance's asset order, summing to one.
  pub weights: WeightVector,
}

/// Everything derived from one price table.
#[derive(Clone, Debug)]
pub struct HrpPortfolio {
  /// Annualized mean returns and covariance.
  pub estimates: ReturnEstimates,
  pub tree: LinkageTree,
  pub ordering: AssetOrdering,
  pub weights: WeightVector,
  /// Expected return, volatility and Sharpe ratio of `weights`.
  pub performance: PortfolioPerformance,
}

/// A full run: portfolio, the prices it was bought at, and the allocation.
#[derive(Clone, Debug)]
pub struct HrpRun {
  pub portfolio: HrpPortfolio,
  /// Latest price per ticker as returned by the provider.
  pub latest_prices: HashMap<String, f64>,
  pub allocation: Allocation,
}

/// Single entry-point engine for the HRP pipeline.
#[derive(Clone, Debug, Default)]
pub struct HrpEngine {
  config: HrpEngineConfig,
}

impl HrpEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: HrpEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &HrpEngineConfig {
    &self.config
  }

  /// Cluster, quasi-diagonalize and bisect a covariance matrix.
  pub fn optimize(&self, cov: &CovarianceMatrix) -> Result<HrpWeights> {
    ensure_positive_variances(cov)?;

    let dist = DistanceMatrix::from_covariance(cov)?;
    let tree = cluster(&dist, self.config.linkage)?;
    let ordering = quasi_diagonalize(&tree);
    let weights = recursive_bisection(
      &tree,
      &ordering,
      cov,
      self.config.split,
      self.config.parallel,
    )?;

    debug!(
      assets = cov.len(),
      order = ?ordering.labels(cov.assets()),
      split = %self.config.split,
      "computed hrp weights"
    );

    Ok(HrpWeights {
      tree,
      ordering,
      weights,
    })
  }

  /// Estimate, optimize and score a portfolio from historical prices.
  ///
  /// The table is cleaned (forward-fill, then drop gaps) before estimation.
  pub fn run(&self, prices: &PriceTable) -> Result<HrpPortfolio> {
    let clean = prices.clean()?;
    let estimates = estimate(&clean, &self.config.estimator)?;
    let HrpWeights {
      tree,
      ordering,
      weights,
    } = self.optimize(&estimates.covariance)?;
    let performance = portfolio_performance(
      &weights,
      &estimates.mean_returns,
      &estimates.covariance,
      self.config.risk_free,
    )?;

    info!(
      assets = weights.len(),
      observations = clean.n_observations(),
      expected_return = performance.expected_return,
      volatility = performance.volatility,
      "hrp portfolio built"
    );

    Ok(HrpPortfolio {
      estimates,
      tree,
      ordering,
      weights,
      performance,
    })
  }

  /// Convert portfolio weights into share counts.
  pub fn allocate(
    &self,
    portfolio: &HrpPortfolio,
    capital: f64,
    latest_prices: &HashMap<String, f64>,
  ) -> Result<Allocation> {
    allocate_capital(
      &portfolio.weights,
      capital,
      latest_prices,
      self.config.rounding,
    )
  }

  /// Fetch prices through `provider` and run the whole pipeline.
  pub fn run_with<P: MarketDataProvider>(&self, provider: &P, run: &RunConfig) -> Result<HrpRun> {
    let history = provider
      .historical_prices(&run.tickers, run.start, run.end)
      .map_err(HrpError::ExternalIo)?;
    if history.is_empty() {
      return Err(HrpError::data_quality(
        "no data available for the provided tickers and date range",
      ));
    }

    let portfolio = self.run(&history)?;

    let latest_prices = provider
      .latest_prices(&run.tickers)
      .map_err(HrpError::ExternalIo)?;
    let allocation = self.allocate(&portfolio, run.capital, &latest_prices)?;

    Ok(HrpRun {
      portfolio,
      latest_prices,
      allocation,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use chrono::NaiveDate;
  use ndarray::array;

  use crate::market_data::InMemoryProvider;
  use super::*;

  fn prices() -> PriceTable {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    // A and B co-move, C is steadier and unrelated.
    let a = [100.0, 102.0, 99.0, 103.0, 101.0, 104.0, 100.0, 105.0];
    let b = [50.0, 51.2, 49.4, 51.6, 50.4, 52.1, 49.9, 52.6];
    let c = [20.0, 20.1, 20.15, 20.1, 20.2, 20.2, 20.25, 20.3];
    PriceTable::new(
      vec!["A".into(), "B".into(), "C".into()],
      (0..a.len())
        .map(|t| {
          (
            start + chrono::Days::new(t as u64),
            vec![Some(a[t]), Some(b[t]), Some(c[t])],
          )
        })
        .collect(),
    )
    .unwrap()
  }

  #[test]
  fn run_produces_normalized_long_only_weights() {
    let engine = HrpEngine::default();
    let portfolio = engine.run(&prices()).unwrap();

    assert_relative_eq!(portfolio.weights.sum(), 1.0, epsilon = 1e-9);
    assert!(portfolio.weights.values().iter().all(|w| *w >= 0.0));
    assert_eq!(portfolio.weights.assets(), &["A", "B", "C"]);
    assert!(portfolio.weights.get("C").unwrap() > portfolio.weights.get("A").unwrap());
    assert!(portfolio.performance.volatility > 0.0);

    let mut seen = portfolio.ordering.indices().to_vec();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2]);
  }

  #[test]
  fn optimize_matches_two_asset_inverse_variance() {
    let cov =
      CovarianceMatrix::new(vec!["X".into(), "Y".into()], array![[0.04, 0.0], [0.0, 0.01]])
        .unwrap();
    let w = HrpEngine::default().optimize(&cov).unwrap().weights;

    assert_relative_eq!(w.get("X").unwrap(), 0.2, epsilon = 1e-12);
    assert_relative_eq!(w.get("Y").unwrap(), 0.8, epsilon = 1e-12);
  }

  #[test]
  fn optimize_accepts_covariance_symmetric_within_tolerance() {
    let cov = CovarianceMatrix::new(
      vec!["X".into(), "Y".into(), "Z".into()],
      array![[0.04, 0.04 - 1e-12, 0.0], [0.04, 0.04, 0.0], [0.0, 0.0, 0.01]],
    )
    .unwrap();
    let w = HrpEngine::default().optimize(&cov).unwrap().weights;

    assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
    assert!(w.values().iter().all(|x| *x >= 0.0));
  }

  #[test]
  fn degenerate_covariance_fails_before_weights() {
    let cov =
      CovarianceMatrix::new(vec!["X".into(), "Y".into()], array![[0.04, 0.0], [0.0, -0.01]])
        .unwrap();
    assert!(matches!(
      HrpEngine::default().optimize(&cov),
      Err(HrpError::DataQuality(_))
    ));
  }

  #[test]
  fn constant_price_series_is_a_data_quality_error() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let table = PriceTable::new(
      vec!["A".into(), "FLAT".into()],
      (0..5)
        .map(|t| {
          (
            start + chrono::Days::new(t),
            vec![Some(10.0 + t as f64), Some(7.0)],
          )
        })
        .collect(),
    )
    .unwrap();

    assert!(matches!(
      HrpEngine::default().run(&table),
      Err(HrpError::DataQuality(_))
    ));
  }

  #[test]
  fn run_with_provider_allocates_capital() {
    let provider = InMemoryProvider::from_history(prices());
    let run = RunConfig::parse("a, b, c", "2024-01-01", "2024-02-01", "10000").unwrap();
    let result = HrpEngine::default().run_with(&provider, &run).unwrap();

    let spent: f64 = result
      .allocation
      .shares
      .iter()
      .map(|(a, q)| q * result.latest_prices[a])
      .sum();
    assert_relative_eq!(spent + result.allocation.remaining_cash, 10_000.0, epsilon = 1e-6);
    assert_relative_eq!(result.allocation.remaining_cash, 0.0, epsilon = 1e-6);
  }

  #[test]
  fn provider_failure_surfaces_as_external_io() {
    let provider = InMemoryProvider::from_history(prices());
    let run = RunConfig::parse("ZZZ", "2024-01-01", "2024-02-01", "10000").unwrap();

    assert!(matches!(
      HrpEngine::default().run_with(&provider, &run),
      Err(HrpError::ExternalIo(_))
    ));
  }
}
