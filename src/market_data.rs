//! # Market Data
//!
//! $$
//! \text{fetch} : (\{\text{ticker}\}, [t_0, t_1)) \to P_{t,i}
//! $$
//!
//! Collaborators that supply historical and latest prices. Failures are
//! reported as `anyhow` errors and never retried here.

use std::collections::HashMap;

use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;

use crate::portfolio::PriceTable;

#[cfg(feature = "yahoo")]
pub mod yahoo;

/// Source of adjusted closing prices.
pub trait MarketDataProvider {
  /// Daily adjusted closes for `tickers` with `start <= date < end`.
  fn historical_prices(
    &self,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PriceTable>;

  /// Most recent price per ticker. Tickers without a quote may be absent.
  fn latest_prices(&self, tickers: &[String]) -> Result<HashMap<String, f64>>;
}

/// Provider backed by a fixed table, for offline runs and tests.
#[derive(Clone, Debug)]
pub struct InMemoryProvider {
  history: PriceTable,
  latest: HashMap<String, f64>,
}

impl InMemoryProvider {
  pub fn new(history: PriceTable, latest: HashMap<String, f64>) -> Self {
    Self { history, latest }
  }

  /// Use the last row of `history` as the latest prices.
  pub fn from_history(history: PriceTable) -> Self {
    let prices = history.prices();
    let latest = match prices.nrows() {
      0 => HashMap::new(),
      rows => history
        .assets()
        .iter()
        .cloned()
        .zip(prices.row(rows - 1).iter().copied())
        .filter(|(_, p)| p.is_finite())
        .collect(),
    };

    Self { history, latest }
  }
}

impl MarketDataProvider for InMemoryProvider {
  fn historical_prices(
    &self,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PriceTable> {
    let table = self.history.select(tickers)?.between(start, end);
    if table.is_empty() {
      bail!("no prices between {start} and {end}");
    }
    Ok(table)
  }

  fn latest_prices(&self, tickers: &[String]) -> Result<HashMap<String, f64>> {
    Ok(
      tickers
        .iter()
        .filter_map(|t| self.latest.get(t).map(|p| (t.clone(), *p)))
        .collect(),
    )
  }
}
