//! # Capital Allocation
//!
//! $$
//! q_i = \frac{w_i K}{p_i}, \qquad \text{cash} = K - \sum_{i:\,p_i>0} q_i\,p_i
//! $$
//!
//! Turns weights into share counts at the latest prices. Assets without a
//! usable price are skipped and their slice of capital stays in cash.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use crate::error::HrpError;
use crate::error::Result;
use super::types::WeightVector;

/// Share count granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShareRounding {
  /// Exactly `weight * capital / price` shares.
  #[default]
  Fractional,
  /// Round down to whole shares; the remainder stays in cash.
  Whole,
}

impl FromStr for ShareRounding {
  type Err = HrpError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "fractional" => Ok(Self::Fractional),
      "whole" => Ok(Self::Whole),
      other => Err(HrpError::validation(format!("unknown share rounding `{other}`"))),
    }
  }
}

impl Display for ShareRounding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ShareRounding::Fractional => write!(f, "fractional"),
      ShareRounding::Whole => write!(f, "whole"),
    }
  }
}

/// Shares bought per asset plus unspent cash.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Allocation {
  /// `(asset, shares)` in weight order.
  pub shares: Vec<(String, f64)>,
  /// Assets left out for lack of a positive price.
  pub skipped: Vec<String>,
  /// Capital not spent on shares, skipped assets' budgets included.
  pub remaining_cash: f64,
}

impl Allocation {
  pub fn shares_of(&self, asset: &str) -> Option<f64> {
    self
      .shares
      .iter()
      .find(|(a, _)| a == asset)
      .map(|(_, q)| *q)
  }
}

/// Spend `initial_capital` according to `weights` at `latest_prices`.
pub fn allocate_capital(
  weights: &WeightVector,
  initial_capital: f64,
  latest_prices: &HashMap<String, f64>,
  rounding: ShareRounding,
) -> Result<Allocation> {
  if !(initial_capital.is_finite() && initial_capital > 0.0) {
    return Err(HrpError::validation(format!(
      "initial capital must be positive, got {initial_capital}"
    )));
  }

  let mut allocation = Allocation {
    remaining_cash: initial_capital,
    ..Allocation::default()
  };

  for (asset, weight) in weights.iter() {
    let invest = weight * initial_capital;
    let price = match latest_prices.get(asset) {
      Some(&p) if p.is_finite() && p > 0.0 => p,
      other => {
        warn!(asset, price = ?other, "skipping asset without a usable price");
        allocation.skipped.push(asset.to_string());
        continue;
      }
    };

    let (shares, spent) = match rounding {
      ShareRounding::Fractional => (invest / price, invest),
      ShareRounding::Whole => {
        let q = (invest / price).floor();
        (q, q * price)
      }
    };

    allocation.shares.push((asset.to_string(), shares));
    allocation.remaining_cash -= spent;
  }

  Ok(allocation)
}
