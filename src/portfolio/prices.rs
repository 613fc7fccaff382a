//! # Price Table
//!
//! $$
//! P_{t,i} \leftarrow P_{t-1,i} \quad \text{if } P_{t,i} \text{ is missing}
//! $$
//!
//! Date-indexed adjusted closes, one column per asset. Missing values are
//! stored as `NaN` until [`PriceTable::clean`] forward-fills and drops them.

use std::collections::BTreeMap;
use std::collections::HashSet;

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;

use crate::error::HrpError;
use crate::error::Result;

/// Adjusted closing prices indexed by date (rows) and asset (columns).
#[derive(Clone, Debug, PartialEq)]
pub struct PriceTable {
  dates: Vec<NaiveDate>,
  assets: Vec<String>,
  values: Array2<f64>,
}

impl PriceTable {
  /// Build a table from rows of optional prices, one entry per asset.
  ///
  /// Rows must be in strictly ascending date order. Non-finite prices are
  /// treated as missing.
  pub fn new(assets: Vec<String>, rows: Vec<(NaiveDate, Vec<Option<f64>>)>) -> Result<Self> {
    if assets.is_empty() {
      return Err(HrpError::validation("price table needs at least one asset"));
    }

    let mut seen = HashSet::with_capacity(assets.len());
    for asset in &assets {
      if !seen.insert(asset.as_str()) {
        return Err(HrpError::validation(format!("duplicate asset `{asset}`")));
      }
    }

    let n = assets.len();
    let mut dates = Vec::with_capacity(rows.len());
    let mut values = Array2::from_elem((rows.len(), n), f64::NAN);

    for (t, (date, row)) in rows.into_iter().enumerate() {
      if row.len() != n {
        return Err(HrpError::validation(format!(
          "row for {date} has {} prices, expected {n}",
          row.len()
        )));
      }
      if dates.last().is_some_and(|prev| *prev >= date) {
        return Err(HrpError::validation(format!(
          "dates must be strictly ascending, found {date} out of order"
        )));
      }
      dates.push(date);

      for (i, price) in row.into_iter().enumerate() {
        if let Some(p) = price.filter(|p| p.is_finite()) {
          values[[t, i]] = p;
        }
      }
    }

    Ok(Self {
      dates,
      assets,
      values,
    })
  }

  /// Align per-asset `(date, price)` series on the union of their dates.
  pub fn from_series(series: Vec<(String, Vec<(NaiveDate, f64)>)>) -> Result<Self> {
    let n = series.len();
    let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut assets = Vec::with_capacity(n);

    for (i, (asset, points)) in series.into_iter().enumerate() {
      assets.push(asset);
      for (date, price) in points {
        by_date.entry(date).or_insert_with(|| vec![None; n])[i] = Some(price);
      }
    }

    Self::new(assets, by_date.into_iter().collect())
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Prices as a `(observations, assets)` view.
  pub fn prices(&self) -> ArrayView2<'_, f64> {
    self.values.view()
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  pub fn n_observations(&self) -> usize {
    self.dates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dates.is_empty()
  }

  /// `true` while any price is missing.
  pub fn has_gaps(&self) -> bool {
    self.values.iter().any(|p| !p.is_finite())
  }

  /// Forward-fill each asset, then drop dates that still have a gap.
  ///
  /// Fails with [`HrpError::DataQuality`] when nothing survives.
  pub fn clean(&self) -> Result<Self> {
    let mut filled = self.values.clone();
    for mut column in filled.axis_iter_mut(Axis(1)) {
      let mut last = f64::NAN;
      for p in column.iter_mut() {
        if p.is_finite() {
          last = *p;
        } else {
          *p = last;
        }
      }
    }

    let keep: Vec<usize> = filled
      .axis_iter(Axis(0))
      .enumerate()
      .filter(|(_, row)| row.iter().all(|p| p.is_finite()))
      .map(|(t, _)| t)
      .collect();

    if keep.is_empty() {
      return Err(HrpError::data_quality(
        "price table is empty after forward-fill and gap removal",
      ));
    }

    Ok(Self {
      dates: keep.iter().map(|&t| self.dates[t]).collect(),
      assets: self.assets.clone(),
      values: filled.select(Axis(0), &keep),
    })
  }

  /// Restrict the table to `assets`, in the given order.
  pub fn select(&self, assets: &[String]) -> Result<Self> {
    let idx = assets
      .iter()
      .map(|a| {
        self
          .assets
          .iter()
          .position(|x| x == a)
          .ok_or_else(|| HrpError::validation(format!("asset `{a}` not in price table")))
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      dates: self.dates.clone(),
      assets: assets.to_vec(),
      values: self.values.select(Axis(1), &idx),
    })
  }

  /// Rows with `start <= date < end`.
  pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
    let keep: Vec<usize> = self
      .dates
      .iter()
      .enumerate()
      .filter(|(_, d)| **d >= start && **d < end)
      .map(|(t, _)| t)
      .collect();

    Self {
      dates: keep.iter().map(|&t| self.dates[t]).collect(),
      assets: self.assets.clone(),
      values: self.values.select(Axis(0), &keep),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  fn names(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn clean_forward_fills_then_drops_leading_gaps() {
    let table = PriceTable::new(
      names(&["A", "B"]),
      vec![
        (day(1), vec![Some(10.0), None]),
        (day(2), vec![None, Some(20.0)]),
        (day(3), vec![Some(11.0), None]),
      ],
    )
    .unwrap();

    assert!(table.has_gaps());
    let clean = table.clean().unwrap();

    assert!(!clean.has_gaps());
    assert_eq!(clean.dates(), &[day(2), day(3)]);
    assert_eq!(clean.prices()[[0, 0]], 10.0);
    assert_eq!(clean.prices()[[1, 1]], 20.0);
  }

  #[test]
  fn clean_rejects_table_with_no_complete_row() {
    let table = PriceTable::new(
      names(&["A", "B"]),
      vec![(day(1), vec![Some(1.0), None]), (day(2), vec![Some(2.0), None])],
    )
    .unwrap();

    assert!(matches!(table.clean(), Err(HrpError::DataQuality(_))));
  }

  #[test]
  fn new_rejects_unordered_dates_and_ragged_rows() {
    let unordered = PriceTable::new(
      names(&["A"]),
      vec![(day(2), vec![Some(1.0)]), (day(1), vec![Some(1.0)])],
    );
    assert!(matches!(unordered, Err(HrpError::Validation(_))));

    let ragged = PriceTable::new(names(&["A", "B"]), vec![(day(1), vec![Some(1.0)])]);
    assert!(matches!(ragged, Err(HrpError::Validation(_))));
  }

  #[test]
  fn from_series_aligns_on_date_union() {
    let table = PriceTable::from_series(vec![
      ("A".into(), vec![(day(1), 1.0), (day(3), 3.0)]),
      ("B".into(), vec![(day(2), 2.0), (day(3), 4.0)]),
    ])
    .unwrap();

    assert_eq!(table.n_observations(), 3);
    assert!(table.prices()[[0, 1]].is_nan());
    assert_eq!(table.clean().unwrap().n_observations(), 2);
  }

  #[test]
  fn select_and_between_slice_the_table() {
    let table = PriceTable::new(
      names(&["A", "B", "C"]),
      (1..=4)
        .map(|d| (day(d), vec![Some(d as f64), Some(10.0), Some(100.0)]))
        .collect(),
    )
    .unwrap();

    let sub = table.select(&names(&["C", "A"])).unwrap().between(day(2), day(4));
    assert_eq!(sub.assets(), &names(&["C", "A"]));
    assert_eq!(sub.dates(), &[day(2), day(3)]);
    assert_eq!(sub.prices()[[1, 1]], 3.0);
    assert!(table.select(&names(&["Z"])).is_err());
  }
}
