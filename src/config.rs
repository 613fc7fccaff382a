//! # Run Configuration
//!
//! $$
//! \text{RunConfig} = (\{\text{tickers}\},\ t_0 < t_1,\ K > 0)
//! $$
//!
//! The validated inputs of one run. Parsing lives here so the core never
//! sees raw user strings.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::HrpError;
use crate::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validated tickers, date window and starting capital.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
  pub tickers: Vec<String>,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub capital: f64,
}

impl RunConfig {
  pub fn new(tickers: Vec<String>, start: NaiveDate, end: NaiveDate, capital: f64) -> Result<Self> {
    if tickers.is_empty() {
      return Err(HrpError::validation("no valid tickers given"));
    }
    if start >= end {
      return Err(HrpError::validation(format!(
        "start date {start} must be before end date {end}"
      )));
    }
    if !(capital.is_finite() && capital > 0.0) {
      return Err(HrpError::validation(format!(
        "initial capital must be a positive number, got {capital}"
      )));
    }

    Ok(Self {
      tickers,
      start,
      end,
      capital,
    })
  }

  /// Parse raw user input: comma-separated tickers, ISO dates, decimal capital.
  pub fn parse(tickers: &str, start: &str, end: &str, capital: &str) -> Result<Self> {
    let capital = capital
      .trim()
      .parse::<f64>()
      .map_err(|_| HrpError::validation(format!("invalid capital amount `{}`", capital.trim())))?;

    Self::new(parse_tickers(tickers), parse_date(start)?, parse_date(end)?, capital)
  }
}

/// Split on commas, trim, upper-case, drop blanks and repeats.
pub fn parse_tickers(raw: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  raw
    .split(',')
    .map(|t| t.trim().to_uppercase())
    .filter(|t| !t.is_empty())
    .filter(|t| seen.insert(t.clone()))
    .collect()
}

/// `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
    HrpError::validation(format!(
      "incorrect date `{}`, expected YYYY-MM-DD",
      raw.trim()
    ))
  })
}
