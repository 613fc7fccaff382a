//! # Report
//!
//! Console tables for a finished run.

use prettytable::Table;
use prettytable::format;
use prettytable::row;

use crate::portfolio::HrpRun;

fn table() -> Table {
  let mut t = Table::new();
  t.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
  t
}

/// Weights, performance, allocation and leftover cash.
pub fn render(run: &HrpRun, capital: f64) -> String {
  let portfolio = &run.portfolio;
  let mut out = String::new();

  let mut weights = table();
  weights.set_titles(row!["Ticker", "Weight"]);
  for (asset, w) in portfolio.weights.iter() {
    weights.add_row(row![asset, r->format!("{:.2}%", w * 100.0)]);
  }
  out.push_str("Optimized Portfolio Weights:\n");
  out.push_str(&weights.to_string());

  let perf = &portfolio.performance;
  out.push_str(&format!(
    "\nExpected Annual Return: {:.2}%\n",
    perf.expected_return * 100.0
  ));
  out.push_str(&format!(
    "Portfolio Volatility (Standard Deviation): {:.2}%\n",
    perf.volatility * 100.0
  ));
  out.push_str(&format!("Sharpe Ratio: {:.2}\n", perf.sharpe));

  let mut alloc = table();
  alloc.set_titles(row!["Ticker", "Shares", "Price"]);
  for (asset, shares) in &run.allocation.shares {
    let price = run.latest_prices.get(asset).copied().unwrap_or(f64::NAN);
    alloc.add_row(row![asset, r->format!("{shares:.4}"), r->format!("${price:.2}")]);
  }
  for asset in &run.allocation.skipped {
    alloc.add_row(row![asset, "-", "unavailable"]);
  }
  out.push_str(&format!(
    "\nCapital Allocation based on Initial Capital (${capital:.2}):\n"
  ));
  out.push_str(&alloc.to_string());

  out.push_str(&format!(
    "\nRemaining Cash: ${:.2}\n",
    run.allocation.remaining_cash
  ));
  out
}
