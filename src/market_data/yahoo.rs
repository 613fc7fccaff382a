//! # Yahoo Finance Provider
//!
//! $$
//! P_{t,i} = \text{adjclose}_{t,i}
//! $$
//!
//! Blocking adapter over `yahoo_finance_api` on a current-thread runtime.

use std::collections::HashMap;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use time::Month;
use time::OffsetDateTime;
use tokio::runtime::Runtime;
use tracing::debug;
use tracing::warn;
use yahoo_finance_api::YahooConnector;

use crate::portfolio::PriceTable;
use super::MarketDataProvider;

pub struct YahooProvider {
  connector: YahooConnector,
  runtime: Runtime,
}

impl YahooProvider {
  pub fn new() -> Result<Self> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context("failed to start runtime for market data")?;

    Ok(Self {
      connector: YahooConnector::new()?,
      runtime,
    })
  }

  fn history_of(
    &self,
    ticker: &str,
    start: OffsetDateTime,
    end: OffsetDateTime,
  ) -> Result<Vec<(NaiveDate, f64)>> {
    let response = self
      .runtime
      .block_on(self.connector.get_quote_history(ticker, start, end))
      .with_context(|| format!("history request for {ticker} failed"))?;
    let quotes = response
      .quotes()
      .with_context(|| format!("no quotes for {ticker}"))?;

    quotes
      .into_iter()
      .map(|q| {
        let date = DateTime::from_timestamp(q.timestamp as i64, 0)
          .ok_or_else(|| anyhow!("bad timestamp {} for {ticker}", q.timestamp))?
          .date_naive();
        Ok((date, q.adjclose))
      })
      .collect()
  }
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
  let month = Month::try_from(date.month() as u8)?;
  Ok(time::Date::from_calendar_date(date.year(), month, date.day() as u8)?
    .midnight()
    .assume_utc())
}

impl MarketDataProvider for YahooProvider {
  fn historical_prices(
    &self,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<PriceTable> {
    let (from, to) = (to_offset(start)?, to_offset(end)?);

    let series = tickers
      .iter()
      .map(|t| Ok((t.clone(), self.history_of(t, from, to)?)))
      .collect::<Result<Vec<_>>>()?;

    debug!(tickers = tickers.len(), %start, %end, "fetched price history");
    Ok(PriceTable::from_series(series)?.between(start, end))
  }

  fn latest_prices(&self, tickers: &[String]) -> Result<HashMap<String, f64>> {
    let mut latest = HashMap::with_capacity(tickers.len());

    for ticker in tickers {
      let quote = self
        .runtime
        .block_on(self.connector.get_latest_quotes(ticker, "1d"))
        .and_then(|r| r.last_quote());
      match quote {
        Ok(q) => {
          latest.insert(ticker.clone(), q.close);
        }
        Err(err) => warn!(%ticker, %err, "no latest quote"),
      }
    }

    if latest.is_empty() {
      return Err(anyhow!("failed to fetch latest prices for {}", tickers.join(", ")));
    }
    Ok(latest)
  }
}
