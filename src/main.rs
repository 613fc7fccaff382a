use anyhow::Result;
use clap::Parser;
use hrp_rs::config::RunConfig;
use hrp_rs::market_data::yahoo::YahooProvider;
use hrp_rs::portfolio::BisectionSplit;
use hrp_rs::portfolio::EstimatorConfig;
use hrp_rs::portfolio::HrpEngine;
use hrp_rs::portfolio::HrpEngineConfig;
use hrp_rs::portfolio::LinkageMethod;
use hrp_rs::portfolio::ReturnKind;
use hrp_rs::portfolio::ShareRounding;
use hrp_rs::report;
use tracing_subscriber::EnvFilter;

/// Hierarchical Risk Parity portfolio builder
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Comma-separated tickers (e.g. "AAPL, MSFT, GOOGL")
  #[arg(short, long)]
  tickers: String,
  /// Start date, YYYY-MM-DD
  #[arg(short, long)]
  start: String,
  /// End date, YYYY-MM-DD
  #[arg(short, long)]
  end: String,
  /// Initial capital
  #[arg(short, long, default_value = "10000")]
  capital: String,
  /// Linkage rule: single, complete or average
  #[arg(long, default_value_t = LinkageMethod::Single)]
  linkage: LinkageMethod,
  /// Bisection split: positional or topological
  #[arg(long, default_value_t = BisectionSplit::Positional)]
  split: BisectionSplit,
  /// Use log returns instead of simple returns
  #[arg(long, default_value_t = false)]
  log_returns: bool,
  /// Report CAGR instead of the annualized arithmetic mean
  #[arg(long, default_value_t = false)]
  compounding: bool,
  /// Observations per year
  #[arg(long, default_value_t = 252)]
  frequency: usize,
  /// Risk-free rate for the Sharpe ratio
  #[arg(long, default_value_t = 0.0)]
  risk_free: f64,
  /// Buy whole shares only
  #[arg(long, default_value_t = false)]
  whole_shares: bool,
  /// Set the verbosity level (error, warn, info, debug, trace)
  #[arg(long, default_value = "info")]
  verbose: String,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.verbose)),
    )
    .with_writer(std::io::stderr)
    .init();

  let run = RunConfig::parse(&cli.tickers, &cli.start, &cli.end, &cli.capital)?;
  let engine = HrpEngine::new(HrpEngineConfig {
    estimator: EstimatorConfig {
      frequency: cli.frequency,
      returns: if cli.log_returns {
        ReturnKind::Log
      } else {
        ReturnKind::Simple
      },
      compounding: cli.compounding,
    },
    linkage: cli.linkage,
    split: cli.split,
    risk_free: cli.risk_free,
    parallel: false,
    rounding: if cli.whole_shares {
      ShareRounding::Whole
    } else {
      ShareRounding::Fractional
    },
  });

  let provider = YahooProvider::new()?;
  let result = engine.run_with(&provider, &run)?;

  print!("{}", report::render(&result, run.capital));
  Ok(())
}
