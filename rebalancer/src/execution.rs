//! Run orchestrator: config -> weights -> market snapshot -> book -> plan.
//!
//! Configuration and weights are validated before any market data is read,
//! so a bad weights file never gets as far as the snapshot.

use std::io::{self, Write};
use std::path::PathBuf;

use log::info;
use restonks::{MarketData, RateCache, RunConfig};

use crate::config::Config;
use crate::error::Result;
use crate::report::{self, RunReport};
use crate::snapshot::Snapshot;
use crate::weights;

/// Options for a `plan` run.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// New cash, in the base currency
    pub investment: f64,
    /// Overrides `portfolio.weights_file`
    pub weights_file: Option<PathBuf>,
    /// Overrides `market.snapshot`
    pub snapshot: Option<PathBuf>,
    pub json: bool,
}

fn snapshot_path(config: &Config, over: Option<&PathBuf>) -> PathBuf {
    over.cloned().unwrap_or_else(|| config.market.snapshot.clone())
}

/// Build the run configuration from the config file and CLI options.
pub fn run_config(config: &Config, investment: f64) -> Result<RunConfig> {
    Ok(RunConfig::new(config.portfolio.base_currency.as_str(), investment)?
        .with_match_mode(config.portfolio.ticker_match.into()))
}

/// Load everything and compute the plan without printing it.
pub fn prepare_report(config: &Config, opts: &PlanOptions) -> Result<RunReport> {
    // 1. Validate the run before touching market data
    let run = run_config(config, opts.investment)?;
    let weights_path = opts
        .weights_file
        .clone()
        .unwrap_or_else(|| config.portfolio.weights_file.clone());
    let targets = weights::load(&weights_path)?;
    info!(
        "loaded {} target(s) from {} (sum {:.4})",
        targets.len(),
        weights_path.display(),
        targets.total()
    );

    // 2. Market data
    let path = snapshot_path(config, opts.snapshot.as_ref());
    let snapshot = Snapshot::load(&path)?;
    let as_of = snapshot.as_of;
    info!(
        "market snapshot {} as of {as_of} ({} holdings)",
        path.display(),
        snapshot.holdings.len()
    );
    let market = snapshot.into_market();

    // 3. Book and plan
    let positions = restonks::prepare(&market, &targets, &run)?;
    let plan = restonks::plan::plan(&positions, &run);

    Ok(RunReport {
        as_of,
        base_currency: run.base_currency().to_string(),
        positions,
        plan,
    })
}

/// Plan a run and print it to stdout.
pub fn run(config: &Config, opts: &PlanOptions) -> Result<()> {
    let report = prepare_report(config, opts)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if opts.json {
        report::render_json(&mut out, &report)?;
    } else {
        report::render(&mut out, &report, config.output.precision)?;
    }
    out.flush()?;
    Ok(())
}

/// Print the normalized current holdings.
pub fn show_positions(config: &Config, snapshot: Option<&PathBuf>) -> Result<()> {
    let path = snapshot_path(config, snapshot);
    let market = Snapshot::load(&path)?.into_market();
    let base = config.portfolio.base_currency.as_str();

    let holdings = market.holdings().map_err(restonks::Error::from)?;
    let positions = restonks::normalize::normalize(&holdings, base, &market, &mut RateCache::new())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::render_positions(&mut out, &positions, base, config.output.precision)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TickerMatch;

    #[test]
    fn run_config_carries_match_mode() {
        let mut config = Config::default();
        config.portfolio.ticker_match = TickerMatch::Contains;
        let run = run_config(&config, 10.0).unwrap();
        assert_eq!(run.match_mode(), restonks::MatchMode::Contains);
        assert_eq!(run.base_currency(), "USD");
    }

    #[test]
    fn negative_investment_rejected() {
        let err = run_config(&Config::default(), -100.0).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn snapshot_override_wins() {
        let config = Config::default();
        let custom = PathBuf::from("other.json");
        assert_eq!(snapshot_path(&config, Some(&custom)), custom);
        assert_eq!(snapshot_path(&config, None), PathBuf::from("snapshot.json"));
    }
}
