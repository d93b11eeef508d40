//! # restonks
//!
//! Spend new cash so a portfolio drifts toward its target weights, buying
//! whole shares only and never selling.
//!
//! ## Pipeline
//!
//! 1. [`normalize`](normalize::normalize): raw holdings in any currency
//!    become [`Position`]s priced in one reporting currency.
//! 2. [`merge`](merge::merge): positions meet the target weights. Unheld
//!    targets get placeholders, untargeted holdings fold into the
//!    [`MISC_TICKER`] bucket, and the book is ordered most underweight first.
//! 3. [`plan`](plan::plan): a two-pass greedy search turns the cash into
//!    [`RebalanceOrder`]s plus the unspent remainder.
//!
//! ## Quick Start
//!
//! ```
//! use restonks::{RunConfig, StaticMarket, TargetWeight, TargetWeights};
//!
//! let market = StaticMarket::builder()
//!     .with_holding("VT", 100.0, 6.0, "USD")
//!     .with_holding("BND", 50.0, 8.0, "USD")
//!     .build();
//! let targets = TargetWeights::new(vec![
//!     TargetWeight::new("VT", 0.6),
//!     TargetWeight::new("BND", 0.4),
//! ])?;
//! let config = RunConfig::new("USD", 1000.0)?;
//!
//! let (book, plan) = restonks::rebalance(&market, &targets, &config)?;
//!
//! assert_eq!(book.len(), 3); // VT, BND and the Misc bucket
//! assert!(plan.remaining_cash < 50.0);
//! assert!((plan.total_spent() + plan.remaining_cash - 1000.0).abs() < 1e-9);
//! # Ok::<(), restonks::Error>(())
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` on positions, targets and plans.

pub mod config;
pub mod error;
pub mod market;
pub mod merge;
pub mod normalize;
pub mod plan;
pub mod position;
pub mod rates;
pub mod target;

pub use config::{MatchMode, RunConfig};
pub use error::{Error, Result};
pub use market::{MarketData, MarketError, Quote, RawHolding, StaticMarket};
pub use plan::{Action, RebalanceOrder, RebalancePlan, UpdatedPosition};
pub use position::{BookEntry, MISC_TICKER, Position, PositionBook, Target};
pub use rates::RateCache;
pub use target::{TargetWeight, TargetWeights};

/// Fetch holdings, normalize them and merge them with `targets`.
///
/// Uses a fresh [`RateCache`] for the run.
pub fn prepare(
    market: &impl MarketData,
    targets: &TargetWeights,
    config: &RunConfig,
) -> Result<PositionBook> {
    let mut rates = RateCache::new();
    let holdings = market.holdings()?;
    let positions = normalize::normalize(&holdings, config.base_currency(), market, &mut rates)?;
    merge::merge(positions, targets, config, market, &mut rates)
}

/// Run the whole pipeline: [`prepare`] then [`plan::plan`].
///
/// Either both the book and a complete plan come back, or an error and no
/// orders at all.
pub fn rebalance(
    market: &impl MarketData,
    targets: &TargetWeights,
    config: &RunConfig,
) -> Result<(PositionBook, RebalancePlan)> {
    let book = prepare(market, targets, config)?;
    let plan = plan::plan(&book, config);
    Ok((book, plan))
}
