//! Target merger: attach target weights to positions and fix planning order.
//!
//! Steps, in order:
//!
//! 1. Every target that is not held gets a zero-share placeholder priced
//!    from a live quote, converted to the reporting currency.
//! 2. Positions matching a target get `target_value = weight * future value`
//!    where the future value is the current total plus the investment.
//! 3. Positions left without a target are folded into the [`MISC_TICKER`]
//!    residual bucket, whose target value equals its own value.
//! 4. Entries are stably sorted by `market_value - target_value`, most
//!    underweight first.

use log::{debug, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::market::{MarketData, MarketError};
use crate::position::{BookEntry, MISC_TICKER, Position, PositionBook, Residual};
use crate::rates::RateCache;
use crate::target::TargetWeights;

/// Merge normalized positions with target weights into a [`PositionBook`].
///
/// Fails if a target that is not held cannot be quoted or converted; no
/// price is ever guessed.
pub fn merge(
    mut positions: Vec<Position>,
    targets: &TargetWeights,
    config: &RunConfig,
    market: &impl MarketData,
    rates: &mut RateCache,
) -> Result<PositionBook> {
    let current_value: f64 = positions.iter().map(|p| p.market_value).sum();
    let future_value = current_value + config.investment();

    for target in targets.iter() {
        if positions.iter().any(|p| p.ticker == target.ticker) {
            continue;
        }
        let position = quote_unheld(&target.ticker, config.base_currency(), market, rates)?;
        debug!(
            "{}: not held, placeholder at {:.4} {}",
            position.ticker,
            position.market_price,
            config.base_currency()
        );
        positions.push(position);
    }

    let mode = config.match_mode();
    let mut entries: Vec<(String, BookEntry)> = Vec::with_capacity(positions.len() + 1);
    let mut misc = Residual::default();

    for position in positions {
        // Later targets win when several match (only possible with `Contains`).
        let matched = targets
            .iter()
            .filter(|t| mode.matches(&t.ticker, &position.ticker))
            .last();

        match matched {
            Some(target) => {
                let value = target.weight * future_value;
                let ticker = position.ticker.clone();
                entries.push((ticker, BookEntry::targeted(position, target.weight, value)));
            }
            None => {
                debug!("{}: no target, folding into {MISC_TICKER}", position.ticker);
                misc.fold(&position);
            }
        }
    }

    if misc.folded() > 0 {
        warn!(
            "{} untargeted holding(s) folded into {MISC_TICKER}",
            misc.folded()
        );
    }
    entries.push((MISC_TICKER.to_string(), misc.into_entry()));

    // `sort_by` is stable: equal gaps keep their merge order.
    entries.sort_by(|(_, a), (_, b)| {
        let a = a.market_value - a.target_value();
        let b = b.market_value - b.target_value();
        a.total_cmp(&b)
    });

    Ok(PositionBook::from_ordered(entries, future_value))
}

/// Placeholder position for a target with no current holding.
fn quote_unheld(
    ticker: &str,
    base_currency: &str,
    market: &impl MarketData,
    rates: &mut RateCache,
) -> Result<Position> {
    let quote = market.quote(ticker)?;
    if !quote.price.is_finite() || quote.price <= 0.0 {
        return Err(MarketError::Unavailable(format!(
            "quote for {ticker} has unusable price {}",
            quote.price
        ))
        .into());
    }
    let rate = rates.rate(market, &quote.currency, base_currency)?;
    Ok(Position::unheld(ticker, quote.price * rate))
}
