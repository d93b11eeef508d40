//! Per-run memoization of currency cross rates.

use log::debug;
use rustc_hash::FxHashMap;

use crate::market::{MarketData, MarketError};

/// Cache of exchange rates keyed by `(from, to)`.
///
/// A cache belongs to a single run: rates are never invalidated while it
/// lives, so build a fresh one for every rebalance.
#[derive(Clone, Debug, Default)]
pub struct RateCache {
    rates: FxHashMap<(String, String), f64>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate converting `from` into `to`, asking `market` only on the first
    /// request for a pair. Equal currencies short-circuit to `1.0`.
    pub fn rate(
        &mut self,
        market: &impl MarketData,
        from: &str,
        to: &str,
    ) -> Result<f64, MarketError> {
        if from == to {
            return Ok(1.0);
        }
        let key = (from.to_string(), to.to_string());
        if let Some(&rate) = self.rates.get(&key) {
            return Ok(rate);
        }

        let rate = market.exchange_rate(from, to)?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(MarketError::Unavailable(format!(
                "non-positive rate {rate} for {from} -> {to}"
            )));
        }
        debug!("rate {from} -> {to} = {rate}");
        self.rates.insert(key, rate);
        Ok(rate)
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
