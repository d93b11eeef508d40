//! Target-weight intent, validated before any market data is touched.

use log::warn;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::position::MISC_TICKER;

/// Slack allowed on the weight sum for decimal inputs like `0.1 * 10`.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// A single target: ticker + fraction of the future portfolio value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetWeight {
    pub ticker: String,
    pub weight: f64,
}

impl TargetWeight {
    pub fn new(ticker: impl Into<String>, weight: f64) -> Self {
        Self {
            ticker: ticker.into(),
            weight,
        }
    }
}

/// Validated list of targets, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetWeights {
    targets: Vec<TargetWeight>,
}

impl TargetWeights {
    /// Validate a list of targets.
    ///
    /// Rejects empty or duplicate tickers, the residual bucket's ticker,
    /// weights outside `[0, 1]`, and lists summing above 1.
    pub fn new(targets: Vec<TargetWeight>) -> Result<Self> {
        let mut seen = FxHashSet::default();
        for t in &targets {
            if t.ticker.is_empty() {
                return Err(Error::EmptyTicker);
            }
            if t.ticker == MISC_TICKER {
                return Err(Error::ReservedTicker(t.ticker.clone()));
            }
            if !seen.insert(t.ticker.as_str()) {
                return Err(Error::DuplicateTarget(t.ticker.clone()));
            }
            if !(0.0..=1.0).contains(&t.weight) {
                return Err(Error::InvalidWeight {
                    ticker: t.ticker.clone(),
                    weight: t.weight,
                });
            }
        }

        let total: f64 = targets.iter().map(|t| t.weight).sum();
        if total > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(Error::WeightsExceedOne { total });
        }
        if !targets.is_empty() && total < 0.5 {
            warn!("target weights only sum to {total:.4}; the rest stays unallocated");
        }

        Ok(Self { targets })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetWeight> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.targets.iter().map(|t| t.weight).sum()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.targets.iter().any(|t| t.ticker == ticker)
    }
}

impl TryFrom<Vec<(String, f64)>> for TargetWeights {
    type Error = Error;

    fn try_from(pairs: Vec<(String, f64)>) -> Result<Self> {
        Self::new(
            pairs
                .into_iter()
                .map(|(ticker, weight)| TargetWeight { ticker, weight })
                .collect(),
        )
    }
}
