//! Per-run configuration shared by the merger and the planner.

use std::fmt;

use crate::error::{Error, Result};

/// How a target ticker is matched against held tickers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchMode {
    /// Target and position tickers must be equal.
    #[default]
    Exact,
    /// A target matches every position whose ticker contains it
    /// (`"AAPL"` matches `"AAPL.US"`).
    Contains,
}

impl MatchMode {
    pub fn matches(self, target: &str, ticker: &str) -> bool {
        match self {
            MatchMode::Exact => target == ticker,
            MatchMode::Contains => ticker.contains(target),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Contains => write!(f, "contains"),
        }
    }
}

/// Settings for one rebalance run.
///
/// Built once, validated, then passed by reference into each stage.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    base_currency: String,
    investment: f64,
    match_mode: MatchMode,
}

impl RunConfig {
    /// Validate and build a run configuration.
    ///
    /// The investment must be finite and non-negative; the base currency must
    /// be a three-letter alphabetic code.
    pub fn new(base_currency: impl Into<String>, investment: f64) -> Result<Self> {
        let base_currency = base_currency.into();
        if base_currency.len() != 3 || !base_currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidCurrency(base_currency));
        }
        if !investment.is_finite() || investment < 0.0 {
            return Err(Error::NegativeInvestment(investment));
        }
        Ok(Self {
            base_currency: base_currency.to_ascii_uppercase(),
            investment,
            match_mode: MatchMode::Exact,
        })
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Reporting currency every price and value is converted into.
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// New cash to allocate, in the base currency.
    pub fn investment(&self) -> f64 {
        self.investment
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }
}
