//! Error types for the rebalancing engine.

use crate::market::MarketError;

/// Errors returned while preparing or planning a rebalance.
///
/// Configuration errors are raised before any order is recorded; market
/// errors come from the data collaborator and are passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("target weights sum to {total:.4} (> 1.0)")]
    WeightsExceedOne { total: f64 },

    #[error("target weight for {ticker} ({weight}) must be within [0.0, 1.0]")]
    InvalidWeight { ticker: String, weight: f64 },

    #[error("duplicate target ticker: {0}")]
    DuplicateTarget(String),

    #[error("empty target ticker")]
    EmptyTicker,

    #[error("ticker {0:?} is reserved for the residual bucket")]
    ReservedTicker(String),

    #[error("investment amount must be a non-negative number, got {0}")]
    NegativeInvestment(f64),

    #[error("invalid base currency: {0:?}")]
    InvalidCurrency(String),

    #[error("duplicate holding ticker: {0}")]
    DuplicateHolding(String),

    #[error("market data error: {0}")]
    Market(#[from] MarketError),
}

impl Error {
    /// True for errors caused by the run configuration or the weights source
    /// rather than by market data.
    pub fn is_config(&self) -> bool {
        !matches!(self, Error::Market(_) | Error::DuplicateHolding(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
