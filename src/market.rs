//! Market-data collaborator: holdings snapshot, live quotes, cross rates.
//!
//! The engine never talks to a brokerage directly. Everything it needs comes
//! through the [`MarketData`] trait, so a live client, a file snapshot, or the
//! in-memory [`StaticMarket`] can all drive a run.
//!
//! ```
//! use restonks::market::{MarketData, StaticMarket};
//!
//! let market = StaticMarket::builder()
//!     .with_holding("VWCE", 110.0, 10.0, "EUR")
//!     .with_quote("AGGH", 5.5, "EUR")
//!     .with_rate("EUR", "USD", 1.08)
//!     .build();
//!
//! assert_eq!(market.holdings().unwrap().len(), 1);
//! assert_eq!(market.quote("AGGH").unwrap().price, 5.5);
//! assert_eq!(market.exchange_rate("USD", "USD").unwrap(), 1.0);
//! ```

use rustc_hash::FxHashMap;

/// One line of the raw portfolio snapshot, in the instrument's own currency.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawHolding {
    pub ticker: String,
    /// Last price in `currency`
    pub price: f64,
    pub quantity: f64,
    pub currency: String,
    /// Market value in `currency`, as reported by the broker
    pub market_value: f64,
}

impl RawHolding {
    /// Holding whose market value is `price * quantity`.
    pub fn new(ticker: impl Into<String>, price: f64, quantity: f64, currency: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            price,
            quantity,
            currency: currency.into(),
            market_value: price * quantity,
        }
    }
}

/// Live quote for an instrument.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quote {
    pub price: f64,
    pub currency: String,
}

/// Errors reported by a market-data source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("no exchange rate for {from} -> {to}")]
    MissingRate { from: String, to: String },

    #[error("market data unavailable: {0}")]
    Unavailable(String),
}

/// Source of holdings, quotes and currency cross rates for one run.
pub trait MarketData {
    /// Current holdings, in broker order.
    fn holdings(&self) -> Result<Vec<RawHolding>, MarketError>;

    /// Latest price and trading currency for `ticker`.
    fn quote(&self, ticker: &str) -> Result<Quote, MarketError>;

    /// Multiplier converting an amount in `from` into `to`.
    ///
    /// Implementations must return `1.0` when both currencies are equal.
    fn exchange_rate(&self, from: &str, to: &str) -> Result<f64, MarketError>;
}

impl<M: MarketData + ?Sized> MarketData for &M {
    fn holdings(&self) -> Result<Vec<RawHolding>, MarketError> {
        (**self).holdings()
    }

    fn quote(&self, ticker: &str) -> Result<Quote, MarketError> {
        (**self).quote(ticker)
    }

    fn exchange_rate(&self, from: &str, to: &str) -> Result<f64, MarketError> {
        (**self).exchange_rate(from, to)
    }
}

/// Builder for [`StaticMarket`].
#[derive(Default)]
pub struct StaticMarketBuilder {
    holdings: Vec<RawHolding>,
    quotes: FxHashMap<String, Quote>,
    rates: FxHashMap<(String, String), f64>,
}

impl StaticMarketBuilder {
    /// Add a held position. Its ticker also becomes quotable at `price`.
    pub fn with_holding(mut self, ticker: &str, price: f64, quantity: f64, currency: &str) -> Self {
        self.quotes.entry(ticker.to_string()).or_insert_with(|| Quote {
            price,
            currency: currency.to_string(),
        });
        self.holdings
            .push(RawHolding::new(ticker, price, quantity, currency));
        self
    }

    /// Add a raw holding exactly as given (market value included).
    pub fn with_raw_holding(mut self, holding: RawHolding) -> Self {
        self.quotes
            .entry(holding.ticker.clone())
            .or_insert_with(|| Quote {
                price: holding.price,
                currency: holding.currency.clone(),
            });
        self.holdings.push(holding);
        self
    }

    pub fn with_quote(mut self, ticker: &str, price: f64, currency: &str) -> Self {
        self.quotes.insert(
            ticker.to_string(),
            Quote {
                price,
                currency: currency.to_string(),
            },
        );
        self
    }

    /// Register the rate converting `from` into `to`.
    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.rates.insert((from.to_string(), to.to_string()), rate);
        self
    }

    pub fn build(self) -> StaticMarket {
        StaticMarket {
            holdings: self.holdings,
            quotes: self.quotes,
            rates: self.rates,
        }
    }
}

/// In-memory market data with fixed holdings, quotes and rates.
///
/// Rate lookups fall back to the inverse pair when only the opposite
/// direction was registered.
#[derive(Clone, Debug, Default)]
pub struct StaticMarket {
    holdings: Vec<RawHolding>,
    quotes: FxHashMap<String, Quote>,
    rates: FxHashMap<(String, String), f64>,
}

impl StaticMarket {
    pub fn builder() -> StaticMarketBuilder {
        StaticMarketBuilder::default()
    }
}

impl MarketData for StaticMarket {
    fn holdings(&self) -> Result<Vec<RawHolding>, MarketError> {
        Ok(self.holdings.clone())
    }

    fn quote(&self, ticker: &str) -> Result<Quote, MarketError> {
        self.quotes
            .get(ticker)
            .cloned()
            .ok_or_else(|| MarketError::UnknownTicker(ticker.to_string()))
    }

    fn exchange_rate(&self, from: &str, to: &str) -> Result<f64, MarketError> {
        if from == to {
            return Ok(1.0);
        }
        let key = (from.to_string(), to.to_string());
        if let Some(&rate) = self.rates.get(&key) {
            return Ok(rate);
        }
        let inverse = (key.1, key.0);
        match self.rates.get(&inverse) {
            Some(&rate) if rate > 0.0 => Ok(1.0 / rate),
            _ => Err(MarketError::MissingRate {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}
