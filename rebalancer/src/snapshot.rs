//! Market snapshot file (snapshot.json): holdings, quotes and cross rates
//! captured from a brokerage at one point in time.
//!
//! ```json
//! {
//!   "as_of": "2026-10-16T20:00:00Z",
//!   "holdings": [
//!     { "ticker": "VWCE", "price": 128.4, "quantity": 12, "currency": "EUR" }
//!   ],
//!   "quotes": [ { "ticker": "AGGH", "price": 5.61, "currency": "EUR" } ],
//!   "rates": [ { "from": "EUR", "to": "USD", "rate": 1.0832 } ]
//! }
//! ```
//!
//! A holding's `market_value` defaults to `price * quantity` when omitted.

use std::path::Path;

use chrono::{DateTime, Utc};
use restonks::{RawHolding, StaticMarket};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub holdings: Vec<SnapshotHolding>,
    #[serde(default)]
    pub quotes: Vec<SnapshotQuote>,
    #[serde(default)]
    pub rates: Vec<SnapshotRate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotHolding {
    pub ticker: String,
    pub price: f64,
    pub quantity: f64,
    pub currency: String,
    #[serde(default)]
    pub market_value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotQuote {
    pub ticker: String,
    pub price: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
}

impl Snapshot {
    /// Load and validate a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::SnapshotRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        for h in &self.holdings {
            if h.ticker.is_empty() {
                return Err(Error::Snapshot("holding with empty ticker".into()));
            }
            if !h.price.is_finite() || h.price < 0.0 {
                return Err(Error::Snapshot(format!("holding {} has price {}", h.ticker, h.price)));
            }
            if !h.quantity.is_finite() || h.quantity < 0.0 {
                return Err(Error::Snapshot(format!(
                    "holding {} has quantity {} (short positions are not supported)",
                    h.ticker, h.quantity
                )));
            }
        }
        for r in &self.rates {
            if !r.rate.is_finite() || r.rate <= 0.0 {
                return Err(Error::Snapshot(format!("rate {} -> {} is {}", r.from, r.to, r.rate)));
            }
        }
        Ok(())
    }

    /// In-memory market data backed by this snapshot.
    pub fn into_market(self) -> StaticMarket {
        let mut builder = StaticMarket::builder();
        for h in self.holdings {
            let market_value = h.market_value.unwrap_or(h.price * h.quantity);
            builder = builder.with_raw_holding(RawHolding {
                ticker: h.ticker,
                price: h.price,
                quantity: h.quantity,
                currency: h.currency,
                market_value,
            });
        }
        for q in self.quotes {
            builder = builder.with_quote(&q.ticker, q.price, &q.currency);
        }
        for r in self.rates {
            builder = builder.with_rate(&r.from, &r.to, r.rate);
        }
        builder.build()
    }
}
