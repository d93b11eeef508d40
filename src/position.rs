//! Positions before and after target assignment.
//!
//! A [`Position`] is a normalized holding that has not been matched with any
//! target yet. After merging, every line lives in a [`PositionBook`] as a
//! [`BookEntry`] whose [`Target`] says whether it is a real rebalancing
//! target or the residual bucket.

use rustc_hash::FxHashMap;

/// Ticker of the residual bucket that absorbs held-but-untargeted positions.
pub const MISC_TICKER: &str = "Misc";

/// A holding converted to the reporting currency.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub ticker: String,
    /// Unit price in the reporting currency
    pub market_price: f64,
    /// Quantity held; usually integral, fractional for some instruments
    pub shares: f64,
    /// Value in the reporting currency
    pub market_value: f64,
    /// Share of the pre-investment portfolio value
    pub weight: f64,
}

impl Position {
    /// Placeholder for a target that is not held yet.
    pub fn unheld(ticker: impl Into<String>, market_price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            market_price,
            shares: 0.0,
            market_value: 0.0,
            weight: 0.0,
        }
    }
}

/// What a book entry is being steered toward.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum Target {
    /// Explicit target weight and the value it implies after investing.
    Weight { weight: f64, value: f64 },
    /// Residual bucket: the target value is pinned to the current value.
    Residual { value: f64 },
}

impl Target {
    pub fn value(&self) -> f64 {
        match *self {
            Target::Weight { value, .. } | Target::Residual { value } => value,
        }
    }

    /// Explicit target weight, `None` for the residual bucket.
    pub fn weight(&self) -> Option<f64> {
        match *self {
            Target::Weight { weight, .. } => Some(weight),
            Target::Residual { .. } => None,
        }
    }
}

/// A position with its target, keyed by ticker inside a [`PositionBook`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookEntry {
    pub market_price: f64,
    pub shares: f64,
    pub market_value: f64,
    pub weight: f64,
    pub target: Target,
}

impl BookEntry {
    pub(crate) fn targeted(position: Position, weight: f64, value: f64) -> Self {
        Self {
            market_price: position.market_price,
            shares: position.shares,
            market_value: position.market_value,
            weight: position.weight,
            target: Target::Weight { weight, value },
        }
    }

    /// Gap to close: positive when underweight.
    pub fn gap(&self) -> f64 {
        self.target.value() - self.market_value
    }

    pub fn target_value(&self) -> f64 {
        self.target.value()
    }

    pub fn target_weight(&self) -> Option<f64> {
        self.target.weight()
    }

    pub fn is_residual(&self) -> bool {
        matches!(self.target, Target::Residual { .. })
    }
}

/// Accumulator for the residual bucket.
///
/// The bucket is one synthetic share priced at the total folded value, so
/// `market_price * shares == market_value` still holds.
#[derive(Clone, Debug, Default)]
pub(crate) struct Residual {
    market_value: f64,
    weight: f64,
    folded: usize,
}

impl Residual {
    pub(crate) fn fold(&mut self, position: &Position) {
        self.market_value += position.market_value;
        self.weight += position.weight;
        self.folded += 1;
    }

    pub(crate) fn folded(&self) -> usize {
        self.folded
    }

    pub(crate) fn into_entry(self) -> BookEntry {
        BookEntry {
            market_price: self.market_value,
            shares: if self.folded == 0 { 0.0 } else { 1.0 },
            market_value: self.market_value,
            weight: self.weight,
            target: Target::Residual {
                value: self.market_value,
            },
        }
    }
}

/// Ordered, ticker-keyed collection of book entries.
///
/// Iteration order is the planning order fixed by the merger: most
/// underweight first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionBook {
    entries: Vec<(String, BookEntry)>,
    index: FxHashMap<String, usize>,
    future_value: f64,
}

impl PositionBook {
    /// Build a book from entries already in planning order.
    ///
    /// `future_value` is the portfolio value after investing, as used for
    /// the target values. Tickers must be unique; a later duplicate replaces
    /// the lookup of an earlier one, so callers dedupe first.
    pub fn from_ordered(entries: Vec<(String, BookEntry)>, future_value: f64) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (ticker, _))| (ticker.clone(), i))
            .collect();
        Self {
            entries,
            index,
            future_value,
        }
    }

    /// Current value plus the investment, fixed once when the book was merged.
    pub fn future_value(&self) -> f64 {
        self.future_value
    }

    pub fn get(&self, ticker: &str) -> Option<&BookEntry> {
        self.index.get(ticker).map(|&i| &self.entries[i].1)
    }

    /// Entries in planning order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BookEntry)> {
        self.entries.iter().map(|(t, e)| (t.as_str(), e))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current value of every entry, residual bucket included.
    pub fn total_market_value(&self) -> f64 {
        self.entries.iter().map(|(_, e)| e.market_value).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, e)| e.weight).sum()
    }

    /// Sum of explicit target weights.
    pub fn total_target_weight(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|(_, e)| e.target_weight())
            .sum()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PositionBook {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (ticker, entry) in &self.entries {
            map.serialize_entry(ticker, entry)?;
        }
        map.end()
    }
}
