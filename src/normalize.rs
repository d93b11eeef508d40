//! Position normalizer: raw holdings into reporting-currency positions.

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::market::{MarketData, RawHolding};
use crate::position::Position;
use crate::rates::RateCache;

/// Convert raw holdings into [`Position`]s priced in `base_currency`.
///
/// Prices and market values are multiplied by the cross rate of the
/// holding's currency; weights are taken against the converted
/// pre-investment total (zero when the total is zero). Order is preserved.
pub fn normalize(
    holdings: &[RawHolding],
    base_currency: &str,
    market: &impl MarketData,
    rates: &mut RateCache,
) -> Result<Vec<Position>> {
    let mut seen = FxHashSet::default();
    for h in holdings {
        if !seen.insert(h.ticker.as_str()) {
            return Err(Error::DuplicateHolding(h.ticker.clone()));
        }
    }

    let mut positions = Vec::with_capacity(holdings.len());
    for h in holdings {
        let rate = rates.rate(market, &h.currency, base_currency)?;
        positions.push(Position {
            ticker: h.ticker.clone(),
            market_price: h.price * rate,
            shares: h.quantity,
            market_value: h.market_value * rate,
            weight: 0.0,
        });
    }

    let total: f64 = positions.iter().map(|p| p.market_value).sum();
    if total > 0.0 {
        for p in &mut positions {
            p.weight = p.market_value / total;
        }
    }
    debug!(
        "normalized {} holdings, total {total:.2} {base_currency}",
        positions.len()
    );

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::StaticMarket;

    #[test]
    fn converts_foreign_holdings() {
        let market = StaticMarket::builder()
            .with_holding("VT", 100.0, 6.0, "USD")
            .with_holding("VWCE", 100.0, 4.0, "EUR")
            .with_rate("EUR", "USD", 1.5)
            .build();
        let holdings = market.holdings().unwrap();
        let mut rates = RateCache::new();

        let positions = normalize(&holdings, "USD", &market, &mut rates).unwrap();

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].ticker, "VT");
        assert_eq!(positions[0].market_value, 600.0);
        assert_eq!(positions[1].ticker, "VWCE");
        assert_eq!(positions[1].market_price, 150.0);
        assert_eq!(positions[1].market_value, 600.0);
        assert_eq!(positions[1].shares, 4.0);
        // Weights use converted values
        assert!((positions[0].weight - 0.5).abs() < 1e-12);
        assert!((positions[1].weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn weights_sum_to_one() {
        let market = StaticMarket::builder()
            .with_holding("A", 13.7, 3.0, "USD")
            .with_holding("B", 91.1, 7.0, "GBP")
            .with_holding("C", 0.33, 1000.0, "EUR")
            .with_rate("GBP", "USD", 1.27)
            .with_rate("EUR", "USD", 1.08)
            .build();
        let holdings = market.holdings().unwrap();
        let positions = normalize(&holdings, "USD", &market, &mut RateCache::new()).unwrap();

        let total: f64 = positions.iter().map(|p| p.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_holdings() {
        let market = StaticMarket::builder().build();
        let positions = normalize(&[], "USD", &market, &mut RateCache::new()).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn zero_total_gives_zero_weights() {
        let market = StaticMarket::builder()
            .with_holding("A", 10.0, 0.0, "USD")
            .build();
        let holdings = market.holdings().unwrap();
        let positions = normalize(&holdings, "USD", &market, &mut RateCache::new()).unwrap();
        assert_eq!(positions[0].weight, 0.0);
        assert!(positions[0].weight.is_finite());
    }

    #[test]
    fn missing_rate_is_an_error() {
        let market = StaticMarket::builder()
            .with_holding("SAP", 200.0, 1.0, "EUR")
            .build();
        let holdings = market.holdings().unwrap();
        let err = normalize(&holdings, "USD", &market, &mut RateCache::new()).unwrap_err();
        assert!(matches!(err, Error::Market(_)));
    }

    #[test]
    fn duplicate_ticker_is_rejected() {
        let market = StaticMarket::builder()
            .with_holding("A", 10.0, 1.0, "USD")
            .with_holding("A", 10.0, 2.0, "USD")
            .build();
        let holdings = market.holdings().unwrap();
        let err = normalize(&holdings, "USD", &market, &mut RateCache::new()).unwrap_err();
        assert!(matches!(err, Error::DuplicateHolding(t) if t == "A"));
    }

    #[test]
    fn rates_are_cached_across_holdings() {
        let market = StaticMarket::builder()
            .with_holding("SAP", 200.0, 1.0, "EUR")
            .with_holding("ASML", 700.0, 1.0, "EUR")
            .with_rate("EUR", "USD", 1.1)
            .build();
        let holdings = market.holdings().unwrap();
        let mut rates = RateCache::new();
        normalize(&holdings, "USD", &market, &mut rates).unwrap();
        assert_eq!(rates.len(), 1);
    }
}
