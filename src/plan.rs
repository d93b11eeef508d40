//! Rebalance planner: turn a cash budget into whole-share buy orders.
//!
//! Two greedy passes over the book in planning order:
//!
//! - **Gap closing**: buy up to the whole shares needed to reach each
//!   target, as far as the cash allows. Stops once cash runs out.
//! - **Leftovers**: restart from the first entry and spend what is left on
//!   as many whole shares as fit, first come first served.
//!
//! The residual bucket is never bought. The result is a heuristic, not an
//! optimum: a different ordering can leave less cash behind.

use std::fmt;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::config::RunConfig;
use crate::position::{BookEntry, PositionBook};

/// Trade direction. Only purchases are planned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Buy,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
        }
    }
}

/// A planned purchase.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceOrder {
    pub ticker: String,
    pub action: Action,
    /// Whole shares to buy, always positive
    pub shares: u64,
    /// `shares * market_price`, in the reporting currency
    pub amount: f64,
    /// Weight of the position in the future portfolio after this purchase
    pub new_weight: f64,
}

/// Output of a planning run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalancePlan {
    /// Orders in the order they were first created
    pub orders: Vec<RebalanceOrder>,
    /// Cash left after both passes
    pub remaining_cash: f64,
    pub investment: f64,
    /// Current total value plus the investment
    pub future_value: f64,
}

impl RebalancePlan {
    pub fn order(&self, ticker: &str) -> Option<&RebalanceOrder> {
        self.orders.iter().find(|o| o.ticker == ticker)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total cash committed by the orders.
    pub fn total_spent(&self) -> f64 {
        self.orders.iter().map(|o| o.amount).sum()
    }

    /// Project the book after every order fills at its planned price.
    ///
    /// Rows keep the book's order; bought rows take the order's new weight,
    /// the others are re-weighted against the future value.
    pub fn apply(&self, book: &PositionBook) -> Vec<UpdatedPosition> {
        book.iter()
            .map(|(ticker, entry)| {
                let order = self.order(ticker);
                let bought = order.map_or(0, |o| o.shares);
                let amount = order.map_or(0.0, |o| o.amount);
                let market_value = entry.market_value + amount;
                let weight = match order {
                    Some(o) => o.new_weight,
                    None if self.future_value > 0.0 => market_value / self.future_value,
                    None => 0.0,
                };
                UpdatedPosition {
                    ticker: ticker.to_string(),
                    market_price: entry.market_price,
                    shares: entry.shares + bought as f64,
                    bought,
                    market_value,
                    weight,
                    target_weight: entry.target_weight(),
                }
            })
            .collect()
    }
}

/// A book row after the plan is applied.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdatedPosition {
    pub ticker: String,
    pub market_price: f64,
    pub shares: f64,
    pub bought: u64,
    pub market_value: f64,
    pub weight: f64,
    pub target_weight: Option<f64>,
}

/// Most shares a single order may hold.
///
/// Above 2^53 share counts stop being exact as `f64`, and `shares * price`
/// no longer matches the amount charged.
pub const MAX_ORDER_SHARES: u64 = 1 << 53;

/// Whole shares of `price` that `cash` pays for, at most [`MAX_ORDER_SHARES`].
///
/// Corrects the float quotient so that `shares * price <= cash` always
/// holds; the remaining cash can therefore never go negative.
fn affordable_shares(cash: f64, price: f64) -> u64 {
    if price <= 0.0 || cash < price {
        return 0;
    }
    let mut shares = whole_shares(cash / price);
    while shares > 0 && shares as f64 * price > cash {
        shares -= 1;
    }
    shares
}

/// Floor of a non-negative share quotient, capped at [`MAX_ORDER_SHARES`].
fn whole_shares(quotient: f64) -> u64 {
    let floored = quotient.floor();
    if floored >= MAX_ORDER_SHARES as f64 {
        MAX_ORDER_SHARES
    } else if floored > 0.0 {
        floored as u64
    } else {
        0
    }
}

fn buyable(entry: &BookEntry) -> bool {
    !entry.is_residual() && entry.market_price.is_finite() && entry.market_price > 0.0
}

/// Accumulates orders while keeping creation order.
struct OrderBook<'a> {
    orders: Vec<RebalanceOrder>,
    index: FxHashMap<&'a str, usize>,
    future_value: f64,
}

impl<'a> OrderBook<'a> {
    /// Add up to `shares` to the ticker's order and return what was actually
    /// bought and its cost. The order never grows past [`MAX_ORDER_SHARES`].
    fn buy(&mut self, ticker: &'a str, entry: &BookEntry, shares: u64) -> (u64, f64) {
        let held = self.index.get(ticker).map_or(0, |&i| self.orders[i].shares);
        let shares = shares.min(MAX_ORDER_SHARES - held);
        if shares == 0 {
            return (0, 0.0);
        }

        let amount = shares as f64 * entry.market_price;
        let future_value = self.future_value;
        let new_weight = |total: f64| {
            if future_value > 0.0 {
                (entry.market_value + total) / future_value
            } else {
                0.0
            }
        };

        match self.index.get(ticker) {
            Some(&i) => {
                let order = &mut self.orders[i];
                order.shares += shares;
                order.amount += amount;
                order.new_weight = new_weight(order.amount);
            }
            None => {
                self.index.insert(ticker, self.orders.len());
                self.orders.push(RebalanceOrder {
                    ticker: ticker.to_string(),
                    action: Action::Buy,
                    shares,
                    amount,
                    new_weight: new_weight(amount),
                });
            }
        }
        (shares, amount)
    }
}

/// Plan whole-share purchases of `config.investment()` across `book`.
///
/// New weights are measured against the future value fixed when the book
/// was merged. Deterministic: the same book and budget always give the same
/// plan.
pub fn plan(book: &PositionBook, config: &RunConfig) -> RebalancePlan {
    let investment = config.investment();
    let future_value = book.future_value();
    let mut remaining_cash = investment;
    let mut orders = OrderBook {
        orders: Vec::new(),
        index: FxHashMap::default(),
        future_value,
    };

    // Phase 1: close gaps in planning order.
    for (ticker, entry) in book.iter() {
        if remaining_cash <= 0.0 {
            break;
        }
        if !buyable(entry) {
            continue;
        }
        let price = entry.market_price;
        let shares_needed = whole_shares(entry.gap() / price);
        if shares_needed == 0 || price > remaining_cash {
            continue;
        }
        let max_affordable = affordable_shares(remaining_cash, price);
        let (shares, spent) = orders.buy(ticker, entry, shares_needed.min(max_affordable));
        if shares > 0 {
            remaining_cash -= spent;
            debug!("gap: {ticker} +{shares} @ {price:.4} ({spent:.2}), cash left {remaining_cash:.2}");
        }
    }

    // Phase 2: spend leftovers, first fit from the top.
    if remaining_cash > 0.0 {
        for (ticker, entry) in book.iter() {
            if !buyable(entry) {
                continue;
            }
            let affordable = affordable_shares(remaining_cash, entry.market_price);
            let (shares, spent) = orders.buy(ticker, entry, affordable);
            if shares > 0 {
                remaining_cash -= spent;
                debug!(
                    "leftover: {ticker} +{shares} @ {:.4} ({spent:.2}), cash left {remaining_cash:.2}",
                    entry.market_price
                );
            }
        }
    }

    info!(
        "planned {} order(s), {:.2} of {:.2} left unspent",
        orders.orders.len(),
        remaining_cash,
        investment
    );

    RebalancePlan {
        orders: orders.orders,
        remaining_cash,
        investment,
        future_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{MISC_TICKER, Target};

    fn entry(price: f64, shares: f64, target_value: f64) -> BookEntry {
        BookEntry {
            market_price: price,
            shares,
            market_value: price * shares,
            weight: 0.0,
            target: Target::Weight {
                weight: 0.0,
                value: target_value,
            },
        }
    }

    fn misc(value: f64) -> BookEntry {
        BookEntry {
            market_price: value,
            shares: 1.0,
            market_value: value,
            weight: 0.0,
            target: Target::Residual { value },
        }
    }

    /// Book in the given order, merged for `investment` of new cash.
    fn book(investment: f64, entries: Vec<(&str, BookEntry)>) -> PositionBook {
        let current: f64 = entries.iter().map(|(_, e)| e.market_value).sum();
        PositionBook::from_ordered(
            entries.into_iter().map(|(t, e)| (t.to_string(), e)).collect(),
            current + investment,
        )
    }

    fn config(investment: f64) -> RunConfig {
        RunConfig::new("USD", investment).unwrap()
    }

    #[test]
    fn affordable_shares_never_overspends() {
        assert_eq!(affordable_shares(100.0, 20.0), 5);
        assert_eq!(affordable_shares(99.99, 20.0), 4);
        assert_eq!(affordable_shares(10.0, 20.0), 0);
        assert_eq!(affordable_shares(10.0, 0.0), 0);
        assert_eq!(affordable_shares(0.3, 0.1), 2);
        assert!(affordable_shares(0.3, 0.1) as f64 * 0.1 <= 0.3);
    }

    #[test]
    fn share_counts_are_capped() {
        assert_eq!(whole_shares(1e30), MAX_ORDER_SHARES);
        assert_eq!(whole_shares(f64::INFINITY), MAX_ORDER_SHARES);
        assert_eq!(whole_shares(f64::NAN), 0);
        assert_eq!(whole_shares(-3.5), 0);
        assert_eq!(whole_shares(7.9), 7);
        assert_eq!(affordable_shares(1e6, 1e-14), MAX_ORDER_SHARES);
    }

    #[test]
    fn tiny_price_does_not_overflow_order() {
        let price = 1e-14;
        let book = book(1e6, vec![("A", entry(price, 0.0, 1e6))]);
        let plan = plan(&book, &config(1e6));

        // Both passes hit the cap; the second adds nothing.
        assert_eq!(plan.orders.len(), 1);
        let order = plan.order("A").unwrap();
        assert_eq!(order.shares, MAX_ORDER_SHARES);
        assert_eq!(order.amount, order.shares as f64 * price);
        assert!(plan.remaining_cash >= 0.0);
        assert!((plan.total_spent() + plan.remaining_cash - 1e6).abs() < 1e-6);
    }

    #[test]
    fn gap_then_leftover() {
        // $50 share, 3 short of target, $1000 to invest.
        let book = book(1000.0, vec![("A", entry(50.0, 10.0, 650.0))]);
        let plan = plan(&book, &config(1000.0));

        let order = plan.order("A").unwrap();
        assert_eq!(order.shares, 20);
        assert_eq!(order.amount, 1000.0);
        assert_eq!(plan.remaining_cash, 0.0);
        assert_eq!(plan.orders.len(), 1);
    }

    #[test]
    fn gap_limited_by_cash() {
        let book = book(50.0, vec![("A", entry(20.0, 0.0, 100.0))]);
        let plan = plan(&book, &config(50.0));

        assert_eq!(plan.order("A").unwrap().shares, 2);
        assert_eq!(plan.remaining_cash, 10.0);
    }

    #[test]
    fn zero_investment_is_a_no_op() {
        let book = book(0.0, vec![
            ("B", entry(100.0, 4.0, 500.0)),
            ("A", entry(100.0, 6.0, 500.0)),
        ]);
        let plan = plan(&book, &config(0.0));
        assert!(plan.is_empty());
        assert_eq!(plan.remaining_cash, 0.0);
        assert_eq!(plan.future_value, 1000.0);
    }

    #[test]
    fn overweight_positions_skipped_in_gap_pass() {
        let book = book(35.0, vec![
            ("U", entry(10.0, 0.0, 30.0)),
            ("O", entry(1000.0, 1.0, 0.0)),
        ]);
        let plan = plan(&book, &config(35.0));

        // Gap pass buys 3 U; leftover $5 buys nothing.
        assert_eq!(plan.order("U").unwrap().shares, 3);
        assert!(plan.order("O").is_none());
        assert_eq!(plan.remaining_cash, 5.0);
    }

    #[test]
    fn leftover_pass_restarts_from_top() {
        let book = book(100.0, vec![
            ("A", entry(30.0, 0.0, 60.0)),
            ("B", entry(7.0, 0.0, 7.0)),
        ]);
        let plan = plan(&book, &config(100.0));

        // Phase 1: A +2 ($60), B +1 ($7), cash 33.
        // Phase 2: A +1 ($30), cash 3; B unaffordable.
        assert_eq!(plan.order("A").unwrap().shares, 3);
        assert_eq!(plan.order("A").unwrap().amount, 90.0);
        assert_eq!(plan.order("B").unwrap().shares, 1);
        assert_eq!(plan.remaining_cash, 3.0);
        assert_eq!(
            plan.orders.iter().map(|o| o.ticker.as_str()).collect::<Vec<_>>(),
            ["A", "B"]
        );
    }

    #[test]
    fn leftover_pass_creates_new_orders() {
        let book = book(58.0, vec![
            ("A", entry(40.0, 0.0, 40.0)),
            ("B", entry(5.0, 10.0, 0.0)),
        ]);
        let plan = plan(&book, &config(58.0));

        assert_eq!(plan.order("A").unwrap().shares, 1);
        // Cash 18 after gap pass; A unaffordable, B takes 3.
        assert_eq!(plan.order("B").unwrap().shares, 3);
        assert_eq!(plan.remaining_cash, 3.0);
    }

    #[test]
    fn residual_bucket_is_never_bought() {
        let book = book(120.0, vec![
            ("A", entry(500.0, 0.0, 500.0)),
            (MISC_TICKER, misc(10.0)),
        ]);
        let plan = plan(&book, &config(120.0));
        assert!(plan.is_empty());
        assert_eq!(plan.remaining_cash, 120.0);
    }

    #[test]
    fn empty_residual_bucket_is_skipped() {
        let book = book(60.0, vec![
            (MISC_TICKER, misc(0.0)),
            ("A", entry(25.0, 0.0, 50.0)),
        ]);
        let plan = plan(&book, &config(60.0));
        assert_eq!(plan.order("A").unwrap().shares, 2);
        assert!(plan.order(MISC_TICKER).is_none());
        assert_eq!(plan.remaining_cash, 10.0);
    }

    #[test]
    fn new_weight_uses_future_value() {
        let book = book(100.0, vec![("A", entry(10.0, 10.0, 150.0))]);
        let plan = plan(&book, &config(100.0));

        let order = plan.order("A").unwrap();
        assert_eq!(order.shares, 10);
        assert!((order.new_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn apply_projects_updated_rows() {
        let book = book(100.0, vec![
            ("A", entry(10.0, 0.0, 100.0)),
            ("B", entry(50.0, 2.0, 100.0)),
        ]);
        let plan = plan(&book, &config(100.0));
        let updated = plan.apply(&book);

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].ticker, "A");
        assert_eq!(updated[0].bought, 10);
        assert_eq!(updated[0].shares, 10.0);
        assert_eq!(updated[0].market_value, 100.0);
        assert!((updated[0].weight - 0.5).abs() < 1e-12);
        assert_eq!(updated[1].bought, 0);
        assert!((updated[1].weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Buy.to_string(), "BUY");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn plan_serializes() {
        let book = book(50.0, vec![("A", entry(20.0, 0.0, 100.0))]);
        let plan = plan(&book, &config(50.0));
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["orders"][0]["ticker"], "A");
        assert_eq!(json["orders"][0]["action"], "Buy");
        assert_eq!(json["remaining_cash"], 10.0);
    }
}
