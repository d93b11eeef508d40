//! Console and JSON rendering of a planned run.

use std::io::Write;

use chrono::{DateTime, Utc};
use restonks::{Position, PositionBook, RebalancePlan};
use serde::Serialize;

/// Everything a report needs about one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub as_of: DateTime<Utc>,
    pub base_currency: String,
    pub positions: PositionBook,
    pub plan: RebalancePlan,
}

impl RunReport {
    pub fn current_value(&self) -> f64 {
        self.positions.total_market_value()
    }
}

fn pct(weight: f64) -> String {
    format!("{:.2}%", weight * 100.0)
}

fn opt_pct(weight: Option<f64>) -> String {
    weight.map_or_else(|| "-".to_string(), pct)
}

/// Write the three-table console report.
pub fn render(out: &mut impl Write, report: &RunReport, precision: usize) -> std::io::Result<()> {
    let ccy = &report.base_currency;
    let plan = &report.plan;

    writeln!(out, "Market data as of {}", report.as_of.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out)?;
    writeln!(out, "==== Portfolio ====")?;
    writeln!(
        out,
        "  {:10} {:>12} {:>10} {:>14} {:>8} {:>8} {:>14}",
        "Ticker", "Price", "Shares", "Value", "Weight", "Target", "Target value"
    )?;
    for (ticker, entry) in report.positions.iter() {
        writeln!(
            out,
            "  {:10} {:>12.p$} {:>10} {:>14.p$} {:>8} {:>8} {:>14.p$}",
            ticker,
            entry.market_price,
            entry.shares,
            entry.market_value,
            pct(entry.weight),
            opt_pct(entry.target_weight()),
            entry.target_value(),
            p = precision,
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Current evaluation: {:.p$} {ccy}", report.current_value(), p = precision)?;
    writeln!(out, "Investment amount:  {:.p$} {ccy}", plan.investment, p = precision)?;
    writeln!(out, "New evaluation:     {:.p$} {ccy}", plan.future_value, p = precision)?;

    writeln!(out)?;
    writeln!(out, "==== Rebalancing Plan ====")?;
    if plan.is_empty() {
        writeln!(out, "  No purchases.")?;
    } else {
        writeln!(
            out,
            "  {:10} {:6} {:>8} {:>14} {:>10}",
            "Ticker", "Action", "Shares", "Amount", "New weight"
        )?;
        for order in &plan.orders {
            writeln!(
                out,
                "  {:10} {:6} {:>8} {:>14.p$} {:>10}",
                order.ticker,
                order.action.to_string(),
                order.shares,
                order.amount,
                pct(order.new_weight),
                p = precision,
            )?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Remaining cash: {:.p$} {ccy}", plan.remaining_cash, p = precision)?;

    writeln!(out)?;
    writeln!(out, "==== Updated Portfolio ====")?;
    writeln!(
        out,
        "  {:10} {:>10} {:>8} {:>14} {:>8} {:>8}",
        "Ticker", "Shares", "Bought", "Value", "Weight", "Target"
    )?;
    for row in plan.apply(&report.positions) {
        writeln!(
            out,
            "  {:10} {:>10} {:>8} {:>14.p$} {:>8} {:>8}",
            row.ticker,
            row.shares,
            row.bought,
            row.market_value,
            pct(row.weight),
            opt_pct(row.target_weight),
            p = precision,
        )?;
    }
    Ok(())
}

/// Write the report as pretty JSON.
pub fn render_json(out: &mut impl Write, report: &RunReport) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

/// Table of normalized holdings, before any target is applied.
pub fn render_positions(
    out: &mut impl Write,
    positions: &[Position],
    base_currency: &str,
    precision: usize,
) -> std::io::Result<()> {
    if positions.is_empty() {
        writeln!(out, "No positions.")?;
        return Ok(());
    }

    writeln!(out, "CURRENT PORTFOLIO ({base_currency}):")?;
    for pos in positions {
        writeln!(
            out,
            "  {:10} {:>10} @ {:>12.p$} = {:>14.p$}  ({})",
            pos.ticker,
            pos.shares,
            pos.market_price,
            pos.market_value,
            pct(pos.weight),
            p = precision,
        )?;
    }
    let total: f64 = positions.iter().map(|p| p.market_value).sum();
    writeln!(out, "  Total: {total:.p$} {base_currency}", p = precision)?;
    Ok(())
}
