//! Portfolio: aggregate state of cash + integer share positions.

use super::{Fill, InvariantViolation, PriceSnapshot, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One point of the equity time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: Timestamp,
    pub equity: f64,
}

/// Aggregate portfolio state.
///
/// Mutated only through [`Portfolio::apply_fills`] and
/// [`Portfolio::mark_to_market`]. Invariants after every successful call:
/// - `cash >= 0` (no margin)
/// - `equity_history` is strictly increasing by timestamp
///
/// Positions are kept in a `BTreeMap` so valuation sums run in a fixed
/// order and replays are bit-for-bit identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    cash: f64,
    initial_cash: f64,
    positions: BTreeMap<String, i64>,
    equity_history: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            initial_cash,
            positions: BTreeMap::new(),
            equity_history: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Signed share count for `symbol` (0 when flat).
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.position(symbol) != 0
    }

    /// Non-flat positions in ascending symbol order.
    pub fn positions(&self) -> &BTreeMap<String, i64> {
        &self.positions
    }

    pub fn held_symbols(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(|s| s.as_str())
    }

    pub fn equity_history(&self) -> &[EquityPoint] {
        &self.equity_history
    }

    /// Apply fills in the order given: `cash -= qty * price`,
    /// `positions[symbol] += qty`.
    ///
    /// The broker guarantees affordability, so a negative balance afterwards
    /// is a fatal invariant breach rather than a runtime condition. The batch
    /// is staged first and committed only if every fill is well formed and
    /// the resulting cash is non-negative; on error the portfolio is
    /// unchanged.
    pub fn apply_fills(&mut self, fills: &[Fill]) -> Result<(), InvariantViolation> {
        let mut cash = self.cash;
        let mut staged: BTreeMap<&str, i64> = BTreeMap::new();
        for fill in fills {
            check_fill(fill)?;
            cash += fill.cash_delta();
            let shares = staged
                .entry(fill.symbol.as_str())
                .or_insert_with(|| self.position(&fill.symbol));
            *shares = shares
                .checked_add(fill.quantity)
                .ok_or_else(|| InvariantViolation::InvalidFill {
                    timestamp: fill.timestamp,
                    symbol: fill.symbol.clone(),
                    reason: "position size overflows i64".to_string(),
                })?;
        }

        if let Some(last) = fills.last() {
            if cash < 0.0 {
                return Err(InvariantViolation::NegativeCash {
                    timestamp: last.timestamp,
                    cash,
                });
            }
        }

        self.cash = cash;
        for (symbol, shares) in staged {
            if shares == 0 {
                self.positions.remove(symbol);
            } else {
                self.positions.insert(symbol.to_string(), shares);
            }
        }
        Ok(())
    }

    /// `cash + Σ shares * price` over held symbols with a valid price.
    ///
    /// Held symbols that are absent or carry an invalid price contribute
    /// nothing for this valuation; no stale price is carried forward.
    pub fn equity(&self, prices: &PriceSnapshot) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .filter_map(|(sym, &shares)| prices.valid_price(sym).map(|p| shares as f64 * p))
            .sum();
        self.cash + position_value
    }

    /// Value the portfolio at `timestamp` and append the point to the
    /// equity history.
    pub fn mark_to_market(
        &mut self,
        timestamp: Timestamp,
        prices: &PriceSnapshot,
    ) -> Result<f64, InvariantViolation> {
        if let Some(last) = self.equity_history.last() {
            if timestamp <= last.timestamp {
                return Err(InvariantViolation::NonMonotonicTimestamp {
                    previous: last.timestamp,
                    current: timestamp,
                });
            }
        }
        let equity = self.equity(prices);
        self.equity_history.push(EquityPoint { timestamp, equity });
        Ok(equity)
    }
}

fn check_fill(fill: &Fill) -> Result<(), InvariantViolation> {
    let reason = if fill.quantity == 0 {
        "zero quantity".to_string()
    } else if !fill.price.is_finite() || fill.price < 0.0 {
        format!("price {} is not finite and non-negative", fill.price)
    } else {
        return Ok(());
    };
    Err(InvariantViolation::InvalidFill {
        timestamp: fill.timestamp,
        symbol: fill.symbol.clone(),
        reason,
    })
}
