//! Cross-sectional momentum: hold the top-K symbols by trailing return.
//!
//! Momentum is `close[t] / close[t - lookback_days] - 1` over the symbol's
//! own recorded closes. Each day the strategy:
//! 1. ranks symbols with enough history, momentum descending, ties by symbol
//! 2. takes the top `top_k` as the target universe
//! 3. sizes each target to `floor(dollar_per_position / close)` shares
//! 4. emits exits and share reductions first, then entries and increases,
//!    so capital freed by sells is available to buys in the same broker call
//!
//! A held symbol with no valid close today cannot be traded, so it keeps
//! its slot: no exit is emitted for it and the target universe shrinks by
//! one. The number of held names therefore never exceeds `top_k`.

use super::{Strategy, StrategyError};
use crate::domain::{CrossSection, Order, Portfolio, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

const EXIT_NOTE: &str = "momentum exit";
const ENTRY_NOTE: &str = "momentum entry";
const REBALANCE_NOTE: &str = "momentum rebalance";

/// Momentum strategy parameters. Missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub lookback_days: usize,
    pub top_k: usize,
    pub dollar_per_position: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            lookback_days: 20,
            top_k: 5,
            dollar_per_position: 10_000.0,
        }
    }
}

impl MomentumParams {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.lookback_days < 1 {
            return Err(StrategyError::InvalidParameter {
                name: "lookback_days",
                reason: "must be >= 1".into(),
            });
        }
        if self.top_k < 1 {
            return Err(StrategyError::InvalidParameter {
                name: "top_k",
                reason: "must be >= 1".into(),
            });
        }
        if !self.dollar_per_position.is_finite() || self.dollar_per_position <= 0.0 {
            return Err(StrategyError::InvalidParameter {
                name: "dollar_per_position",
                reason: format!("must be finite and > 0, got {}", self.dollar_per_position),
            });
        }
        Ok(())
    }
}

/// Top-K momentum strategy with an internally managed rolling history.
///
/// Only valid closes (finite, > 0) are recorded; a day with a missing or
/// invalid close leaves that symbol's window untouched and excludes the
/// symbol from that day's ranking.
#[derive(Debug, Clone)]
pub struct Momentum {
    params: MomentumParams,
    history: BTreeMap<String, VecDeque<f64>>,
    last_timestamp: Option<Timestamp>,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self {
            params,
            history: BTreeMap::new(),
            last_timestamp: None,
        })
    }

    pub fn params(&self) -> &MomentumParams {
        &self.params
    }

    fn window(&self) -> usize {
        self.params.lookback_days + 1
    }

    fn record(&mut self, cross_section: &CrossSection) {
        let window = self.window();
        for bar in &cross_section.bars {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                continue;
            }
            let closes = self.history.entry(bar.symbol.clone()).or_default();
            closes.push_back(bar.close);
            while closes.len() > window {
                closes.pop_front();
            }
        }
    }

    /// Trailing return over the full lookback window, if recorded.
    pub fn momentum(&self, symbol: &str) -> Option<f64> {
        let closes = self.history.get(symbol)?;
        if closes.len() < self.window() {
            return None;
        }
        let first = closes.front()?;
        let last = closes.back()?;
        Some(last / first - 1.0)
    }

    /// Eligible symbols with their momentum, best first.
    ///
    /// A symbol is eligible when it has a valid close in this cross-section
    /// and a full window of history.
    pub fn rank(&self, cross_section: &CrossSection) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = cross_section
            .bars
            .iter()
            .filter(|b| b.close.is_finite() && b.close > 0.0)
            .filter_map(|b| self.momentum(&b.symbol).map(|m| (b.symbol.clone(), m)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Shares affordable with one position's budget at `price`.
    pub fn target_quantity(&self, price: f64) -> i64 {
        (self.params.dollar_per_position / price).floor() as i64
    }

    fn build_orders(
        &self,
        cross_section: &CrossSection,
        portfolio: &Portfolio,
    ) -> Result<Vec<Order>, StrategyError> {
        let ts = cross_section.timestamp;
        let untradeable = portfolio
            .held_symbols()
            .filter(|s| cross_section.prices.valid_price(s).is_none())
            .count();
        let slots = self.params.top_k.saturating_sub(untradeable);

        let targets: Vec<(String, i64)> = self
            .rank(cross_section)
            .into_iter()
            .take(slots)
            .filter_map(|(symbol, _)| {
                let price = cross_section.prices.valid_price(&symbol)?;
                Some((symbol, self.target_quantity(price)))
            })
            .collect();

        let mut sells = Vec::new();
        let mut buys = Vec::new();

        for (symbol, &held) in portfolio.positions() {
            if held == 0 || targets.iter().any(|(s, _)| s == symbol) {
                continue;
            }
            if cross_section.prices.valid_price(symbol).is_none() {
                continue;
            }
            sells.push(Order::new(ts, symbol.as_str(), held.saturating_neg(), EXIT_NOTE)?);
        }

        for (symbol, target) in &targets {
            let held = portfolio.position(symbol);
            let delta = target.saturating_sub(held);
            if delta == 0 {
                continue;
            }
            let note = if held == 0 { ENTRY_NOTE } else { REBALANCE_NOTE };
            let order = Order::new(ts, symbol.as_str(), delta, note)?;
            if delta < 0 {
                sells.push(order);
            } else {
                buys.push(order);
            }
        }

        sells.extend(buys);
        Ok(sells)
    }
}

impl Strategy for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn on_bar(
        &mut self,
        cross_section: &CrossSection,
        portfolio: &Portfolio,
    ) -> Result<Vec<Order>, StrategyError> {
        if let Some(previous) = self.last_timestamp {
            if cross_section.timestamp <= previous {
                return Err(StrategyError::OutOfOrder {
                    previous,
                    current: cross_section.timestamp,
                });
            }
        }
        self.last_timestamp = Some(cross_section.timestamp);

        self.record(cross_section);
        self.build_orders(cross_section, portfolio)
    }
}
