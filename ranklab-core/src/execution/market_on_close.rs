//! Market-on-close broker: every order fills in full at the day's close
//! or is skipped.

use super::{Broker, ExecutionOutcome, SkipReason};
use crate::domain::{Fill, InvariantViolation, Order, Portfolio, PriceLookup, PriceSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broker behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Allow sells beyond the held long position (opening a short).
    #[serde(default)]
    pub allow_short: bool,
}

/// Fills market orders at the snapshot close.
///
/// Over-budget buys are rejected whole, never clipped, so every fill is
/// all-or-nothing and the portfolio's solvency post-condition holds.
#[derive(Debug, Clone, Default)]
pub struct MarketOnCloseBroker {
    config: BrokerConfig,
}

impl MarketOnCloseBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    fn check(&self, order: &Order, price: f64, available: f64, held: i64) -> Option<SkipReason> {
        if order.is_buy() {
            let required = order.quantity.unsigned_abs() as f64 * price;
            if required > available {
                return Some(SkipReason::InsufficientCash {
                    required,
                    available,
                });
            }
        } else if !self.config.allow_short {
            let requested = order.quantity.saturating_neg();
            if requested > held.max(0) {
                return Some(SkipReason::ShortNotAllowed { requested, held });
            }
        }
        None
    }
}

impl Broker for MarketOnCloseBroker {
    fn name(&self) -> &str {
        "market_on_close"
    }

    fn simulate(
        &self,
        orders: &[Order],
        prices: &PriceSnapshot,
        portfolio: &Portfolio,
    ) -> Result<Vec<ExecutionOutcome>, InvariantViolation> {
        // Running state mirrors Portfolio::apply_fills arithmetic exactly, so
        // `required <= available` here implies non-negative cash there.
        let mut available = portfolio.cash();
        let mut held: BTreeMap<&str, i64> = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(orders.len());

        for order in orders {
            if order.quantity == 0 {
                return Err(InvariantViolation::ZeroQuantityOrder {
                    timestamp: order.timestamp,
                    symbol: order.symbol.clone(),
                });
            }

            let price = match prices.lookup(&order.symbol) {
                PriceLookup::Valid(p) => p,
                PriceLookup::Missing => {
                    outcomes.push(skipped(order, SkipReason::MissingPrice));
                    continue;
                }
                PriceLookup::Invalid => {
                    outcomes.push(skipped(order, SkipReason::InvalidPrice));
                    continue;
                }
            };

            let position = *held
                .entry(order.symbol.as_str())
                .or_insert_with(|| portfolio.position(&order.symbol));

            if let Some(reason) = self.check(order, price, available, position) {
                outcomes.push(skipped(order, reason));
                continue;
            }

            let fill = Fill {
                timestamp: order.timestamp,
                symbol: order.symbol.clone(),
                quantity: order.quantity,
                price,
                note: order.note.clone(),
            };
            available += fill.cash_delta();
            held.insert(order.symbol.as_str(), position.saturating_add(order.quantity));
            tracing::trace!(symbol = %fill.symbol, quantity = fill.quantity, price, "filled");
            outcomes.push(ExecutionOutcome::Filled(fill));
        }

        Ok(outcomes)
    }
}

fn skipped(order: &Order, reason: SkipReason) -> ExecutionOutcome {
    ExecutionOutcome::Skipped {
        order: order.clone(),
        reason,
    }
}
