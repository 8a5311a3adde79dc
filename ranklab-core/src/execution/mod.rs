//! Execution: converts orders plus a price snapshot into fills.
//!
//! Key concepts:
//! - **Full fill or skip**: an order either fills for its entire quantity
//!   at the day's close, or produces no fill at all
//! - **Skip reasons**: skips are ordinary outcomes, not errors
//! - **Running cash**: affordability is checked against cash remaining
//!   after earlier orders in the same call

pub mod market_on_close;

pub use market_on_close::{BrokerConfig, MarketOnCloseBroker};

use crate::domain::{Fill, InvariantViolation, Order, Portfolio, PriceSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an order produced no fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No bar for the symbol at this timestamp.
    MissingPrice,
    /// The close is NaN, infinite or negative.
    InvalidPrice,
    /// Buy notional exceeds cash still available in this call.
    InsufficientCash { required: f64, available: f64 },
    /// Sell larger than the held long position while shorting is disabled.
    ShortNotAllowed { requested: i64, held: i64 },
}

impl SkipReason {
    /// Stable label for grouping skips in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingPrice => "missing_price",
            SkipReason::InvalidPrice => "invalid_price",
            SkipReason::InsufficientCash { .. } => "insufficient_cash",
            SkipReason::ShortNotAllowed { .. } => "short_not_allowed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingPrice => write!(f, "no price for symbol"),
            SkipReason::InvalidPrice => write!(f, "price is not a valid number"),
            SkipReason::InsufficientCash {
                required,
                available,
            } => write!(f, "insufficient cash: required {required}, available {available}"),
            SkipReason::ShortNotAllowed { requested, held } => {
                write!(f, "selling {requested} would exceed held {held} (shorting disabled)")
            }
        }
    }
}

/// Result of simulating one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Filled(Fill),
    Skipped { order: Order, reason: SkipReason },
}

impl ExecutionOutcome {
    pub fn fill(&self) -> Option<&Fill> {
        match self {
            ExecutionOutcome::Filled(fill) => Some(fill),
            ExecutionOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, ExecutionOutcome::Filled(_))
    }
}

/// Trait for brokers.
///
/// `simulate` must be deterministic and order-preserving: one outcome per
/// order, in input order. The portfolio is a read-only view used to seed
/// available cash and held quantities; the broker never mutates it.
///
/// A broker must never emit a set of fills that would drive cash negative
/// when applied in order; `Portfolio::apply_fills` treats that as fatal.
pub trait Broker: Send + Sync {
    /// Human-readable name (e.g., "market_on_close").
    fn name(&self) -> &str;

    fn simulate(
        &self,
        orders: &[Order],
        prices: &PriceSnapshot,
        portfolio: &Portfolio,
    ) -> Result<Vec<ExecutionOutcome>, InvariantViolation>;
}

/// Collect the fills from a batch of outcomes, preserving order.
pub fn fills_of(outcomes: &[ExecutionOutcome]) -> Vec<Fill> {
    outcomes.iter().filter_map(|o| o.fill().cloned()).collect()
}
