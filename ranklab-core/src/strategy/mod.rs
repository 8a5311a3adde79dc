//! Strategies: turn each day's cross-section into trading intentions.

pub mod momentum;

pub use momentum::{Momentum, MomentumParams};

use crate::domain::{CrossSection, Order, OrderError, Portfolio, Timestamp};
use thiserror::Error;

/// Errors raised by a strategy. Always fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("cross-section {current} is not after the previous one ({previous})")]
    OutOfOrder {
        previous: Timestamp,
        current: Timestamp,
    },

    #[error("failed to build order: {0}")]
    Order(#[from] OrderError),
}

/// Trait for strategies.
///
/// Called once per timestamp in increasing order. The portfolio is a
/// read-only view of current holdings; apart from that the only state a
/// strategy may consult is its own history of past cross-sections, so it
/// can never see future data.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "momentum").
    fn name(&self) -> &str;

    /// Produce zero or more orders for this timestamp. Order of the returned
    /// vector is the order the broker processes them in.
    fn on_bar(
        &mut self,
        cross_section: &CrossSection,
        portfolio: &Portfolio,
    ) -> Result<Vec<Order>, StrategyError>;
}

/// A strategy that never trades. Useful as a baseline and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldCash;

impl Strategy for HoldCash {
    fn name(&self) -> &str {
        "hold_cash"
    }

    fn on_bar(
        &mut self,
        _cross_section: &CrossSection,
        _portfolio: &Portfolio,
    ) -> Result<Vec<Order>, StrategyError> {
        Ok(Vec::new())
    }
}
