//! Engine configuration, mutable state, run result and failure types.

use crate::data::DataError;
use crate::domain::{EquityPoint, InvariantViolation, Order, Portfolio, TradeLogEntry};
use crate::execution::SkipReason;
use crate::strategy::StrategyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
}

impl EngineConfig {
    pub fn new(initial_cash: f64) -> Self {
        Self { initial_cash }
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if !self.initial_cash.is_finite() || self.initial_cash < 0.0 {
            return Err(DataError::InvalidInput(format!(
                "initial cash must be finite and >= 0, got {}",
                self.initial_cash
            )));
        }
        Ok(())
    }
}

/// Fatal conditions that abort a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] DataError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

/// An order that produced no fill, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedOrder {
    pub order: Order,
    pub reason: SkipReason,
}

/// Mutable state that evolves day by day during the engine loop.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub portfolio: Portfolio,
    pub trades_log: Vec<TradeLogEntry>,
    pub skipped: Vec<SkippedOrder>,
    pub steps: usize,
}

impl EngineState {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            portfolio: Portfolio::new(initial_cash),
            trades_log: Vec::new(),
            skipped: Vec::new(),
            steps: 0,
        }
    }

    pub fn into_result(self) -> RunResult {
        RunResult {
            equity_timeseries: self.portfolio.equity_history().to_vec(),
            final_cash: self.portfolio.cash(),
            final_positions: self.portfolio.positions().clone(),
            trades_log: self.trades_log,
            skipped: self.skipped,
            steps: self.steps,
        }
    }

    pub fn fail(self, error: EngineError) -> RunFailure {
        RunFailure {
            error,
            partial: Box::new(self.into_result()),
        }
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    /// Equity at each processed timestamp, strictly increasing.
    pub equity_timeseries: Vec<EquityPoint>,
    /// One entry per applied fill, in fill order.
    pub trades_log: Vec<TradeLogEntry>,
    /// Orders the broker declined, in processing order.
    pub skipped: Vec<SkippedOrder>,
    pub final_cash: f64,
    pub final_positions: BTreeMap<String, i64>,
    /// Number of timestamps fully processed.
    pub steps: usize,
}

impl RunResult {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity_timeseries.last().map(|p| p.equity)
    }

    /// BLAKE3 over the exact bits of the equity series and trade log.
    ///
    /// Two runs over the same bars with the same strategy produce the same
    /// fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for point in &self.equity_timeseries {
            hasher.update(point.timestamp.to_string().as_bytes());
            hasher.update(&point.equity.to_bits().to_le_bytes());
        }
        hasher.update(b"|trades|");
        for trade in &self.trades_log {
            hasher.update(trade.timestamp.to_string().as_bytes());
            hasher.update(trade.symbol.as_bytes());
            hasher.update(&[0]);
            hasher.update(&trade.quantity.to_le_bytes());
            hasher.update(&trade.price.to_bits().to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// A run that aborted. `partial` holds everything recorded up to the last
/// fully processed timestamp; its cash and positions reflect the portfolio
/// at the moment of failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("backtest aborted after {} step(s): {error}", partial.steps)]
pub struct RunFailure {
    pub error: EngineError,
    pub partial: Box<RunResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn engine_config_rejects_bad_cash() {
        assert!(EngineConfig::new(10_000.0).validate().is_ok());
        assert!(EngineConfig::new(0.0).validate().is_ok());
        assert!(EngineConfig::new(-1.0).validate().is_err());
        assert!(EngineConfig::new(f64::NAN).validate().is_err());
    }

    #[test]
    fn engine_state_initial() {
        let state = EngineState::new(100_000.0);
        assert_eq!(state.portfolio.cash(), 100_000.0);
        assert_eq!(state.steps, 0);
        let result = state.into_result();
        assert!(result.equity_timeseries.is_empty());
        assert_eq!(result.final_equity(), None);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut a = EngineState::new(1_000.0).into_result();
        a.equity_timeseries.push(EquityPoint {
            timestamp: ts,
            equity: 1_000.0,
        });
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = a.clone();
        c.equity_timeseries[0].equity = 1_000.000_000_1;
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn failure_carries_partial_result() {
        let mut state = EngineState::new(500.0);
        state.steps = 3;
        let failure = state.fail(EngineError::InvalidInput(DataError::InvalidInput("x".into())));
        assert_eq!(failure.partial.steps, 3);
        assert!(failure.to_string().contains("3 step(s)"));
    }
}
