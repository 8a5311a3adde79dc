//! Backtesting engine: day-by-day event loop and run bookkeeping.
//!
//! The engine groups bars into per-timestamp cross-sections and, for each
//! timestamp in increasing order, asks the strategy for orders, simulates
//! them with the broker, applies the resulting fills to the portfolio and
//! records equity.

pub mod loop_runner;
pub mod state;

pub use loop_runner::{run_backtest, Engine};
pub use state::{EngineConfig, EngineError, EngineState, RunFailure, RunResult, SkippedOrder};
