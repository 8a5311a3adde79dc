//! Backtest runner: wires together configuration, validation, engine and
//! metrics.
//!
//! `run_backtest()` is the single entry point: it takes a validated config
//! and an in-memory bar set and returns the full result with metrics.

use serde::Serialize;
use thiserror::Error;

use ranklab_core::data::{validate_bars, DataError, Severity, ValidationReport};
use ranklab_core::domain::Bar;
use ranklab_core::engine::{Engine, RunFailure, RunResult};
use ranklab_core::execution::MarketOnCloseBroker;
use ranklab_core::strategy::{HoldCash, Momentum, Strategy, StrategyError};

use crate::config::{BacktestConfig, ConfigError, RunId, StrategyConfig};
use crate::metrics::PerformanceMetrics;

/// Data-quality warnings logged individually before switching to a summary.
const MAX_LOGGED_WARNINGS: usize = 20;

/// Current schema version for serialized results.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("strategy construction failed: {0}")]
    Strategy(#[from] StrategyError),

    /// The engine aborted; the partial result is inside.
    #[error("engine error: {0}")]
    Engine(#[from] RunFailure),
}

impl RunError {
    /// Partial engine output, when the failure happened inside the run.
    pub fn partial(&self) -> Option<&RunResult> {
        match self {
            RunError::Engine(failure) => Some(failure.partial.as_ref()),
            _ => None,
        }
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub metrics: PerformanceMetrics,
    pub run: RunResult,
    /// Determinism fingerprint of the equity series and trade log.
    pub fingerprint: String,
    pub validation: ValidationReport,
}

/// Build the configured strategy.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>, StrategyError> {
    let strategy: Box<dyn Strategy> = match config {
        StrategyConfig::Momentum(params) => Box::new(Momentum::new(*params)?),
        StrategyConfig::HoldCash => Box::new(HoldCash),
    };
    Ok(strategy)
}

/// Validate the bars, run the engine and compute metrics.
pub fn run_backtest(config: &BacktestConfig, bars: &[Bar]) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let short_id = run_id.get(..12).unwrap_or(&run_id);
    let span = tracing::info_span!("run", run_id = short_id, strategy = config.strategy.name());
    let _guard = span.enter();

    let validation = check_bars(bars)?;

    let strategy = build_strategy(&config.strategy)?;
    let broker = MarketOnCloseBroker::new(config.broker_config());
    let engine = Engine::new(config.engine_config(), strategy, Box::new(broker));
    let run = engine.run(bars)?;

    let metrics = PerformanceMetrics::compute(&run, config.backtest.initial_cash);
    tracing::info!(
        final_equity = metrics.final_equity,
        total_return = metrics.total_return,
        max_drawdown = metrics.max_drawdown,
        trades = metrics.trade_count,
        skipped = metrics.skipped_count,
        "run finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: config.strategy.name().to_string(),
        metrics,
        fingerprint: run.fingerprint(),
        run,
        validation,
    })
}

/// Log warnings, abort on errors.
fn check_bars(bars: &[Bar]) -> Result<ValidationReport, DataError> {
    let report = validate_bars(bars);
    let warnings = report.with_severity(Severity::Warning).count();
    for issue in report.with_severity(Severity::Warning).take(MAX_LOGGED_WARNINGS) {
        tracing::warn!(%issue, "data quality");
    }
    if warnings > MAX_LOGGED_WARNINGS {
        tracing::warn!(
            suppressed = warnings - MAX_LOGGED_WARNINGS,
            "further data quality warnings suppressed"
        );
    }
    tracing::debug!(
        bars = report.bar_count,
        symbols = report.symbol_count,
        info = report.with_severity(Severity::Info).count(),
        "bar set validated"
    );
    report.into_result()
}
