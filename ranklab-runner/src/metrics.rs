//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade log in, scalar
//! out. Nothing here touches the engine or the configuration.

use ranklab_core::domain::TradeLogEntry;
use ranklab_core::engine::{RunResult, SkippedOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_cash: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub traded_notional: f64,
    pub skipped_count: usize,
    /// Skipped orders keyed by `SkipReason::label()`.
    pub skipped_by_reason: BTreeMap<String, usize>,
    pub trading_days: usize,
}

impl PerformanceMetrics {
    pub fn compute(result: &RunResult, initial_cash: f64) -> Self {
        let curve: Vec<f64> = result.equity_timeseries.iter().map(|p| p.equity).collect();
        let final_equity = result.final_equity().unwrap_or(initial_cash);
        Self {
            initial_cash,
            final_equity,
            total_return: total_return(initial_cash, final_equity),
            cagr: cagr(initial_cash, final_equity, curve.len()),
            sharpe: sharpe_ratio(&curve),
            max_drawdown: max_drawdown(&curve),
            trade_count: result.trades_log.len(),
            traded_notional: traded_notional(&result.trades_log),
            skipped_count: result.skipped.len(),
            skipped_by_reason: skipped_by_reason(&result.skipped),
            trading_days: curve.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_equity - initial) / initial
}

/// Compound annual growth rate, assuming 252 trading days per year.
pub fn cagr(initial: f64, final_equity: f64, trading_days: usize) -> f64 {
    if trading_days < 2 || initial <= 0.0 || final_equity <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    (final_equity / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio of daily returns with a zero risk-free rate.
///
/// Returns 0.0 with fewer than two returns or zero variance.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    let std = var.sqrt();
    if std < 1e-15 {
        return 0.0;
    }
    mean / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Sum of |quantity| × price over all trades.
pub fn traded_notional(trades: &[TradeLogEntry]) -> f64 {
    trades
        .iter()
        .map(|t| t.quantity.unsigned_abs() as f64 * t.price)
        .sum()
}

pub fn skipped_by_reason(skipped: &[SkippedOrder]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for s in skipped {
        *counts.entry(s.reason.label().to_string()).or_insert(0) += 1;
    }
    counts
}

fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}
