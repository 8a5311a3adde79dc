//! Day-by-day event loop: the heart of the backtesting engine.
//!
//! Four phases per timestamp:
//! 1. Decide: the strategy sees today's cross-section and current holdings
//! 2. Execute: the broker turns orders into fills or skips at today's close
//! 3. Apply: fills update cash and positions
//! 4. Mark: equity is computed at today's closes and recorded

use crate::data::BarTimeline;
use crate::domain::{Bar, CrossSection, TradeLogEntry};
use crate::execution::{Broker, ExecutionOutcome};
use crate::strategy::Strategy;

use super::state::{EngineConfig, EngineError, EngineState, RunFailure, RunResult, SkippedOrder};

/// Data quality threshold: warn if the void bar rate exceeds this fraction.
const VOID_BAR_RATE_THRESHOLD: f64 = 0.10;

/// Owns a strategy and a broker and drives them over a bar set.
pub struct Engine {
    config: EngineConfig,
    strategy: Box<dyn Strategy>,
    broker: Box<dyn Broker>,
}

impl Engine {
    pub fn new(config: EngineConfig, strategy: Box<dyn Strategy>, broker: Box<dyn Broker>) -> Self {
        Self {
            config,
            strategy,
            broker,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the backtest. Consumes the engine since strategy state is not
    /// reset between runs.
    pub fn run(mut self, bars: &[Bar]) -> Result<RunResult, RunFailure> {
        run_backtest(bars, &self.config, self.strategy.as_mut(), self.broker.as_ref())
    }
}

/// Run a backtest over an unordered bar set.
///
/// Bars are grouped by timestamp, each group is processed in increasing
/// timestamp order, and every completed timestamp contributes exactly one
/// equity point. Any [`EngineError`] aborts the run; the returned
/// [`RunFailure`] carries everything recorded before the failing timestamp.
pub fn run_backtest(
    bars: &[Bar],
    config: &EngineConfig,
    strategy: &mut dyn Strategy,
    broker: &dyn Broker,
) -> Result<RunResult, RunFailure> {
    let span = tracing::info_span!(
        "backtest",
        strategy = strategy.name(),
        broker = broker.name(),
        bars = bars.len()
    );
    let _guard = span.enter();

    let mut state = EngineState::new(config.initial_cash);
    if let Err(err) = config.validate() {
        return Err(abort(state, err.into()));
    }

    let timeline = match BarTimeline::from_bars(bars) {
        Ok(timeline) => timeline,
        Err(err) => return Err(abort(state, err.into())),
    };

    let void_bars = bars.iter().filter(|b| b.is_void()).count();
    if !bars.is_empty() {
        let void_rate = void_bars as f64 / bars.len() as f64;
        if void_rate > VOID_BAR_RATE_THRESHOLD {
            tracing::warn!(
                void_bars,
                void_rate,
                "void bar rate exceeds {:.0}%",
                VOID_BAR_RATE_THRESHOLD * 100.0
            );
        }
    }

    tracing::info!(
        timestamps = timeline.len(),
        initial_cash = config.initial_cash,
        "starting backtest"
    );

    for cross_section in timeline.sections() {
        if let Err(err) = step(&mut state, cross_section, strategy, broker) {
            return Err(abort(state, err));
        }
        state.steps += 1;
    }

    let result = state.into_result();
    tracing::info!(
        steps = result.steps,
        trades = result.trades_log.len(),
        skipped = result.skipped.len(),
        final_equity = result.final_equity().unwrap_or(config.initial_cash),
        "backtest complete"
    );
    Ok(result)
}

/// Process one timestamp. Nothing is recorded in the trade or skip logs
/// unless every phase succeeds.
fn step(
    state: &mut EngineState,
    cross_section: &CrossSection,
    strategy: &mut dyn Strategy,
    broker: &dyn Broker,
) -> Result<(), EngineError> {
    // ─── Phase 1: Decide ───
    let orders = strategy.on_bar(cross_section, &state.portfolio)?;

    // ─── Phase 2: Execute ───
    let outcomes = broker.simulate(&orders, &cross_section.prices, &state.portfolio)?;

    let mut fills = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            ExecutionOutcome::Filled(fill) => fills.push(fill),
            ExecutionOutcome::Skipped { order, reason } => {
                tracing::debug!(
                    date = %cross_section.timestamp,
                    symbol = %order.symbol,
                    quantity = order.quantity,
                    reason = reason.label(),
                    "order skipped"
                );
                skipped.push(SkippedOrder { order, reason });
            }
        }
    }

    // ─── Phase 3: Apply ───
    state.portfolio.apply_fills(&fills)?;

    // ─── Phase 4: Mark ───
    let equity = state
        .portfolio
        .mark_to_market(cross_section.timestamp, &cross_section.prices)?;

    tracing::debug!(
        date = %cross_section.timestamp,
        orders = orders.len(),
        fills = fills.len(),
        cash = state.portfolio.cash(),
        equity,
        "step"
    );

    state
        .trades_log
        .extend(fills.iter().map(TradeLogEntry::from));
    state.skipped.extend(skipped);
    Ok(())
}

fn abort(state: EngineState, error: EngineError) -> RunFailure {
    tracing::error!(error = %error, steps = state.steps, "backtest aborted");
    state.fail(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, Portfolio};
    use crate::execution::MarketOnCloseBroker;
    use crate::strategy::{HoldCash, StrategyError};
    use chrono::NaiveDate;

    fn bar(d: u32, symbol: &str, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            symbol: symbol.into(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    /// Buys a fixed quantity of one symbol on the first call only.
    struct BuyOnce {
        symbol: &'static str,
        quantity: i64,
        done: bool,
    }

    impl Strategy for BuyOnce {
        fn name(&self) -> &str {
            "buy_once"
        }

        fn on_bar(
            &mut self,
            cs: &CrossSection,
            _portfolio: &Portfolio,
        ) -> Result<Vec<Order>, StrategyError> {
            if self.done {
                return Ok(Vec::new());
            }
            self.done = true;
            Ok(vec![Order::new(cs.timestamp, self.symbol, self.quantity, "buy")?])
        }
    }

    #[test]
    fn hold_cash_keeps_flat_equity() {
        let bars = vec![bar(1, "A", 10.0), bar(2, "A", 12.0), bar(3, "A", 9.0)];
        let result = run_backtest(
            &bars,
            &EngineConfig::new(1_000.0),
            &mut HoldCash,
            &MarketOnCloseBroker::default(),
        )
        .unwrap();
        assert_eq!(result.steps, 3);
        assert!(result.equity_timeseries.iter().all(|p| p.equity == 1_000.0));
        assert!(result.trades_log.is_empty());
    }

    #[test]
    fn fills_are_logged_and_marked() {
        let bars = vec![bar(1, "A", 10.0), bar(2, "A", 12.0)];
        let mut strategy = BuyOnce {
            symbol: "A",
            quantity: 50,
            done: false,
        };
        let result = run_backtest(
            &bars,
            &EngineConfig::new(1_000.0),
            &mut strategy,
            &MarketOnCloseBroker::default(),
        )
        .unwrap();
        assert_eq!(result.trades_log.len(), 1);
        assert_eq!(result.final_cash, 500.0);
        assert_eq!(result.final_positions.get("A"), Some(&50));
        assert_eq!(result.equity_timeseries[0].equity, 1_000.0);
        assert_eq!(result.equity_timeseries[1].equity, 1_100.0);
    }

    #[test]
    fn skipped_orders_are_recorded() {
        let bars = vec![bar(1, "A", 10.0)];
        let mut strategy = BuyOnce {
            symbol: "MISSING",
            quantity: 1,
            done: false,
        };
        let result = run_backtest(
            &bars,
            &EngineConfig::new(1_000.0),
            &mut strategy,
            &MarketOnCloseBroker::default(),
        )
        .unwrap();
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].reason.label(), "missing_price");
        assert_eq!(result.final_cash, 1_000.0);
    }

    #[test]
    fn negative_initial_cash_is_invalid_input() {
        let failure = run_backtest(
            &[bar(1, "A", 10.0)],
            &EngineConfig::new(-5.0),
            &mut HoldCash,
            &MarketOnCloseBroker::default(),
        )
        .unwrap_err();
        assert!(matches!(failure.error, EngineError::InvalidInput(_)));
        assert_eq!(failure.partial.steps, 0);
    }

    #[test]
    fn engine_wrapper_runs() {
        let engine = Engine::new(
            EngineConfig::new(100.0),
            Box::new(HoldCash),
            Box::new(MarketOnCloseBroker::default()),
        );
        assert_eq!(engine.config().initial_cash, 100.0);
        let result = engine.run(&[bar(1, "A", 1.0)]).unwrap();
        assert_eq!(result.final_equity(), Some(100.0));
    }
}
