//! RankLab Runner: configuration, composition and single-run orchestration.
//!
//! This crate builds on `ranklab-core` to provide:
//! - TOML backtest configuration with a content-addressed run id
//! - Strategy and broker composition from configuration
//! - A single-backtest runner with bar validation and metrics
//! - Tracing subscriber initialisation

pub mod config;
pub mod metrics;
pub mod obs;
pub mod runner;

pub use config::{
    BacktestConfig, BacktestSection, ConfigError, LogFormat, LoggingConfig, RunId, StrategyConfig,
};
pub use metrics::PerformanceMetrics;
pub use obs::init_tracing;
pub use runner::{build_strategy, run_backtest, BacktestResult, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
