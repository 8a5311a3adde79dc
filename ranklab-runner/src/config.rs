//! Serializable backtest configuration.
//!
//! ```toml
//! [backtest]
//! initial_cash = 100000.0
//! allow_short = false
//!
//! [strategy]
//! type = "MOMENTUM"
//! lookback_days = 20
//! top_k = 5
//! dollar_per_position = 10000.0
//!
//! [logging]
//! level = "info"
//! ```

use ranklab_core::engine::EngineConfig;
use ranklab_core::execution::BrokerConfig;
use ranklab_core::strategy::MomentumParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce a backtest apart from the bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BacktestSection {
    pub initial_cash: f64,
    /// Permit sells beyond the held long position.
    #[serde(default)]
    pub allow_short: bool,
}

/// Strategy selection (serializable enum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Top-K cross-sectional momentum.
    Momentum(MomentumParams),

    /// Never trades; equity stays at initial cash.
    HoldCash,
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::Momentum(_) => "momentum",
            StrategyConfig::HoldCash => "hold_cash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `"info"` or `"ranklab_core=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

impl BacktestConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if let StrategyConfig::Momentum(params) = &self.strategy {
            params
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_cash)
    }

    pub fn broker_config(&self) -> BrokerConfig {
        BrokerConfig {
            allow_short: self.backtest.allow_short,
        }
    }

    /// Deterministic hash of the run-relevant settings. Logging is excluded,
    /// so changing verbosity does not change the id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(&(&self.backtest, &self.strategy))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
initial_cash = 10000.0

[strategy]
type = "MOMENTUM"
lookback_days = 2
top_k = 1
dollar_per_position = 1000.0
"#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = BacktestConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.backtest.initial_cash, 10_000.0);
        assert!(!config.backtest.allow_short);
        assert_eq!(
            config.strategy,
            StrategyConfig::Momentum(MomentumParams {
                lookback_days: 2,
                top_k: 1,
                dollar_per_position: 1_000.0,
            })
        );
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn missing_momentum_fields_take_defaults() {
        let text = "[backtest]\ninitial_cash = 1.0\n[strategy]\ntype = \"MOMENTUM\"\ntop_k = 3\n";
        let config = BacktestConfig::from_toml(text).unwrap();
        let StrategyConfig::Momentum(params) = config.strategy else {
            panic!("expected momentum");
        };
        assert_eq!(params.top_k, 3);
        assert_eq!(params.lookback_days, MomentumParams::default().lookback_days);
    }

    #[test]
    fn hold_cash_strategy_parses() {
        let text = "[backtest]\ninitial_cash = 5.0\n[strategy]\ntype = \"HOLD_CASH\"\n";
        let config = BacktestConfig::from_toml(text).unwrap();
        assert_eq!(config.strategy.name(), "hold_cash");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let negative = SAMPLE.replace("10000.0", "-1.0");
        assert!(matches!(
            BacktestConfig::from_toml(&negative),
            Err(ConfigError::Invalid(_))
        ));

        let zero_k = SAMPLE.replace("top_k = 1", "top_k = 0");
        let err = BacktestConfig::from_toml(&zero_k).unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn unknown_fields_and_types_fail_to_parse() {
        let typo = SAMPLE.replace("initial_cash", "initial_capital");
        assert!(matches!(BacktestConfig::from_toml(&typo), Err(ConfigError::Parse(_))));

        let unknown = SAMPLE.replace("MOMENTUM", "MEAN_REVERSION");
        assert!(matches!(BacktestConfig::from_toml(&unknown), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn run_id_ignores_logging() {
        let a = BacktestConfig::from_toml(SAMPLE).unwrap();
        let mut b = a.clone();
        b.logging.level = "trace".into();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());

        let mut c = a.clone();
        c.backtest.allow_short = true;
        assert_ne!(a.run_id().unwrap(), c.run_id().unwrap());
        assert_eq!(a.run_id().unwrap().len(), 64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BacktestConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
