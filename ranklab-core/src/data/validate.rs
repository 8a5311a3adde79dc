//! Bar-set quality checks run before a backtest.
//!
//! Duplicated `(timestamp, symbol)` keys are errors: the engine cannot
//! build a cross-section from them. Everything else is advisory. NaN or
//! otherwise broken prices are legitimate inputs that the broker and
//! valuation skip, so they are reported but never abort a run.

use super::DataError;
use crate::domain::{Bar, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single finding about one bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValidationIssue {
    DuplicateKey {
        timestamp: Timestamp,
        symbol: String,
    },
    NonFinitePrice {
        timestamp: Timestamp,
        symbol: String,
        field: &'static str,
    },
    NegativePrice {
        timestamp: Timestamp,
        symbol: String,
        field: &'static str,
        value: f64,
    },
    /// high < low, or open/close outside the high/low range.
    InconsistentRange {
        timestamp: Timestamp,
        symbol: String,
    },
    ZeroVolume {
        timestamp: Timestamp,
        symbol: String,
    },
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::DuplicateKey { .. } => Severity::Error,
            ValidationIssue::NonFinitePrice { .. }
            | ValidationIssue::NegativePrice { .. }
            | ValidationIssue::InconsistentRange { .. } => Severity::Warning,
            ValidationIssue::ZeroVolume { .. } => Severity::Info,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateKey { timestamp, symbol } => {
                write!(f, "{symbol} {timestamp}: duplicate bar")
            }
            ValidationIssue::NonFinitePrice {
                timestamp,
                symbol,
                field,
            } => write!(f, "{symbol} {timestamp}: {field} is not finite"),
            ValidationIssue::NegativePrice {
                timestamp,
                symbol,
                field,
                value,
            } => write!(f, "{symbol} {timestamp}: {field} is negative ({value})"),
            ValidationIssue::InconsistentRange { timestamp, symbol } => {
                write!(f, "{symbol} {timestamp}: OHLC outside high/low range")
            }
            ValidationIssue::ZeroVolume { timestamp, symbol } => {
                write!(f, "{symbol} {timestamp}: zero volume")
            }
        }
    }
}

/// Summary of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub bar_count: usize,
    pub symbol_count: usize,
    pub first_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity() == severity)
    }

    /// Turn error-severity findings into a [`DataError`].
    pub fn into_result(self) -> Result<Self, DataError> {
        let errors: Vec<String> = self
            .with_severity(Severity::Error)
            .map(|i| i.to_string())
            .collect();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(DataError::Validation(errors.join("; ")))
        }
    }
}

/// Check a bar set for duplicate keys and suspicious values.
pub fn validate_bars(bars: &[Bar]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen: HashSet<(Timestamp, &str)> = HashSet::with_capacity(bars.len());
    let mut symbols: BTreeSet<&str> = BTreeSet::new();

    for bar in bars {
        symbols.insert(bar.symbol.as_str());
        if !seen.insert((bar.timestamp, bar.symbol.as_str())) {
            issues.push(ValidationIssue::DuplicateKey {
                timestamp: bar.timestamp,
                symbol: bar.symbol.clone(),
            });
        }
        check_prices(bar, &mut issues);
        if bar.volume == 0 {
            issues.push(ValidationIssue::ZeroVolume {
                timestamp: bar.timestamp,
                symbol: bar.symbol.clone(),
            });
        }
    }

    ValidationReport {
        bar_count: bars.len(),
        symbol_count: symbols.len(),
        first_timestamp: bars.iter().map(|b| b.timestamp).min(),
        last_timestamp: bars.iter().map(|b| b.timestamp).max(),
        issues,
    }
}

fn check_prices(bar: &Bar, issues: &mut Vec<ValidationIssue>) {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ];
    let mut all_usable = true;
    for (field, value) in fields {
        if !value.is_finite() {
            all_usable = false;
            issues.push(ValidationIssue::NonFinitePrice {
                timestamp: bar.timestamp,
                symbol: bar.symbol.clone(),
                field,
            });
        } else if value < 0.0 {
            all_usable = false;
            issues.push(ValidationIssue::NegativePrice {
                timestamp: bar.timestamp,
                symbol: bar.symbol.clone(),
                field,
                value,
            });
        }
    }
    // Range checks only mean something once every field is a real price.
    if all_usable && !bar.is_sane() {
        issues.push(ValidationIssue::InconsistentRange {
            timestamp: bar.timestamp,
            symbol: bar.symbol.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(d: u32, symbol: &str, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            symbol: symbol.into(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn clean_bars_have_no_issues() {
        let report = validate_bars(&[bar(1, "A", 10.0), bar(2, "A", 11.0), bar(1, "B", 5.0)]);
        assert!(report.issues.is_empty());
        assert_eq!(report.bar_count, 3);
        assert_eq!(report.symbol_count, 2);
        assert_eq!(report.first_timestamp, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(report.last_timestamp, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn duplicate_key_is_an_error() {
        let report = validate_bars(&[bar(1, "A", 10.0), bar(1, "A", 10.5)]);
        assert!(report.has_errors());
        let err = report.into_result().unwrap_err();
        assert!(matches!(err, DataError::Validation(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn nan_close_is_a_warning_only() {
        let mut b = bar(1, "A", 10.0);
        b.close = f64::NAN;
        let report = validate_bars(&[b]);
        assert!(!report.has_errors());
        assert_eq!(report.with_severity(Severity::Warning).count(), 1);
        assert!(matches!(
            report.issues[0],
            ValidationIssue::NonFinitePrice { field: "close", .. }
        ));
    }

    #[test]
    fn inverted_range_and_zero_volume_are_reported() {
        let mut b = bar(1, "A", 10.0);
        b.high = 8.0;
        b.volume = 0;
        let report = validate_bars(&[b]);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.with_severity(Severity::Warning).count(), 1);
        assert_eq!(report.with_severity(Severity::Info).count(), 1);
    }

    #[test]
    fn negative_price_is_reported() {
        let mut b = bar(1, "A", 10.0);
        b.low = -2.0;
        let report = validate_bars(&[b]);
        assert!(matches!(
            report.issues[0],
            ValidationIssue::NegativePrice { field: "low", .. }
        ));
        assert_eq!(report.issues.len(), 1);
    }
}
