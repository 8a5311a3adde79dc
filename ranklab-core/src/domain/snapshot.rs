//! Per-timestamp views of the market: close prices and the full cross-section.

use super::{Bar, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of looking a symbol up in a [`PriceSnapshot`].
///
/// `Missing` (no bar today) and `Invalid` (a bar whose close is NaN,
/// infinite or negative) are distinct states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceLookup {
    Valid(f64),
    Invalid,
    Missing,
}

/// Close prices for one timestamp, keyed by symbol.
///
/// Entries may hold NaN; they are kept so that "known but invalid" stays
/// distinguishable from "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    closes: BTreeMap<String, f64>,
}

impl PriceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bars(bars: &[Bar]) -> Self {
        Self {
            closes: bars.iter().map(|b| (b.symbol.clone(), b.close)).collect(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, close: f64) {
        self.closes.insert(symbol.into(), close);
    }

    pub fn lookup(&self, symbol: &str) -> PriceLookup {
        match self.closes.get(symbol) {
            None => PriceLookup::Missing,
            Some(&p) if p.is_finite() && p >= 0.0 => PriceLookup::Valid(p),
            Some(_) => PriceLookup::Invalid,
        }
    }

    /// The close if it is usable for trading or valuation.
    pub fn valid_price(&self, symbol: &str) -> Option<f64> {
        match self.lookup(symbol) {
            PriceLookup::Valid(p) => Some(p),
            _ => None,
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.closes.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Everything available across symbols at a single timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub timestamp: Timestamp,
    /// Sorted by symbol.
    pub bars: Vec<Bar>,
    pub prices: PriceSnapshot,
}

impl CrossSection {
    /// Build a cross-section from bars that all share `timestamp`.
    pub fn new(timestamp: Timestamp, mut bars: Vec<Bar>) -> Self {
        bars.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let prices = PriceSnapshot::from_bars(&bars);
        Self {
            timestamp,
            bars,
            prices,
        }
    }

    pub fn bar(&self, symbol: &str) -> Option<&Bar> {
        self.bars
            .binary_search_by(|b| b.symbol.as_str().cmp(symbol))
            .ok()
            .map(|i| &self.bars[i])
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.bars.iter().map(|b| b.symbol.as_str())
    }
}
