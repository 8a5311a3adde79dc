//! Chronological timeline: bars grouped into one cross-section per day.

use super::DataError;
use crate::domain::{Bar, CrossSection, Timestamp};
use std::collections::BTreeMap;

/// Bars grouped by timestamp, ascending, one [`CrossSection`] per day.
///
/// Bars may arrive in any order; `(timestamp, symbol)` must be unique.
#[derive(Debug, Clone, Default)]
pub struct BarTimeline {
    sections: Vec<CrossSection>,
}

impl BarTimeline {
    pub fn from_bars(bars: &[Bar]) -> Result<Self, DataError> {
        let mut by_day: BTreeMap<Timestamp, BTreeMap<&str, &Bar>> = BTreeMap::new();
        for bar in bars {
            let day = by_day.entry(bar.timestamp).or_default();
            if day.insert(bar.symbol.as_str(), bar).is_some() {
                return Err(DataError::DuplicateBar {
                    timestamp: bar.timestamp,
                    symbol: bar.symbol.clone(),
                });
            }
        }

        let sections = by_day
            .into_iter()
            .map(|(ts, day)| CrossSection::new(ts, day.into_values().cloned().collect()))
            .collect();
        Ok(Self { sections })
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.sections.iter().map(|cs| cs.timestamp)
    }

    pub fn sections(&self) -> &[CrossSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
