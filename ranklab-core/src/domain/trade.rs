//! TradeLogEntry: append-only audit record of an applied fill.

use super::{Fill, Timestamp};
use serde::{Deserialize, Serialize};

/// One entry per applied fill, in fill order. Used for audit and reporting,
/// never for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub timestamp: Timestamp,
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
}

impl From<&Fill> for TradeLogEntry {
    fn from(fill: &Fill) -> Self {
        Self {
            timestamp: fill.timestamp,
            symbol: fill.symbol.clone(),
            quantity: fill.quantity,
            price: fill.price,
        }
    }
}
