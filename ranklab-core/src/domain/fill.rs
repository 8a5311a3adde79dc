use super::order::OrderSide;
use super::Timestamp;
use serde::{Deserialize, Serialize};

/// Fill record: a completed execution of an entire order at one price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: Timestamp,
    pub symbol: String,
    /// Same sign convention as the originating order.
    pub quantity: i64,
    /// Finite and non-negative.
    pub price: f64,
    pub note: String,
}

impl Fill {
    pub fn side(&self) -> OrderSide {
        if self.quantity > 0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    /// Unsigned traded value.
    pub fn notional(&self) -> f64 {
        self.quantity.unsigned_abs() as f64 * self.price
    }

    /// Change to portfolio cash when this fill is applied.
    pub fn cash_delta(&self) -> f64 {
        -(self.quantity as f64 * self.price)
    }
}
