//! Orders: trading intentions emitted by a strategy.

use super::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of an order, derived from the sign of its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Errors raised when constructing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order for '{symbol}' has zero quantity")]
    ZeroQuantity { symbol: String },

    #[error("order has an empty symbol")]
    EmptySymbol,

    #[error("order for '{symbol}' has quantity {quantity}, which has no opposite")]
    QuantityOutOfRange { symbol: String, quantity: i64 },
}

/// A market order for a whole number of shares.
///
/// Sign convention: `quantity > 0` buys, `quantity < 0` sells. Orders are
/// immutable values; producers must build them through [`Order::new`] so a
/// zero quantity never reaches the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub timestamp: Timestamp,
    pub symbol: String,
    pub quantity: i64,
    /// Free text for audit only.
    pub note: String,
}

impl Order {
    pub fn new(
        timestamp: Timestamp,
        symbol: impl Into<String>,
        quantity: i64,
        note: impl Into<String>,
    ) -> Result<Self, OrderError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(OrderError::EmptySymbol);
        }
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity { symbol });
        }
        if quantity == i64::MIN {
            return Err(OrderError::QuantityOutOfRange { symbol, quantity });
        }
        Ok(Self {
            timestamp,
            symbol,
            quantity,
            note: note.into(),
        })
    }

    pub fn side(&self) -> OrderSide {
        if self.quantity > 0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }

    pub fn is_buy(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_sell(&self) -> bool {
        self.quantity < 0
    }
}
