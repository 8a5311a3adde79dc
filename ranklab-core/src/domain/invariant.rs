//! Fatal invariant breaches: defects in an upstream collaborator, never
//! recoverable runtime states.

use super::Timestamp;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("cash went negative ({cash}) after applying fills on {timestamp}")]
    NegativeCash { timestamp: Timestamp, cash: f64 },

    #[error("equity timestamp {current} is not after the previous mark {previous}")]
    NonMonotonicTimestamp {
        previous: Timestamp,
        current: Timestamp,
    },

    #[error("zero-quantity order for '{symbol}' on {timestamp} reached the broker")]
    ZeroQuantityOrder { timestamp: Timestamp, symbol: String },

    #[error("invalid fill for '{symbol}' on {timestamp}: {reason}")]
    InvalidFill {
        timestamp: Timestamp,
        symbol: String,
        reason: String,
    },
}
