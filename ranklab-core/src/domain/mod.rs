//! Domain types for RankLab

pub mod bar;
pub mod fill;
pub mod invariant;
pub mod order;
pub mod portfolio;
pub mod snapshot;
pub mod trade;

pub use bar::Bar;
pub use fill::Fill;
pub use invariant::InvariantViolation;
pub use order::{Order, OrderError, OrderSide};
pub use portfolio::{EquityPoint, Portfolio};
pub use snapshot::{CrossSection, PriceLookup, PriceSnapshot};
pub use trade::TradeLogEntry;

/// Symbol type alias
pub type Symbol = String;

/// Daily bars are keyed by calendar date.
pub type Timestamp = chrono::NaiveDate;
