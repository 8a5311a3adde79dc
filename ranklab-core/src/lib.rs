//! RankLab Core: daily cross-sectional backtesting engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, orders, fills, portfolio, price snapshots)
//! - Data grouping and validation for unordered bar sets
//! - Market-on-close broker with explicit skip outcomes
//! - Strategy trait and a top-K momentum strategy
//! - Day-by-day event loop producing an equity series and trade log

pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod strategy;
