//! pvdot-rebalancer: interval-driven spot portfolio rebalancer.
//!
//! Reads target weights (fixed in the config or from a JSON file), fetches
//! balances and last prices from the exchange, lets the pvdot engine decide
//! which market orders close the weight gap, and submits them, with an
//! audit trail of every tick.

pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
pub mod interval;
pub mod notify;
pub mod target;
