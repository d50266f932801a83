//! # pvdot
//!
//! A threshold rebalancing engine for spot accounts holding one base currency
//! (e.g. `USDT`) and a set of quote currencies (e.g. `BTC`, `ETH`).
//!
//! Each pass compares the account's current composition, measured as market
//! value per currency over total value, with a target weight map and emits
//! market orders for every currency whose weight is off by at least the
//! configured threshold.
//!
//! ## Quick Start
//!
//! ```
//! use pvdot::{Balance, BalanceMap, DecimalMap, EngineConfig, RebalanceEngine, Side, WeightMap};
//! use rust_decimal_macros::dec;
//!
//! let engine = RebalanceEngine::new(EngineConfig::new("USDT").with_threshold(dec!(0.05))).unwrap();
//!
//! let mut targets = WeightMap::new();
//! targets.insert("BTC".into(), dec!(0.6));
//! targets.insert("USDT".into(), dec!(0.4));
//!
//! // Any `PriceSource` works; a plain symbol → price table is one.
//! let mut tickers = DecimalMap::new();
//! tickers.insert("BTCUSDT".into(), dec!(20000));
//!
//! let mut balances = BalanceMap::default();
//! balances.insert("BTC".into(), Balance::new(dec!(0.5), dec!(0)));
//! balances.insert("USDT".into(), Balance::new(dec!(10000), dec!(0)));
//!
//! // BTC is 50% of a $20,000 account; the target is 60%.
//! let plan = engine.rebalance(&targets, &tickers, &balances).unwrap();
//! assert_eq!(plan.total_value, dec!(20000));
//! assert_eq!(plan.orders.len(), 1);
//! assert_eq!(plan.orders[0].symbol, "BTCUSDT");
//! assert_eq!(plan.orders[0].side, Side::Buy);
//! assert_eq!(plan.orders[0].quantity, dec!(0.1));
//! ```
//!
//! ## Decision Rule
//!
//! For every target currency `c` other than the base:
//!
//! | Step | Value |
//! |------|-------|
//! | deviation | `target[c] - current[c]` |
//! | skip | `abs(deviation) < threshold` |
//! | quantity | `abs(deviation * total_value / price[c])` |
//! | side | BUY if the deviation is positive, SELL otherwise |
//! | cap | `min(quantity, max_amount / price[c])` when `max_amount > 0` |
//!
//! ## Decimal Arithmetic
//!
//! All weights, prices and quantities are [`rust_decimal::Decimal`], so a
//! deviation that equals the threshold compares equal instead of landing a
//! rounding error away from it.

mod engine;
mod error;
pub mod observer;
mod order;
pub mod resolve;
mod side;
mod types;
pub mod weights;

pub use engine::{EngineConfig, Plan, RebalanceEngine};
pub use error::{Error, Result};
pub use observer::{DecisionObserver, Evaluation, LogObserver, NullObserver};
pub use order::Order;
pub use resolve::{PriceSource, resolve_prices, resolve_quantities};
pub use side::{OrderType, Side};
pub use types::{
    Balance, BalanceMap, Currency, DecimalMap, MarketValueMap, PriceMap, QuantityMap, WeightMap,
    pair_symbol,
};
