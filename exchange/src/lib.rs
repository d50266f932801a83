//! Exchange trait and implementations for pvdot.
//!
//! Provides a generic `Exchange` trait covering the three things the
//! rebalancer needs from a venue: last trade prices, account balances and
//! market order submission. Implementations:
//!
//! - **Mock** ([`mock::MockExchange`]): scripted prices, balances and failures for tests
//! - **Binance** (feature `binance`): Binance spot REST API

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "binance")]
pub mod binance;

pub use error::{ExchangeError, Result};
pub use types::*;

use pvdot::{BalanceMap, Order, PriceSource};

/// A spot exchange connection.
///
/// Price lookups come from the [`PriceSource`] supertrait so an exchange can
/// be handed straight to [`pvdot::RebalanceEngine::rebalance`].
pub trait Exchange: PriceSource<Error = ExchangeError> {
    /// Connect to the exchange.
    fn connect(&mut self) -> Result<()>;

    /// Disconnect gracefully.
    fn disconnect(&mut self) -> Result<()>;

    /// Balances of every asset the account holds.
    fn balances(&self) -> Result<BalanceMap>;

    /// Submit an order. Returns the exchange-assigned order ID.
    fn submit_order(&self, order: &Order) -> Result<OrderId>;
}
