//! Rebalance order produced by the engine.

use std::fmt;

use rust_decimal::Decimal;

use crate::{OrderType, Side};

/// A trade instruction handed to an order sink.
///
/// Built only by the engine when a currency's weight deviation reaches the
/// threshold. `quantity` is always strictly positive; direction is carried
/// by `side`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    /// Quote currency followed by base currency, e.g. `BTCUSDT`.
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
}

impl Order {
    /// Market order for `quantity` of `symbol`.
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
        }
    }

    /// Notional value of the order at `price`.
    #[inline]
    pub fn notional(&self, price: Decimal) -> Decimal {
        self.quantity * price
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.symbol, self.order_type, self.side, self.quantity
        )
    }
}
