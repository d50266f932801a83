//! Mock exchange for testing: implements the `Exchange` trait with configurable behavior.
//!
//! Use this in integration tests to simulate exchange responses without network calls.
//!
//! ```
//! use pvdot_exchange::mock::{MockExchange, FillMode};
//! use pvdot_exchange::Exchange;
//! use pvdot::PriceSource;
//! use rust_decimal_macros::dec;
//!
//! let mut exchange = MockExchange::builder()
//!     .fill_mode(FillMode::Accept)
//!     .with_price("BTCUSDT", dec!(20000))
//!     .with_balance("USDT", dec!(10000), dec!(0))
//!     .build();
//! exchange.connect().unwrap();
//! assert_eq!(exchange.last_price("BTCUSDT").unwrap(), dec!(20000));
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use pvdot::{Balance, BalanceMap, DecimalMap, Order, PriceSource};
use rust_decimal::Decimal;

use crate::Exchange;
use crate::error::{ExchangeError, Result};
use crate::types::OrderId;

/// How the mock exchange handles submitted orders.
#[derive(Clone, Debug)]
pub enum FillMode {
    /// Every order is accepted.
    Accept,
    /// Orders for this symbol are rejected, all others accepted.
    RejectSymbol(String),
    /// All orders are rejected.
    Reject,
}

/// Builder for `MockExchange`.
pub struct MockExchangeBuilder {
    fill_mode: FillMode,
    prices: DecimalMap,
    balances: BalanceMap,
    price_failures: BTreeMap<String, u32>,
    fail_balances: bool,
}

impl MockExchangeBuilder {
    pub fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fill_mode = mode;
        self
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_balance(mut self, asset: &str, available: Decimal, locked: Decimal) -> Self {
        self.balances
            .insert(asset.to_string(), Balance::new(available, locked));
        self
    }

    /// Fail the next `times` lookups of `symbol`, then answer normally.
    pub fn failing_price(mut self, symbol: &str, times: u32) -> Self {
        self.price_failures.insert(symbol.to_string(), times);
        self
    }

    /// Make every balance query fail.
    pub fn failing_balances(mut self) -> Self {
        self.fail_balances = true;
        self
    }

    pub fn build(self) -> MockExchange {
        MockExchange {
            connected: false,
            fill_mode: self.fill_mode,
            prices: self.prices,
            balances: self.balances,
            price_failures: Mutex::new(self.price_failures),
            fail_balances: self.fail_balances,
            next_order_id: AtomicU64::new(1),
            submitted_orders: Mutex::new(Vec::new()),
            price_queries: Mutex::new(Vec::new()),
        }
    }
}

/// A mock exchange that records submitted orders and returns configurable responses.
pub struct MockExchange {
    connected: bool,
    fill_mode: FillMode,
    prices: DecimalMap,
    balances: BalanceMap,
    price_failures: Mutex<BTreeMap<String, u32>>,
    fail_balances: bool,
    next_order_id: AtomicU64,
    submitted_orders: Mutex<Vec<Order>>,
    price_queries: Mutex<Vec<String>>,
}

impl MockExchange {
    pub fn builder() -> MockExchangeBuilder {
        MockExchangeBuilder {
            fill_mode: FillMode::Accept,
            prices: DecimalMap::new(),
            balances: BalanceMap::default(),
            price_failures: BTreeMap::new(),
            fail_balances: false,
        }
    }

    /// Get all orders that were submitted (for assertion in tests).
    pub fn submitted_orders(&self) -> Vec<Order> {
        self.submitted_orders.lock().unwrap().clone()
    }

    /// Every symbol whose price was requested, in request order.
    pub fn price_queries(&self) -> Vec<String> {
        self.price_queries.lock().unwrap().clone()
    }

    fn require_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ExchangeError::NotConnected)
        }
    }
}

impl PriceSource for MockExchange {
    type Error = ExchangeError;

    fn last_price(&self, symbol: &str) -> Result<Decimal> {
        self.require_connected()?;
        self.price_queries.lock().unwrap().push(symbol.to_string());

        if let Some(remaining) = self.price_failures.lock().unwrap().get_mut(symbol) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ExchangeError::Connection(format!(
                    "mock: ticker {symbol} unavailable"
                )));
            }
        }

        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::InvalidSymbol(symbol.to_string()))
    }
}

impl Exchange for MockExchange {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn balances(&self) -> Result<BalanceMap> {
        self.require_connected()?;
        if self.fail_balances {
            return Err(ExchangeError::Connection("mock: account unavailable".into()));
        }
        Ok(self.balances.clone())
    }

    fn submit_order(&self, order: &Order) -> Result<OrderId> {
        self.require_connected()?;

        // Record the order
        self.submitted_orders.lock().unwrap().push(order.clone());

        let rejected = match &self.fill_mode {
            FillMode::Accept => false,
            FillMode::RejectSymbol(symbol) => *symbol == order.symbol,
            FillMode::Reject => true,
        };
        if rejected {
            return Err(ExchangeError::Order(format!(
                "mock: order for {} rejected",
                order.symbol
            )));
        }

        Ok(OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed)))
    }
}
