//! Binance spot exchange implementation.

pub mod auth;
pub mod client;
pub mod types;

use std::collections::HashMap;

use log::info;
use pvdot::{BalanceMap, Order, PriceSource, Side};
use rust_decimal::Decimal;
use zeroize::Zeroizing;

use crate::Exchange;
use crate::error::{ExchangeError, Result};
use crate::types::OrderId;
use client::BinanceClient;
use types::LotRules;

/// Binance spot exchange implementing the generic Exchange trait.
///
/// Uses REST API for all operations. Blocking (sync) via reqwest::blocking.
/// Symbols are full trading pairs such as `BTCUSDT`.
pub struct BinanceExchange {
    api_key: String,
    secret_key: Zeroizing<String>,
    testnet: bool,
    client: Option<BinanceClient>,
    lot_rules: HashMap<String, LotRules>,
}

impl BinanceExchange {
    /// Create a new Binance exchange handle (not yet connected).
    pub fn new(api_key: &str, secret_key: &str, testnet: bool) -> Self {
        Self {
            api_key: api_key.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            testnet,
            client: None,
            lot_rules: HashMap::new(),
        }
    }

    /// Read API credentials from the named environment variables.
    pub fn from_env(api_key_var: &str, secret_key_var: &str, testnet: bool) -> Result<Self> {
        let api_key = std::env::var(api_key_var)
            .map_err(|_| ExchangeError::Auth(format!("{api_key_var} is not set")))?;
        let secret_key = Zeroizing::new(
            std::env::var(secret_key_var)
                .map_err(|_| ExchangeError::Auth(format!("{secret_key_var} is not set")))?,
        );
        Ok(Self::new(&api_key, &secret_key, testnet))
    }

    fn require_client(&self) -> Result<&BinanceClient> {
        self.client.as_ref().ok_or(ExchangeError::NotConnected)
    }

    /// Lot rules loaded at connect time.
    pub fn lot_rules(&self, symbol: &str) -> Result<&LotRules> {
        self.lot_rules
            .get(symbol)
            .ok_or_else(|| ExchangeError::InvalidSymbol(symbol.to_string()))
    }
}

impl PriceSource for BinanceExchange {
    type Error = ExchangeError;

    fn last_price(&self, symbol: &str) -> Result<Decimal> {
        let client = self.require_client()?;
        client.ticker_price(symbol)?.price()
    }
}

impl Exchange for BinanceExchange {
    fn connect(&mut self) -> Result<()> {
        let client = BinanceClient::new(&self.api_key, &self.secret_key, self.testnet);
        client.ping()?;
        self.lot_rules = client.exchange_info()?.lot_rules()?;
        self.client = Some(client);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.client = None;
        self.lot_rules.clear();
        Ok(())
    }

    fn balances(&self) -> Result<BalanceMap> {
        let client = self.require_client()?;
        client.account_info()?.balance_map()
    }

    fn submit_order(&self, order: &Order) -> Result<OrderId> {
        let client = self.require_client()?;
        let side = match order.side {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };
        let rules = self.lot_rules(&order.symbol)?;
        let quantity = rules.fit(&order.symbol, order.quantity)?;
        if rules.min_notional > Decimal::ZERO {
            let price = client.ticker_price(&order.symbol)?.price()?;
            rules.check_notional(&order.symbol, quantity, price)?;
        }

        let resp = client.submit_market_order(&order.symbol, side, &quantity.to_string())?;
        info!(
            "{} order {} {}: executed {} for {} quote",
            resp.symbol, resp.order_id, resp.status, resp.executed_qty, resp.cummulative_quote_qty
        );
        Ok(OrderId(resp.order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn not_connected_until_connect() {
        let exchange = BinanceExchange::new("key", "secret", true);
        assert!(matches!(exchange.balances(), Err(ExchangeError::NotConnected)));
        assert!(matches!(
            exchange.last_price("BTCUSDT"),
            Err(ExchangeError::NotConnected)
        ));
        let order = Order::market("BTCUSDT", Side::Buy, dec!(0.1));
        assert!(matches!(
            exchange.submit_order(&order),
            Err(ExchangeError::NotConnected)
        ));
    }

    #[test]
    fn no_lot_rules_before_connect() {
        let exchange = BinanceExchange::new("key", "secret", true);
        assert!(matches!(
            exchange.lot_rules("BTCUSDT"),
            Err(ExchangeError::InvalidSymbol(_))
        ));
    }
}
