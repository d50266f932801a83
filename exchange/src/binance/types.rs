//! Binance-specific API response types.

use std::collections::HashMap;
use std::str::FromStr;

use pvdot::{Balance, BalanceMap};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::error::{ExchangeError, Result};

/// Binance account balance entry.
#[derive(Debug, Deserialize)]
pub struct BalanceInfo {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

/// Binance account info response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub balances: Vec<BalanceInfo>,
    #[serde(default)]
    pub can_trade: bool,
}

impl AccountInfo {
    /// Balances keyed by asset. Assets with nothing free or locked are dropped.
    pub fn balance_map(&self) -> Result<BalanceMap> {
        let mut balances = BalanceMap::default();
        for b in &self.balances {
            let balance = Balance::new(
                parse_decimal("free", &b.free)?,
                parse_decimal("locked", &b.locked)?,
            );
            if balance.total().is_zero() {
                continue;
            }
            balances.insert(b.asset.clone(), balance);
        }
        Ok(balances)
    }
}

/// Binance order response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    pub status: String,
    pub executed_qty: String,
    #[serde(default)]
    pub cummulative_quote_qty: String,
}

/// Binance latest price response (GET /api/v3/ticker/price).
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

impl TickerPrice {
    pub fn price(&self) -> Result<Decimal> {
        parse_decimal("price", &self.price)
    }
}

/// Exchange trading rules (GET /api/v3/exchangeInfo), trimmed to the filters
/// that shape a market order quantity.
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

/// One entry of a symbol's `filters` array. Fields absent from a filter type
/// stay `None`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    pub min_qty: Option<String>,
    pub step_size: Option<String>,
    pub min_notional: Option<String>,
}

impl ExchangeInfo {
    /// Lot rules of every listed symbol.
    pub fn lot_rules(&self) -> Result<HashMap<String, LotRules>> {
        self.symbols
            .iter()
            .map(|s| Ok((s.symbol.clone(), s.lot_rules()?)))
            .collect()
    }
}

impl SymbolInfo {
    pub fn lot_rules(&self) -> Result<LotRules> {
        let mut rules = LotRules::default();
        for f in &self.filters {
            match f.filter_type.as_str() {
                "LOT_SIZE" => {
                    if let Some(v) = &f.step_size {
                        rules.step_size = parse_decimal("stepSize", v)?;
                    }
                    if let Some(v) = &f.min_qty {
                        rules.min_qty = parse_decimal("minQty", v)?;
                    }
                }
                "MIN_NOTIONAL" | "NOTIONAL" => {
                    if let Some(v) = &f.min_notional {
                        rules.min_notional = parse_decimal("minNotional", v)?;
                    }
                }
                _ => {}
            }
        }
        Ok(rules)
    }
}

/// Decimal places Binance accepts on order quantities.
const QUANTITY_DP: u32 = 8;

/// Quantity constraints of one symbol. Zero means "no constraint".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LotRules {
    pub step_size: Decimal,
    pub min_qty: Decimal,
    pub min_notional: Decimal,
}

impl LotRules {
    /// Round `quantity` down to a whole number of steps, or to
    /// [`QUANTITY_DP`] places when the symbol has no step size.
    pub fn truncate(&self, quantity: Decimal) -> Decimal {
        let q = if self.step_size > Decimal::ZERO {
            (quantity / self.step_size).trunc() * self.step_size
        } else {
            quantity.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero)
        };
        q.normalize()
    }

    /// Truncated `quantity` of `symbol`, or an order error when nothing
    /// tradable is left or it falls below the minimum quantity.
    pub fn fit(&self, symbol: &str, quantity: Decimal) -> Result<Decimal> {
        let q = self.truncate(quantity);
        if q <= Decimal::ZERO {
            return Err(ExchangeError::Order(format!(
                "{symbol} quantity {quantity} rounds to zero at step {}",
                self.step_size
            )));
        }
        if q < self.min_qty {
            return Err(ExchangeError::Order(format!(
                "{symbol} quantity {q} is below the minimum {}",
                self.min_qty
            )));
        }
        Ok(q)
    }

    /// Reject orders whose value at `price` is below the minimum notional.
    pub fn check_notional(&self, symbol: &str, quantity: Decimal, price: Decimal) -> Result<()> {
        let notional = quantity * price;
        if notional < self.min_notional {
            return Err(ExchangeError::Order(format!(
                "{symbol} notional {notional} is below the minimum {}",
                self.min_notional
            )));
        }
        Ok(())
    }
}

/// Parse one of Binance's decimal strings (e.g. `"0.00100000"`).
pub fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|_| ExchangeError::Parse {
        field,
        value: value.to_string(),
    })
}
