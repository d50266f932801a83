//! Core types: currency-keyed maps and account balances.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

/// Currency symbol, e.g. `"BTC"` or `"USDT"`.
pub type Currency = String;

/// Ordered `currency → decimal` association.
///
/// Keyed by currency symbol in sorted order so every pass over a map (and
/// therefore every log line and emitted order) is deterministic.
pub type DecimalMap = BTreeMap<Currency, Decimal>;

/// Target or current composition: `currency → fraction of portfolio value`.
pub type WeightMap = DecimalMap;

/// `currency → price denominated in the base currency`.
pub type PriceMap = DecimalMap;

/// `currency → quantity held`.
pub type QuantityMap = DecimalMap;

/// `currency → price * quantity`, in base-currency units.
pub type MarketValueMap = DecimalMap;

/// Account balances keyed by asset, as reported by an exchange.
pub type BalanceMap = FxHashMap<Currency, Balance>;

/// Balance of a single asset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Balance {
    /// Free to trade.
    pub available: Decimal,
    /// Reserved by open orders.
    pub locked: Decimal,
}

impl Balance {
    pub fn new(available: Decimal, locked: Decimal) -> Self {
        Self { available, locked }
    }

    /// Available plus locked.
    #[inline]
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }
}

/// Trading pair symbol for `currency` quoted in `base`, e.g. `BTC` + `USDT` → `BTCUSDT`.
#[inline]
pub fn pair_symbol(currency: &str, base: &str) -> String {
    format!("{currency}{base}")
}
