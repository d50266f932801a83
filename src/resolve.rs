//! Price and quantity resolution for the currencies of a target allocation.

use std::fmt;

use log::debug;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::{BalanceMap, DecimalMap, PriceMap, QuantityMap, pair_symbol};

/// Last-trade price lookup for a trading pair symbol.
///
/// Implemented by exchange clients; lookups are blocking and carry no
/// retry of their own.
pub trait PriceSource {
    type Error: fmt::Display;

    /// Last trade price of `symbol` (e.g. `BTCUSDT`) in its quote currency.
    fn last_price(&self, symbol: &str) -> std::result::Result<Decimal, Self::Error>;
}

/// A fixed symbol → price table.
impl PriceSource for DecimalMap {
    type Error = String;

    fn last_price(&self, symbol: &str) -> std::result::Result<Decimal, String> {
        self.get(symbol)
            .copied()
            .ok_or_else(|| format!("no ticker for {symbol}"))
    }
}

/// Price every currency in `base` units.
///
/// The base currency is priced at exactly one without a lookup. Every other
/// currency is looked up as `currency + base`. The first failed lookup (or a
/// non-positive price) aborts resolution; remaining currencies are not queried.
pub fn resolve_prices<'a, P>(
    source: &P,
    currencies: impl IntoIterator<Item = &'a str>,
    base: &str,
) -> Result<PriceMap>
where
    P: PriceSource + ?Sized,
{
    let mut prices = PriceMap::new();
    for currency in currencies {
        if currency == base {
            prices.insert(currency.to_string(), Decimal::ONE);
            continue;
        }

        let symbol = pair_symbol(currency, base);
        let price = source
            .last_price(&symbol)
            .map_err(|e| Error::PriceLookup {
                symbol: symbol.clone(),
                reason: e.to_string(),
            })?;
        if price <= Decimal::ZERO {
            return Err(Error::InvalidPrice { symbol, price });
        }

        debug!("{symbol} last price {price}");
        prices.insert(currency.to_string(), price);
    }
    Ok(prices)
}

/// Held quantity of every currency.
///
/// With `ignore_locked` the total balance (available + locked) is used,
/// otherwise only the available part. Currencies without a balance entry
/// hold zero.
pub fn resolve_quantities<'a>(
    balances: &BalanceMap,
    currencies: impl IntoIterator<Item = &'a str>,
    ignore_locked: bool,
) -> QuantityMap {
    currencies
        .into_iter()
        .map(|currency| {
            let qty = match balances.get(currency) {
                Some(b) if ignore_locked => b.total(),
                Some(b) => b.available,
                None => Decimal::ZERO,
            };
            (currency.to_string(), qty)
        })
        .collect()
}
