//! Threshold rebalancing engine: target weights in, market orders out.
//!
//! Compares the current composition of an account (market value per currency,
//! as a fraction of the total) with a target composition and emits the market
//! orders that close every gap at least as wide as the configured threshold.
//! The engine keeps no state between passes; each call allocates fresh maps.

use rust_decimal::Decimal;

use crate::Side;
use crate::error::{Error, Result};
use crate::observer::{DecisionObserver, Evaluation, LogObserver};
use crate::order::Order;
use crate::resolve::{PriceSource, resolve_prices, resolve_quantities};
use crate::types::{BalanceMap, MarketValueMap, PriceMap, QuantityMap, WeightMap, pair_symbol};
use crate::weights::{elementwise_product, normalize, sum};

/// Decision parameters, fixed for the lifetime of an engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Currency every price is denominated in. Never traded itself.
    pub base_currency: String,
    /// Minimum absolute weight deviation that triggers an order.
    pub threshold: Decimal,
    /// Count locked balance as held (total) instead of available only.
    pub ignore_locked: bool,
    /// Per-order notional cap in base units. Zero disables the cap.
    pub max_amount: Decimal,
}

impl EngineConfig {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into(),
            threshold: Decimal::ZERO,
            ignore_locked: false,
            max_amount: Decimal::ZERO,
        }
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_ignore_locked(mut self, ignore_locked: bool) -> Self {
        self.ignore_locked = ignore_locked;
        self
    }

    pub fn with_max_amount(mut self, max_amount: Decimal) -> Self {
        self.max_amount = max_amount;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_currency.is_empty() {
            return Err(Error::Config("base currency must not be empty".into()));
        }
        if self.threshold < Decimal::ZERO {
            return Err(Error::Config("threshold must be >= 0".into()));
        }
        if self.max_amount < Decimal::ZERO {
            return Err(Error::Config("max amount must be >= 0".into()));
        }
        Ok(())
    }
}

/// Everything computed during one rebalance pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub target_weights: WeightMap,
    pub prices: PriceMap,
    pub quantities: QuantityMap,
    pub market_values: MarketValueMap,
    pub current_weights: WeightMap,
    pub total_value: Decimal,
    /// In currency-symbol order.
    pub orders: Vec<Order>,
}

/// Stateless rebalancing core.
pub struct RebalanceEngine {
    config: EngineConfig,
    observer: Box<dyn DecisionObserver>,
}

impl std::fmt::Debug for RebalanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebalanceEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RebalanceEngine {
    /// Validate `config` and build an engine reporting to [`LogObserver`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: Box::new(LogObserver),
        })
    }

    /// Replace the observer receiving per-currency decisions.
    pub fn with_observer(mut self, observer: impl DecisionObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one full pass: price, weigh and diff every target currency.
    ///
    /// Target weights are re-normalized first (a no-op when they already sum
    /// to one). Price resolution short-circuits on the first failed lookup,
    /// in which case no orders are produced. Missing balances count as zero.
    pub fn rebalance<P>(
        &self,
        targets: &WeightMap,
        prices: &P,
        balances: &BalanceMap,
    ) -> Result<Plan>
    where
        P: PriceSource + ?Sized,
    {
        let base = self.config.base_currency.as_str();
        let target_weights = normalize(targets.clone())?;

        let currencies = || target_weights.keys().map(String::as_str);
        let prices = resolve_prices(prices, currencies(), base)?;
        let quantities = resolve_quantities(balances, currencies(), self.config.ignore_locked);
        let market_values = elementwise_product(&prices, &quantities);

        let total_value = sum(&market_values);
        let current_weights =
            normalize(market_values.clone()).map_err(|_| Error::ZeroPortfolioValue)?;

        let orders = self.generate_orders(&target_weights, &prices, &current_weights, total_value)?;

        Ok(Plan {
            target_weights,
            prices,
            quantities,
            market_values,
            current_weights,
            total_value,
            orders,
        })
    }

    /// Diff `targets` against `current` weights and size the orders.
    ///
    /// `total_value` is the portfolio value in base units that the weights
    /// are fractions of. The base currency is skipped. Orders are emitted in
    /// currency-symbol order.
    pub fn generate_orders(
        &self,
        targets: &WeightMap,
        prices: &PriceMap,
        current: &WeightMap,
        total_value: Decimal,
    ) -> Result<Vec<Order>> {
        let base = self.config.base_currency.as_str();
        self.observer.total_value(total_value);

        let mut orders = Vec::new();
        for (currency, &target_weight) in targets {
            if currency == base {
                continue;
            }

            let symbol = pair_symbol(currency, base);
            let price = prices
                .get(currency)
                .copied()
                .ok_or_else(|| Error::MissingPrice(currency.clone()))?;
            if price <= Decimal::ZERO {
                return Err(Error::InvalidPrice { symbol, price });
            }

            let current_weight = current.get(currency).copied().unwrap_or(Decimal::ZERO);
            let eval = Evaluation {
                symbol,
                price,
                current_weight,
                target_weight,
                deviation: target_weight - current_weight,
            };
            self.observer.evaluated(&eval);

            // Strict: a deviation equal to the threshold still trades.
            if eval.deviation.abs() < self.config.threshold {
                self.observer.below_threshold(&eval, self.config.threshold);
                continue;
            }

            let raw = eval.deviation * total_value / price;
            if raw.is_zero() {
                continue;
            }
            let side = if raw.is_sign_negative() {
                Side::Sell
            } else {
                Side::Buy
            };

            let mut order = Order::market(eval.symbol, side, raw.abs());
            if let Some(capped) = cap_quantity(order.quantity, price, self.config.max_amount) {
                order.quantity = capped;
                self.observer.capped(&order, price, self.config.max_amount);
            }

            self.observer.order(&order);
            orders.push(order);
        }

        Ok(orders)
    }
}

/// Shrink `quantity` so that `quantity * price <= max_amount`.
///
/// Returns `None` when no cap applies: `max_amount` is zero (unbounded) or
/// the order is already within it.
fn cap_quantity(quantity: Decimal, price: Decimal, max_amount: Decimal) -> Option<Decimal> {
    if max_amount <= Decimal::ZERO || quantity * price <= max_amount {
        return None;
    }
    Some(max_amount / price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use crate::types::{Balance, DecimalMap};
    use rust_decimal_macros::dec;

    fn map(entries: &[(&str, Decimal)]) -> DecimalMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn engine(threshold: Decimal, max_amount: Decimal) -> RebalanceEngine {
        RebalanceEngine::new(
            EngineConfig::new("USDT")
                .with_threshold(threshold)
                .with_max_amount(max_amount),
        )
        .unwrap()
        .with_observer(NullObserver)
    }

    #[test]
    fn config_rejects_negative_threshold() {
        let cfg = EngineConfig::new("USDT").with_threshold(dec!(-0.01));
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
        assert!(RebalanceEngine::new(cfg).is_err());
    }

    #[test]
    fn config_rejects_negative_max_amount() {
        let cfg = EngineConfig::new("USDT").with_max_amount(dec!(-1));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_rejects_empty_base() {
        assert!(EngineConfig::new("").validate().is_err());
    }

    #[test]
    fn config_accepts_zero_bounds() {
        assert!(EngineConfig::new("USDT").validate().is_ok());
    }

    #[test]
    fn buy_when_underweight() {
        let e = engine(dec!(0.05), Decimal::ZERO);
        let orders = e
            .generate_orders(
                &map(&[("BTC", dec!(0.6)), ("USDT", dec!(0.4))]),
                &map(&[("BTC", dec!(20000)), ("USDT", dec!(1))]),
                &map(&[("BTC", dec!(0.5)), ("USDT", dec!(0.5))]),
                dec!(40000),
            )
            .unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].symbol, "BTCUSDT");
        assert_eq!(orders[0].side, Side::Buy);
        // 0.1 * 40000 / 20000
        assert_eq!(orders[0].quantity, dec!(0.2));
    }

    #[test]
    fn sell_when_overweight() {
        let e = engine(dec!(0.05), Decimal::ZERO);
        let orders = e
            .generate_orders(
                &map(&[("ETH", dec!(0.2)), ("USDT", dec!(0.8))]),
                &map(&[("ETH", dec!(2000)), ("USDT", dec!(1))]),
                &map(&[("ETH", dec!(0.5)), ("USDT", dec!(0.5))]),
                dec!(10000),
            )
            .unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Sell);
        // |-0.3| * 10000 / 2000
        assert_eq!(orders[0].quantity, dec!(1.5));
    }

    #[test]
    fn threshold_is_inclusive() {
        let targets = map(&[("BTC", dec!(0.6)), ("USDT", dec!(0.4))]);
        let prices = map(&[("BTC", dec!(100)), ("USDT", dec!(1))]);
        let current = map(&[("BTC", dec!(0.5)), ("USDT", dec!(0.5))]);

        let at = engine(dec!(0.1), Decimal::ZERO)
            .generate_orders(&targets, &prices, &current, dec!(1000))
            .unwrap();
        assert_eq!(at.len(), 1);

        let above = engine(dec!(0.10001), Decimal::ZERO)
            .generate_orders(&targets, &prices, &current, dec!(1000))
            .unwrap();
        assert!(above.is_empty());
    }

    #[test]
    fn max_amount_caps_notional() {
        let e = engine(Decimal::ZERO, dec!(500));
        let orders = e
            .generate_orders(
                &map(&[("BTC", dec!(1))]),
                &map(&[("BTC", dec!(250))]),
                &map(&[("BTC", dec!(0))]),
                dec!(10000),
            )
            .unwrap();

        // uncapped would be 40
        assert_eq!(orders[0].quantity, dec!(2));
        assert!(orders[0].notional(dec!(250)) <= dec!(500));
    }

    #[test]
    fn max_amount_never_grows_quantity() {
        assert_eq!(cap_quantity(dec!(1), dec!(100), dec!(500)), None);
        assert_eq!(cap_quantity(dec!(10), dec!(100), dec!(0)), None);
        assert_eq!(cap_quantity(dec!(10), dec!(100), dec!(500)), Some(dec!(5)));
    }

    #[test]
    fn base_currency_never_traded() {
        let e = engine(Decimal::ZERO, Decimal::ZERO);
        let orders = e
            .generate_orders(
                &map(&[("BTC", dec!(0.5)), ("USDT", dec!(0.5))]),
                &map(&[("BTC", dec!(10)), ("USDT", dec!(1))]),
                &map(&[("BTC", dec!(0)), ("USDT", dec!(1))]),
                dec!(100),
            )
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders.iter().all(|o| o.symbol != "USDTUSDT"));
    }

    #[test]
    fn zero_deviation_emits_nothing_even_at_zero_threshold() {
        let e = engine(Decimal::ZERO, Decimal::ZERO);
        let w = map(&[("BTC", dec!(0.5)), ("USDT", dec!(0.5))]);
        let orders = e
            .generate_orders(&w, &map(&[("BTC", dec!(10))]), &w, dec!(100))
            .unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn missing_price_is_error() {
        let e = engine(Decimal::ZERO, Decimal::ZERO);
        let err = e
            .generate_orders(
                &map(&[("BTC", dec!(1))]),
                &DecimalMap::new(),
                &DecimalMap::new(),
                dec!(100),
            )
            .unwrap_err();
        assert_eq!(err, Error::MissingPrice("BTC".into()));
    }

    #[test]
    fn rebalance_full_pass() {
        let e = engine(dec!(0.05), Decimal::ZERO);
        let tickers = map(&[("BTCUSDT", dec!(20000))]);
        let mut balances = BalanceMap::default();
        balances.insert("BTC".into(), Balance::new(dec!(0.5), dec!(0)));
        balances.insert("USDT".into(), Balance::new(dec!(10000), dec!(0)));

        let plan = e
            .rebalance(
                &map(&[("BTC", dec!(0.6)), ("USDT", dec!(0.4))]),
                &tickers,
                &balances,
            )
            .unwrap();

        assert_eq!(plan.total_value, dec!(20000));
        assert_eq!(plan.current_weights["BTC"], dec!(0.5));
        assert_eq!(plan.market_values["USDT"], dec!(10000));
        assert_eq!(plan.orders, vec![Order::market("BTCUSDT", Side::Buy, dec!(0.1))]);
    }

    #[test]
    fn rebalance_renormalizes_targets() {
        let e = engine(dec!(0.05), Decimal::ZERO);
        let tickers = map(&[("BTCUSDT", dec!(20000))]);
        let mut balances = BalanceMap::default();
        balances.insert("BTC".into(), Balance::new(dec!(0.5), dec!(0)));
        balances.insert("USDT".into(), Balance::new(dec!(10000), dec!(0)));

        // 6:4 is the same allocation as 0.6:0.4
        let plan = e
            .rebalance(&map(&[("BTC", dec!(6)), ("USDT", dec!(4))]), &tickers, &balances)
            .unwrap();
        assert_eq!(plan.target_weights["BTC"], dec!(0.6));
        assert_eq!(plan.orders[0].quantity, dec!(0.1));
    }

    #[test]
    fn rebalance_empty_account_is_error() {
        let e = engine(Decimal::ZERO, Decimal::ZERO);
        let err = e
            .rebalance(
                &map(&[("BTC", dec!(0.5)), ("USDT", dec!(0.5))]),
                &map(&[("BTCUSDT", dec!(20000))]),
                &BalanceMap::default(),
            )
            .unwrap_err();
        assert_eq!(err, Error::ZeroPortfolioValue);
    }

    #[test]
    fn rebalance_zero_targets_is_error() {
        let e = engine(Decimal::ZERO, Decimal::ZERO);
        let err = e
            .rebalance(
                &map(&[("BTC", dec!(0))]),
                &DecimalMap::new(),
                &BalanceMap::default(),
            )
            .unwrap_err();
        assert_eq!(err, Error::DegenerateWeights);
    }
}
