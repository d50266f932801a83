//! Hooks into the engine's per-currency decisions.

use log::{debug, info};
use rust_decimal::Decimal;

use crate::order::Order;

/// One currency's inputs to the buy/sell/skip decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub symbol: String,
    pub price: Decimal,
    pub current_weight: Decimal,
    pub target_weight: Decimal,
    /// `target_weight - current_weight`
    pub deviation: Decimal,
}

/// Receives the engine's intermediate results.
///
/// Every method defaults to a no-op.
pub trait DecisionObserver {
    fn total_value(&self, _total: Decimal) {}

    fn evaluated(&self, _eval: &Evaluation) {}

    fn below_threshold(&self, _eval: &Evaluation, _threshold: Decimal) {}

    fn capped(&self, _order: &Order, _price: Decimal, _max_amount: Decimal) {}

    fn order(&self, _order: &Order) {}
}

/// Writes decisions to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl DecisionObserver for LogObserver {
    fn total_value(&self, total: Decimal) {
        info!("total value: {total}");
    }

    fn evaluated(&self, e: &Evaluation) {
        info!(
            "{} price: {}, current weight: {}, target weight: {}",
            e.symbol, e.price, e.current_weight, e.target_weight
        );
    }

    fn below_threshold(&self, e: &Evaluation, threshold: Decimal) {
        info!(
            "{} weight distance |{} - {}| = |{}| less than the threshold: {}",
            e.symbol, e.target_weight, e.current_weight, e.deviation, threshold
        );
    }

    fn capped(&self, order: &Order, price: Decimal, max_amount: Decimal) {
        debug!(
            "capped {} {} @ {} to {} by max amount {}",
            order.symbol, order.side, price, order.quantity, max_amount
        );
    }

    fn order(&self, order: &Order) {
        info!("generated order: {order}");
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl DecisionObserver for NullObserver {}
