//! Errors raised by the rebalancing core.

use rust_decimal::Decimal;

/// All errors the decision core can report.
///
/// Every variant is fatal for the current tick only; nothing here describes
/// a condition that outlives a single rebalance pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid engine config: {0}")]
    Config(String),

    #[error("weights sum to zero, cannot normalize")]
    DegenerateWeights,

    #[error("portfolio has zero total value")]
    ZeroPortfolioValue,

    #[error("price lookup for {symbol} failed: {reason}")]
    PriceLookup { symbol: String, reason: String },

    #[error("non-positive price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: Decimal },

    #[error("no price resolved for {0}")]
    MissingPrice(String),
}

impl Error {
    /// True for failures of the price-resolution step.
    pub fn is_price_error(&self) -> bool {
        matches!(
            self,
            Error::PriceLookup { .. } | Error::InvalidPrice { .. } | Error::MissingPrice(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display() {
        let err = Error::PriceLookup {
            symbol: "BTCUSDT".into(),
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "price lookup for BTCUSDT failed: timeout");
        assert_eq!(
            Error::InvalidPrice {
                symbol: "ETHUSDT".into(),
                price: dec!(0)
            }
            .to_string(),
            "non-positive price 0 for ETHUSDT"
        );
    }

    #[test]
    fn price_error_classification() {
        assert!(Error::MissingPrice("BTC".into()).is_price_error());
        assert!(!Error::ZeroPortfolioValue.is_price_error());
        assert!(!Error::DegenerateWeights.is_price_error());
    }
}
