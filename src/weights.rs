//! Vector math over currency-keyed decimal maps.

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::DecimalMap;

/// Sum of all values. An empty map sums to zero.
pub fn sum(m: &DecimalMap) -> Decimal {
    m.values().sum()
}

/// Scale `m` so its values sum to one.
///
/// A map that already sums to exactly one is returned as is. A map summing
/// to zero cannot be scaled and yields [`Error::DegenerateWeights`].
pub fn normalize(m: DecimalMap) -> Result<DecimalMap> {
    let total = sum(&m);
    if total == Decimal::ONE {
        return Ok(m);
    }
    if total.is_zero() {
        return Err(Error::DegenerateWeights);
    }
    Ok(m.into_iter().map(|(k, v)| (k, v / total)).collect())
}

/// `m1[k] * m2[k]` for every key of `m1`; keys missing from `m2` count as zero.
///
/// Keys present only in `m2` are dropped, so the result always has exactly
/// the key set of `m1`.
pub fn elementwise_product(m1: &DecimalMap, m2: &DecimalMap) -> DecimalMap {
    m1.iter()
        .map(|(k, v)| {
            let other = m2.get(k).copied().unwrap_or(Decimal::ZERO);
            (k.clone(), *v * other)
        })
        .collect()
}
