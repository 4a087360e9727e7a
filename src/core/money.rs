use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CalcError, Result};

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Presentation rounding for money and percentages: two places, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| CalcError::Internal(format!("overflow multiplying {a} by {b}")))
}

pub(crate) fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| CalcError::Internal(format!("overflow adding {b} to {a}")))
}

pub(crate) fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_div(b)
        .ok_or_else(|| CalcError::Internal(format!("cannot divide {a} by {b}")))
}
