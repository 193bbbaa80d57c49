// ============================================================================
// Minor-Unit Arithmetic
// ============================================================================

use super::errors::{NumericError, NumericResult};

/// Reject zero and negative amounts.
#[inline]
pub fn ensure_positive(value: i64) -> NumericResult<i64> {
    if value > 0 {
        Ok(value)
    } else {
        Err(NumericError::NonPositive)
    }
}

/// Quote-currency value of a fill: `price * quantity`.
///
/// # Errors
/// `NonPositive` if either factor is not positive, `Overflow` if the product
/// does not fit in an i64.
#[inline]
pub fn checked_notional(price: i64, quantity: i64) -> NumericResult<i64> {
    ensure_positive(price)?;
    ensure_positive(quantity)?;
    price.checked_mul(quantity).ok_or(NumericError::Overflow)
}

/// Add `amount` to a balance.
#[inline]
pub fn checked_credit(balance: i64, amount: i64) -> NumericResult<i64> {
    balance.checked_add(amount).ok_or(NumericError::Overflow)
}

/// Subtract `amount` from a balance. Balances never go below zero.
#[inline]
pub fn checked_debit(balance: i64, amount: i64) -> NumericResult<i64> {
    match balance.checked_sub(amount) {
        Some(result) if result >= 0 => Ok(result),
        _ => Err(NumericError::Underflow),
    }
}
