//! Amount validation and display formatting.
//!
//! All money in the crate is [`rust_decimal::Decimal`]. User-entered amounts
//! are capped at two decimal places on the way in; engine-computed shares may
//! carry more precision (an equal three-way split of 10.00 keeps the
//! repeating digits instead of inventing a rounding rule).

use rust_decimal::Decimal;

use crate::constants::{CURRENCY_DP, MAX_AMOUNT, SETTLED_EPSILON};
use crate::error::LedgerError;

/// Validates a bill total or payment amount: strictly positive, at most
/// [`CURRENCY_DP`] decimal places, at most [`MAX_AMOUNT`].
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    validate_share(amount)
}

/// Validates a manually assigned share. Zero is allowed so a participant can
/// stay on a bill without owing anything.
pub fn validate_share(amount: Decimal) -> Result<(), LedgerError> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must not be negative, got {amount}"
        )));
    }
    if amount.normalize().scale() > CURRENCY_DP {
        return Err(LedgerError::InvalidAmount(format!(
            "amount {amount} has more than {CURRENCY_DP} decimal places"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::InvalidAmount(format!(
            "amount {amount} exceeds the maximum of {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Parses a user-entered amount. The caller decides whether zero or the cap
/// are acceptable; this only turns text into a number.
pub fn parse_amount(input: &str) -> Result<Decimal, LedgerError> {
    input
        .trim()
        .parse::<Decimal>()
        .map_err(|_| LedgerError::InvalidInput(input.to_string()))
}

/// Renders an amount for humans: whole numbers without decimals, everything
/// else rounded to two places.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(CURRENCY_DP);
    if rounded.fract().is_zero() {
        rounded.trunc().to_string()
    } else {
        format!("{rounded:.2}")
    }
}

/// Whether a balance is too small to chase anyone for.
pub fn is_settled(amount: Decimal) -> bool {
    amount.abs() < SETTLED_EPSILON
}
