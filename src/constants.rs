use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Number of decimal places accepted for user-entered amounts.
pub const CURRENCY_DP: u32 = 2;

/// Balances below this magnitude count as settled for display purposes.
pub const SETTLED_EPSILON: Decimal = dec!(0.01);

/// Tolerance for the per-bill `sum(shares) + unclaimed == total` check.
/// Equal splits divide without redistributing the sub-cent remainder, so the
/// shares of e.g. a three-way 10.00 bill sum to a hair under the total.
pub const SHARE_TOLERANCE: Decimal = dec!(0.005);

/// Upper bound for a single bill, payment, or share amount.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000);
