//! Fixed-point money utilities.
//!
//! ## Overview
//!
//! All monetary amounts in brickshare use fixed-point representation to
//! avoid floating-point errors. Amounts are stored as u64 scaled by 10^8,
//! so one unit of `Money` is 10^-8 of the underlying currency.
//!
//! Share counts are plain (unscaled) u64 values; only money is scaled.
//!
//! ## Why Fixed-Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware, breaking determinism and accounting identities. Fixed-point
//! ensures identical results everywhere, and floor division guarantees
//! that proportional splits never exceed the amount being split.
//!
//! ## Examples
//!
//! ```
//! use brickshare::types::money::{to_money, from_money, order_cost};
//!
//! // 5.00 per share, 100 shares -> 500.00
//! let price = to_money("5.00").unwrap();
//! let cost = order_cost(price, 100).unwrap();
//! assert_eq!(from_money(cost), "500.00000000");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Monetary amount in smallest units (fixed-point, scaled by [`SCALE`]).
pub type Money = u64;

/// Scaling factor for fixed-point money: 10^8
///
/// This provides 8 decimal places of precision.
pub const SCALE: u64 = 100_000_000;

/// Basis-point denominator: 100% == 10_000 bps
pub const BPS_DENOM: u64 = 10_000;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string to fixed-point money
///
/// # Example
///
/// ```
/// use brickshare::types::money::to_money;
///
/// assert_eq!(to_money("1.0"), Some(100_000_000));
/// assert_eq!(to_money("500.00"), Some(50_000_000_000));
/// assert_eq!(to_money("0.00000001"), Some(1));
/// ```
pub fn to_money(s: &str) -> Option<Money> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_money(decimal)
}

/// Convert a Decimal to fixed-point money
///
/// Returns `None` if the value is negative or out of range.
pub fn decimal_to_money(d: Decimal) -> Option<Money> {
    if d.is_sign_negative() {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(SCALE))?;
    let rounded = scaled.round_dp(0);
    rounded.to_u64()
}

/// Convert fixed-point money to a Decimal
pub fn money_to_decimal(value: Money) -> Decimal {
    Decimal::from(value) / Decimal::from(SCALE)
}

/// Convert fixed-point money to a string with 8 decimal places
///
/// # Example
///
/// ```
/// use brickshare::types::money::from_money;
///
/// assert_eq!(from_money(100_000_000), "1.00000000");
/// assert_eq!(from_money(49_500_000_000), "495.00000000");
/// ```
pub fn from_money(value: Money) -> String {
    let decimal = money_to_decimal(value);
    format!("{:.8}", decimal)
}

/// Convert fixed-point money to a human-readable string (trailing zeros trimmed)
///
/// # Example
///
/// ```
/// use brickshare::types::money::from_money_trimmed;
///
/// assert_eq!(from_money_trimmed(100_000_000), "1");
/// assert_eq!(from_money_trimmed(150_000_000), "1.5");
/// ```
pub fn from_money_trimmed(value: Money) -> String {
    let decimal = money_to_decimal(value);
    format!("{}", decimal.normalize())
}

// ============================================================================
// Settlement Arithmetic
// ============================================================================
//
// Products and quotients go through u128 intermediates. Division always
// floors, so proportional splits satisfy sum(parts) <= whole.

/// Cost of a share leg: `price_per_share * shares`
///
/// `price_per_share` is fixed-point money, `shares` is an unscaled count,
/// so the product is already correctly scaled.
///
/// Returns `None` on overflow.
///
/// # Example
///
/// ```
/// use brickshare::types::money::{to_money, order_cost};
///
/// let price = to_money("5.00").unwrap();
/// assert_eq!(order_cost(price, 100), Some(to_money("500.00").unwrap()));
/// ```
pub fn order_cost(price_per_share: Money, shares: u64) -> Option<Money> {
    let cost = (price_per_share as u128).checked_mul(shares as u128)?;
    u64::try_from(cost).ok()
}

/// Platform fee on a payment leg: `amount * fee_bps / 10_000`, floored
///
/// The fee is always strictly less than `amount` for `fee_bps < 10_000`.
///
/// # Example
///
/// ```
/// use brickshare::types::money::{to_money, fee_amount};
///
/// // 1% of 500.00 is 5.00
/// let payment = to_money("500.00").unwrap();
/// assert_eq!(fee_amount(payment, 100), to_money("5.00").unwrap());
/// ```
pub fn fee_amount(amount: Money, fee_bps: u64) -> Money {
    let fee = (amount as u128) * (fee_bps as u128) / (BPS_DENOM as u128);
    // fee <= amount <= u64::MAX since fee_bps <= BPS_DENOM is enforced upstream
    fee as u64
}

/// Proportional entitlement: `total * balance / snapshot`, floored
///
/// Used for dividend claims. Floor division guarantees that the sum of
/// entitlements over any partition of `snapshot` never exceeds `total`,
/// with a shortfall of less than `snapshot` smallest units.
///
/// Returns `None` if `snapshot` is zero.
///
/// # Example
///
/// ```
/// use brickshare::types::money::{to_money, pro_rata};
///
/// // 250 of 1000 shares in a 1000.00 pool -> 250.00
/// let pool = to_money("1000.00").unwrap();
/// assert_eq!(pro_rata(pool, 250, 1000), Some(to_money("250.00").unwrap()));
/// ```
pub fn pro_rata(total: Money, balance: u64, snapshot: u64) -> Option<Money> {
    if snapshot == 0 {
        return None;
    }

    let amount = (total as u128) * (balance as u128) / (snapshot as u128);
    // amount <= total whenever balance <= snapshot; the cast below is also
    // safe for balance > snapshot because the engine never issues more
    // shares than the snapshot denominator.
    u64::try_from(amount).ok()
}

// ============================================================================
// Unit Tests
// ============================================================================
