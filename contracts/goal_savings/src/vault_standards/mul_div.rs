//! # Checked Multiplication and Division
//!
//! Provides overflow-safe multiplication and division operations using
//! 256-bit intermediate arithmetic. This is essential for share/asset
//! conversions where naive multiplication could overflow.
//!
//! ## Rounding Modes
//!
//! - `Down`: Round towards zero (floor)
//! - `Up`: Round away from zero (ceiling)
//!
//! The rounding mode affects financial calculations:
//! - Use `Down` when calculating what the vault pays out (shares minted, assets redeemed)
//! - Use `Up` when calculating what the vault requires in (assets for a mint, shares for a withdraw)

use super::core::U256;
use crate::error::{SavingsError, SavingsResult};

/// Rounding direction for division operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Round towards zero (floor division).
    Down,
    /// Round away from zero (ceiling division).
    Up,
}

/// Narrows a 256-bit intermediate back to `u128`.
pub fn to_u128(value: U256) -> SavingsResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(SavingsError::ArithmeticOverflow);
    }
    Ok(value.as_u128())
}

/// Performs `(x * y) / denominator` with configurable rounding.
///
/// The product is computed in 256 bits, so only the final quotient can
/// overflow `u128`. A zero denominator or an oversized quotient fails with
/// [`SavingsError::ArithmeticOverflow`].
///
/// # Example
///
/// ```ignore
/// // Calculate shares = (assets * supply) / total_assets, rounded down
/// let shares = mul_div(100_000, 1_000_000, 500_000, Rounding::Down)?;
/// assert_eq!(shares, 200_000);
/// ```
pub fn mul_div(x: u128, y: u128, denominator: u128, rounding: Rounding) -> SavingsResult<u128> {
    if denominator == 0 {
        return Err(SavingsError::ArithmeticOverflow);
    }

    let numerator = U256::from(x) * U256::from(y);
    let denominator = U256::from(denominator);
    let result = numerator / denominator;
    let remainder = numerator % denominator;

    match rounding {
        Rounding::Down => to_u128(result),
        Rounding::Up => {
            if remainder > U256::zero() {
                to_u128(result + U256::one())
            } else {
                to_u128(result)
            }
        }
    }
}
