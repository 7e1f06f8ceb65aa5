//! Constant-product arithmetic
//!
//! Integer floor math identical to the pool contract's own accounting, so a
//! locally computed amount is never rejected for a rounding mismatch.
//! `None` means the intermediate product overflowed 256 bits.

use alloy::primitives::U256;

/// Pool fee: 0.3% (997/1000), as charged by the pool contract
pub const FEE_NUMERATOR: u64 = 997;
pub const FEE_DENOMINATOR: u64 = 1000;

/// Output of a swap against `(reserve_in, reserve_out)` after fee.
///
/// Formula: amount_out = (amount_in * 997 * reserve_out) / (reserve_in * 1000 + amount_in * 997)
pub fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Option<U256> {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Some(U256::ZERO);
    }

    let amount_in_with_fee = amount_in.checked_mul(U256::from(FEE_NUMERATOR))?;
    let numerator = amount_in_with_fee.checked_mul(reserve_out)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))?
        .checked_add(amount_in_with_fee)?;

    Some(numerator / denominator)
}

/// Amount of the other token that keeps the pool price when depositing
/// `amount` against `(reserve_in, reserve_other)`: floor(amount * reserve_other / reserve_in).
pub fn paired_deposit(amount: U256, reserve_in: U256, reserve_other: U256) -> Option<U256> {
    if reserve_in.is_zero() {
        return None;
    }
    Some(amount.checked_mul(reserve_other)? / reserve_in)
}

/// Token amounts released by burning `shares` out of `total_shares`.
pub fn withdraw_amounts(
    shares: U256,
    total_shares: U256,
    reserve_a: U256,
    reserve_b: U256,
) -> Option<(U256, U256)> {
    if total_shares.is_zero() {
        return None;
    }
    let amount_a = shares.checked_mul(reserve_a)? / total_shares;
    let amount_b = shares.checked_mul(reserve_b)? / total_shares;
    Some((amount_a, amount_b))
}

/// Invariant k = reserve_a * reserve_b.
pub fn invariant(reserve_a: U256, reserve_b: U256) -> Option<U256> {
    reserve_a.checked_mul(reserve_b)
}
