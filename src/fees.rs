//! Basis-point fee arithmetic.

use crate::assets::Amount;

/// One whole in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Split a pending reward into staker payout and operator fee.
///
/// The fee is `floor(pending * fee_basis_points / 10_000)` with a widened
/// intermediate product, so rounding always favors the staker. With the
/// fee rate capped below the denominator, any non-zero pending amount
/// yields a payout of at least one unit.
pub fn split_claim(pending: Amount, fee_basis_points: u16) -> (Amount, Amount) {
    let fee = (pending as u128 * fee_basis_points as u128 / BPS_DENOMINATOR as u128) as Amount;
    (pending - fee, fee)
}
