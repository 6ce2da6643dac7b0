//! Stake-time arithmetic: anchor blending and pro-rata shares.

use hive_store::Stake;
use hive_types::math::mul_div_wide;
use hive_types::{Amount, Timestamp, U256};

use crate::error::HiveError;

/// The stake after topping up `old` with `amount` at `now`.
///
/// The new anchor is the stake-weighted average of the old anchor and `now`:
/// `since' = (old.amount × old.since + amount × now) / (old.amount + amount)`,
/// floored. The combined stake's weight at `now` therefore equals the old
/// stake's weight (up to the floor), so a top-up neither creates nor destroys
/// accumulated stake-seconds. A zero top-up returns `old` unchanged.
pub fn blend(old: &Stake, amount: Amount, now: Timestamp) -> Result<Stake, HiveError> {
    if amount.is_zero() {
        return Ok(*old);
    }
    let since = match old.since {
        Some(since) if old.is_active() => since,
        _ => return Ok(Stake::new(amount, now)),
    };
    let overflow = || HiveError::InvalidState("stake anchor blend overflows".into());

    let total = old.amount.checked_add(amount).ok_or_else(overflow)?;
    let old_part = old
        .amount
        .raw()
        .checked_mul(since.as_secs() as u128)
        .ok_or_else(overflow)?;
    let new_part = amount
        .raw()
        .checked_mul(now.as_secs() as u128)
        .ok_or_else(overflow)?;
    let blended = old_part.checked_add(new_part).ok_or_else(overflow)? / total.raw();
    let blended = u64::try_from(blended).map_err(|_| overflow())?;
    Ok(Stake::new(total, Timestamp::new(blended)))
}

/// `floor(reserve × part / whole)`: the share of `reserve` earned by `part`
/// stake-seconds out of `whole`. Zero when `whole` is zero.
///
/// Requires `part ≤ whole`, which bounds the share by the reserve.
pub fn distribution_share(reserve: Amount, part: U256, whole: U256) -> Result<Amount, HiveError> {
    if whole.is_zero() || part.is_zero() || reserve.is_zero() {
        return Ok(Amount::ZERO);
    }
    if part > whole {
        return Err(HiveError::InvalidState(format!(
            "stake weight {part} exceeds pool weight {whole}"
        )));
    }
    mul_div_wide(reserve.raw(), part, whole)
        .map(Amount::new)
        .ok_or_else(|| HiveError::InvalidState("distribution share overflows".into()))
}
