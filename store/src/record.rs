//! Stake and pool records.

use hive_types::{Amount, Timestamp, U256};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One participant's position in one token's pool.
///
/// `since` is the anchor of the stake's time weighting: the stake has
/// accumulated `amount × (now − since)` stake-seconds. It is `None` exactly
/// when `amount` is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub amount: Amount,
    pub since: Option<Timestamp>,
}

impl Stake {
    /// The zero-value stake returned for participants with no record.
    pub const EMPTY: Self = Self {
        amount: Amount::ZERO,
        since: None,
    };

    pub fn new(amount: Amount, since: Timestamp) -> Self {
        if amount.is_zero() {
            Self::EMPTY
        } else {
            Self {
                amount,
                since: Some(since),
            }
        }
    }

    /// Whether this stake currently holds value.
    pub fn is_active(&self) -> bool {
        !self.amount.is_zero()
    }

    /// Stake-seconds accumulated by the whole stake up to `now`.
    pub fn weight(&self, now: Timestamp) -> U256 {
        self.portion_weight(self.amount, now)
    }

    /// Stake-seconds accumulated by `portion` of this stake up to `now`.
    pub fn portion_weight(&self, portion: Amount, now: Timestamp) -> U256 {
        match self.since {
            Some(since) => U256::mul(portion.raw(), since.elapsed_since(now) as u128),
            None => U256::ZERO,
        }
    }

    /// This stake's contribution to [`Pool::weighted_since`].
    pub fn weighted_since(&self) -> Option<u128> {
        match self.since {
            Some(since) => self.amount.raw().checked_mul(since.as_secs() as u128),
            None => Some(0),
        }
    }

    /// Check the record invariants against the caller-supplied current time.
    pub fn validate(&self, now: Timestamp) -> Result<(), StoreError> {
        match (self.amount.is_zero(), self.since) {
            (true, Some(_)) => Err(StoreError::InvalidState(
                "empty stake must not carry a weighting anchor".into(),
            )),
            (false, None) => Err(StoreError::InvalidState(
                "active stake is missing its weighting anchor".into(),
            )),
            (false, Some(since)) if since > now => Err(StoreError::InvalidState(format!(
                "stake anchor {since} is in the future (now {now})"
            ))),
            _ => Ok(()),
        }
    }
}

/// Pool-wide totals for one token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Sum of every participant's stake amount.
    pub total_staked: Amount,
    /// Sum over participants of `amount × since` (seconds).
    ///
    /// Keeping this instead of the aggregate weight itself makes the weight at
    /// any `now` an O(1) computation: `total_staked × now − weighted_since`.
    pub weighted_since: u128,
    /// Value held for distribution to stakers.
    pub reward_reserve: Amount,
}

impl Pool {
    pub const EMPTY: Self = Self {
        total_staked: Amount::ZERO,
        weighted_since: 0,
        reward_reserve: Amount::ZERO,
    };

    /// Aggregate stake-seconds across the pool at `now`.
    ///
    /// `total_staked × now` is carried in 256 bits, so any accepted pool has a
    /// weight at every later time. `None` only if `now` precedes some stake's
    /// anchor.
    pub fn total_weight(&self, now: Timestamp) -> Option<U256> {
        U256::mul(self.total_staked.raw(), now.as_secs() as u128)
            .checked_sub(U256::from(self.weighted_since))
    }

    /// The pool after applying `adjustment`, or `InvalidState` if any total
    /// would go negative or overflow.
    pub fn adjusted(&self, adjustment: &PoolAdjustment) -> Result<Pool, StoreError> {
        let total_staked = adjustment
            .staked
            .apply(self.total_staked.raw())
            .ok_or_else(|| out_of_range("total_staked", self.total_staked.raw(), adjustment.staked))?;
        let weighted_since = adjustment
            .weighted_since
            .apply(self.weighted_since)
            .ok_or_else(|| out_of_range("weighted_since", self.weighted_since, adjustment.weighted_since))?;
        let reward_reserve = adjustment
            .reserve
            .apply(self.reward_reserve.raw())
            .ok_or_else(|| out_of_range("reward_reserve", self.reward_reserve.raw(), adjustment.reserve))?;
        Ok(Pool {
            total_staked: Amount::new(total_staked),
            weighted_since,
            reward_reserve: Amount::new(reward_reserve),
        })
    }
}

fn out_of_range(field: &str, current: u128, delta: Delta) -> StoreError {
    StoreError::InvalidState(format!("pool {field} {current} cannot absorb {delta:?}"))
}

/// A signed change to an unsigned total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delta {
    Credit(u128),
    Debit(u128),
}

impl Delta {
    pub const NONE: Self = Self::Credit(0);

    /// The signed difference `new − old`.
    pub fn between(old: u128, new: u128) -> Self {
        if new >= old {
            Self::Credit(new - old)
        } else {
            Self::Debit(old - new)
        }
    }

    /// Apply to `value`; `None` if the result would be negative or overflow.
    pub fn apply(self, value: u128) -> Option<u128> {
        match self {
            Self::Credit(n) => value.checked_add(n),
            Self::Debit(n) => value.checked_sub(n),
        }
    }

    /// Combine two deltas; `None` if the magnitude overflows.
    pub fn combine(self, other: Delta) -> Option<Delta> {
        use Delta::*;
        match (self, other) {
            (Credit(a), Credit(b)) => a.checked_add(b).map(Credit),
            (Debit(a), Debit(b)) => a.checked_add(b).map(Debit),
            (Credit(a), Debit(b)) | (Debit(b), Credit(a)) => Some(Delta::between(b, a)),
        }
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::NONE
    }
}

/// A change to every total of a [`Pool`], applied as a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolAdjustment {
    pub staked: Delta,
    pub weighted_since: Delta,
    pub reserve: Delta,
}

impl PoolAdjustment {
    /// The adjustment that moves a pool's stake totals from `old` to `new` for
    /// one participant, leaving the reserve untouched.
    pub fn for_stake_change(old: &Stake, new: &Stake) -> Option<Self> {
        Some(Self {
            staked: Delta::between(old.amount.raw(), new.amount.raw()),
            weighted_since: Delta::between(old.weighted_since()?, new.weighted_since()?),
            reserve: Delta::NONE,
        })
    }

    pub fn with_reserve(mut self, reserve: Delta) -> Self {
        self.reserve = reserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stake_of_zero_has_no_anchor() {
        let s = Stake::new(Amount::ZERO, Timestamp::new(10));
        assert_eq!(s, Stake::EMPTY);
        assert!(!s.is_active());
    }

    #[test]
    fn stake_weight_grows_with_elapsed_time() {
        let s = Stake::new(Amount::new(3), Timestamp::new(100));
        assert_eq!(s.weight(Timestamp::new(100)), U256::ZERO);
        assert_eq!(s.weight(Timestamp::new(110)), U256::from(30));
        assert_eq!(s.portion_weight(Amount::new(1), Timestamp::new(110)), U256::from(10));
    }

    #[test]
    fn validate_rejects_future_anchor() {
        let s = Stake::new(Amount::new(1), Timestamp::new(200));
        assert!(s.validate(Timestamp::new(200)).is_ok());
        assert!(matches!(
            s.validate(Timestamp::new(199)),
            Err(StoreError::InvalidState(_))
        ));
    }

    #[test]
    fn validate_rejects_inconsistent_anchor() {
        let dangling = Stake {
            amount: Amount::ZERO,
            since: Some(Timestamp::new(1)),
        };
        assert!(dangling.validate(Timestamp::new(5)).is_err());
        let unanchored = Stake {
            amount: Amount::new(1),
            since: None,
        };
        assert!(unanchored.validate(Timestamp::new(5)).is_err());
    }

    #[test]
    fn pool_weight_is_sum_of_stake_weights() {
        let a = Stake::new(Amount::new(2), Timestamp::new(100));
        let b = Stake::new(Amount::new(5), Timestamp::new(150));
        let pool = Pool {
            total_staked: Amount::new(7),
            weighted_since: a.weighted_since().unwrap() + b.weighted_since().unwrap(),
            reward_reserve: Amount::ZERO,
        };
        let now = Timestamp::new(200);
        assert_eq!(pool.total_weight(now), a.weight(now).checked_add(b.weight(now)));
        assert_eq!(pool.total_weight(Timestamp::new(120)), None);
    }

    #[test]
    fn pool_weight_defined_when_staked_times_now_overflows() {
        // Largest stake whose anchor term fits, one week later.
        let t0 = Timestamp::new(1_700_000_000);
        let amount = Amount::new(u128::MAX / 1_700_000_000);
        let s = Stake::new(amount, t0);
        let pool = Pool {
            total_staked: amount,
            weighted_since: s.weighted_since().unwrap(),
            reward_reserve: Amount::ZERO,
        };
        let later = t0.plus(604_800);
        let weight = pool.total_weight(later).unwrap();
        assert_eq!(weight, s.weight(later));
        assert_eq!(weight, U256::mul(amount.raw(), 604_800));
        assert_eq!(amount.raw().checked_mul(later.as_secs() as u128), None);
    }

    #[test]
    fn anchor_term_overflow_is_reported() {
        let s = Stake::new(Amount::new(u128::MAX / 1_000 + 1), Timestamp::new(1_000));
        assert_eq!(s.weighted_since(), None);
        assert!(PoolAdjustment::for_stake_change(&Stake::EMPTY, &s).is_none());
    }

    #[test]
    fn adjustment_cannot_drive_total_negative() {
        let pool = Pool {
            total_staked: Amount::new(1),
            ..Pool::EMPTY
        };
        let adj = PoolAdjustment {
            staked: Delta::Debit(2),
            ..Default::default()
        };
        assert!(matches!(pool.adjusted(&adj), Err(StoreError::InvalidState(_))));
    }

    #[test]
    fn delta_combine_nets_out() {
        assert_eq!(Delta::Credit(5).combine(Delta::Debit(3)), Some(Delta::Credit(2)));
        assert_eq!(Delta::Debit(5).combine(Delta::Credit(3)), Some(Delta::Debit(2)));
        assert_eq!(Delta::Debit(5).combine(Delta::Debit(3)), Some(Delta::Debit(8)));
    }
}
