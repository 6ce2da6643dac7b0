//! The ledger store trait.

use hive_types::{ParticipantId, Timestamp, TokenId};

use crate::error::StoreError;
use crate::record::{Pool, PoolAdjustment, Stake};

/// Exclusive owner of every stake and pool record.
///
/// Only the accrual engine mutates a store, and only through a validated
/// [`crate::WriteBatch`]; the individual write methods still enforce the
/// record invariants on their own.
pub trait LedgerStore {
    /// The participant's stake, or [`Stake::EMPTY`] if none was recorded.
    fn get_stake(&self, participant: &ParticipantId, token: TokenId) -> Stake;

    /// Whether a record (possibly empty) exists for this pair.
    fn stake_exists(&self, participant: &ParticipantId, token: TokenId) -> bool;

    /// Replace a stake record. Fails with `InvalidState` if the record is
    /// inconsistent or anchored after `now`.
    fn set_stake(
        &mut self,
        participant: &ParticipantId,
        token: TokenId,
        stake: Stake,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    /// The token's pool totals, or [`Pool::EMPTY`] if the token is unseen.
    fn get_pool(&self, token: TokenId) -> Pool;

    /// Apply an adjustment to the token's pool. Fails with `InvalidState`
    /// (and leaves the pool unchanged) if any total would go negative.
    fn adjust_pool(&mut self, token: TokenId, adjustment: &PoolAdjustment) -> Result<(), StoreError>;

    /// The latest `now` the ledger has accepted, if any call has committed.
    fn latest_time(&self) -> Option<Timestamp>;

    /// Record the latest accepted `now`. Fails with `InvalidState` if `now`
    /// precedes the current value.
    fn set_latest_time(&mut self, now: Timestamp) -> Result<(), StoreError>;

    /// Every stake record for `token`, in participant order.
    fn stakes_for(&self, token: TokenId) -> Vec<(ParticipantId, Stake)>;

    /// Every stake record, in (token, participant) order.
    fn stakes(&self) -> Vec<(TokenId, ParticipantId, Stake)>;

    /// Every pool, in token order.
    fn pools(&self) -> Vec<(TokenId, Pool)>;

    /// Verify that `token`'s pool totals equal the sums over its stakes.
    fn check_conservation(&self, token: TokenId) -> Result<(), StoreError> {
        let pool = self.get_pool(token);
        let mut staked: u128 = 0;
        let mut weighted: u128 = 0;
        for (_, stake) in self.stakes_for(token) {
            staked = staked
                .checked_add(stake.amount.raw())
                .ok_or_else(|| StoreError::InvalidState("stake sum overflows".into()))?;
            let ws = stake
                .weighted_since()
                .ok_or_else(|| StoreError::InvalidState("stake weight overflows".into()))?;
            weighted = weighted
                .checked_add(ws)
                .ok_or_else(|| StoreError::InvalidState("weight sum overflows".into()))?;
        }
        if staked != pool.total_staked.raw() {
            return Err(StoreError::InvalidState(format!(
                "pool {token} total_staked {} != sum of stakes {staked}",
                pool.total_staked
            )));
        }
        if weighted != pool.weighted_since {
            return Err(StoreError::InvalidState(format!(
                "pool {token} weighted_since {} != sum of stakes {weighted}",
                pool.weighted_since
            )));
        }
        Ok(())
    }
}
