//! Write batching: stage every record change of one ledger call, validate
//! the whole set against the store, then apply it.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = WriteBatch::new(now);
//! batch.put_stake(participant, token, old_stake, new_stake)?;
//! batch.validate(&store)?;      // nothing written yet
//! transfer.pull(token, participant, amount)?;
//! batch.commit(&mut store)?;
//! ```
//!
//! A batch that is dropped without [`WriteBatch::commit`] leaves the store
//! untouched. `commit` re-runs validation before its first write, so a batch
//! either applies completely or not at all.

use std::collections::BTreeMap;

use hive_types::{ParticipantId, Timestamp, TokenId};

use crate::error::StoreError;
use crate::ledger_store::LedgerStore;
use crate::record::{Delta, Pool, PoolAdjustment, Stake};

#[derive(Clone, Debug)]
enum BatchOp {
    PutStake {
        participant: ParticipantId,
        token: TokenId,
        stake: Stake,
    },
    AdjustPool {
        token: TokenId,
        adjustment: PoolAdjustment,
    },
}

/// A staged set of ledger writes, all taking effect at the same `now`.
#[derive(Clone, Debug)]
pub struct WriteBatch {
    now: Timestamp,
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            ops: Vec::new(),
        }
    }

    /// Stage a stake replacement together with the pool adjustment that keeps
    /// the pool's totals in step with it.
    pub fn put_stake(
        &mut self,
        participant: ParticipantId,
        token: TokenId,
        old: &Stake,
        new: Stake,
    ) -> Result<(), StoreError> {
        let adjustment = PoolAdjustment::for_stake_change(old, &new)
            .ok_or_else(|| StoreError::InvalidState("stake weight overflows".into()))?;
        self.ops.push(BatchOp::PutStake {
            participant,
            token,
            stake: new,
        });
        if adjustment != PoolAdjustment::default() {
            self.ops.push(BatchOp::AdjustPool { token, adjustment });
        }
        Ok(())
    }

    /// Stage a change to a pool's reward reserve.
    pub fn adjust_reserve(&mut self, token: TokenId, reserve: Delta) {
        self.ops.push(BatchOp::AdjustPool {
            token,
            adjustment: PoolAdjustment::default().with_reserve(reserve),
        });
    }

    /// Dry-run the batch against `store` without writing anything.
    ///
    /// Checks, in order: `now` does not precede the store's latest accepted
    /// time; every staged stake satisfies its record invariants at `now`; no
    /// pool total goes negative; and for every touched token, the staged
    /// stake changes and the staged pool adjustments move the totals by the
    /// same amount (stake conservation).
    pub fn validate<S: LedgerStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        if let Some(latest) = store.latest_time() {
            if self.now < latest {
                return Err(StoreError::InvalidState(format!(
                    "time {} precedes latest accepted time {latest}",
                    self.now
                )));
            }
        }

        let mut stakes: BTreeMap<(TokenId, ParticipantId), Stake> = BTreeMap::new();
        let mut pools: BTreeMap<TokenId, Pool> = BTreeMap::new();
        // Net movement per token implied by stake writes: (staked, weighted_since).
        let mut implied: BTreeMap<TokenId, (Delta, Delta)> = BTreeMap::new();
        // Net movement per token declared by pool adjustments.
        let mut declared: BTreeMap<TokenId, (Delta, Delta)> = BTreeMap::new();

        for op in &self.ops {
            match op {
                BatchOp::PutStake {
                    participant,
                    token,
                    stake,
                } => {
                    stake.validate(self.now)?;
                    let key = (*token, *participant);
                    let before = stakes
                        .get(&key)
                        .copied()
                        .unwrap_or_else(|| store.get_stake(participant, *token));
                    let change = PoolAdjustment::for_stake_change(&before, stake)
                        .ok_or_else(|| StoreError::InvalidState("stake weight overflows".into()))?;
                    accumulate(&mut implied, *token, &change)?;
                    stakes.insert(key, *stake);
                }
                BatchOp::AdjustPool { token, adjustment } => {
                    let before = pools
                        .get(token)
                        .copied()
                        .unwrap_or_else(|| store.get_pool(*token));
                    pools.insert(*token, before.adjusted(adjustment)?);
                    accumulate(&mut declared, *token, adjustment)?;
                }
            }
        }

        for (token, moved) in &implied {
            let booked = declared.get(token).copied().unwrap_or_default();
            if normalize(moved.0) != normalize(booked.0) || normalize(moved.1) != normalize(booked.1) {
                return Err(StoreError::InvalidState(format!(
                    "batch does not conserve stake for {token}: stakes moved {moved:?}, pool moved {booked:?}"
                )));
            }
        }
        for (token, booked) in &declared {
            if !implied.contains_key(token)
                && (normalize(booked.0) != Delta::NONE || normalize(booked.1) != Delta::NONE)
            {
                return Err(StoreError::InvalidState(format!(
                    "batch moves pool {token} stake totals without a stake change"
                )));
            }
        }
        Ok(())
    }

    /// Validate, then apply every staged write and advance the store's latest
    /// accepted time to this batch's `now`.
    pub fn commit<S: LedgerStore + ?Sized>(self, store: &mut S) -> Result<(), StoreError> {
        self.validate(store)?;
        for op in &self.ops {
            match op {
                BatchOp::PutStake {
                    participant,
                    token,
                    stake,
                } => store.set_stake(participant, *token, *stake, self.now)?,
                BatchOp::AdjustPool { token, adjustment } => store.adjust_pool(*token, adjustment)?,
            }
        }
        store.set_latest_time(self.now)?;
        tracing::trace!(ops = self.ops.len(), now = %self.now, "write batch committed");
        Ok(())
    }
}

fn accumulate(
    totals: &mut BTreeMap<TokenId, (Delta, Delta)>,
    token: TokenId,
    adjustment: &PoolAdjustment,
) -> Result<(), StoreError> {
    let overflow = || StoreError::InvalidState("pool adjustment overflows".into());
    let entry = totals.entry(token).or_default();
    entry.0 = entry.0.combine(adjustment.staked).ok_or_else(overflow)?;
    entry.1 = entry.1.combine(adjustment.weighted_since).ok_or_else(overflow)?;
    Ok(())
}

/// `Debit(0)` and `Credit(0)` are the same movement.
fn normalize(delta: Delta) -> Delta {
    match delta {
        Delta::Debit(0) => Delta::NONE,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use hive_types::{Address, Amount};

    fn wallet(n: u64) -> ParticipantId {
        Address::from_low_u64(n)
    }

    #[test]
    fn commit_applies_stake_and_pool_together() {
        let mut store = MemoryStore::new();
        let now = Timestamp::new(100);
        let stake = Stake::new(Amount::new(5), now);
        let mut batch = WriteBatch::new(now);
        batch
            .put_stake(wallet(1), TokenId::Native, &Stake::EMPTY, stake)
            .unwrap();
        batch.commit(&mut store).unwrap();

        assert_eq!(store.get_stake(&wallet(1), TokenId::Native), stake);
        assert_eq!(store.get_pool(TokenId::Native).total_staked, Amount::new(5));
        assert_eq!(store.latest_time(), Some(now));
        store.check_conservation(TokenId::Native).unwrap();
    }

    #[test]
    fn invalid_batch_writes_nothing() {
        let mut store = MemoryStore::new();
        let now = Timestamp::new(100);
        let mut batch = WriteBatch::new(now);
        batch
            .put_stake(
                wallet(1),
                TokenId::Native,
                &Stake::EMPTY,
                Stake::new(Amount::new(5), now),
            )
            .unwrap();
        // Reserve debit on an empty pool is invalid; the stake above must not land.
        batch.adjust_reserve(TokenId::Native, Delta::Debit(1));
        let before = store.clone();
        assert!(matches!(
            batch.commit(&mut store),
            Err(StoreError::InvalidState(_))
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn batch_in_the_past_is_rejected() {
        let mut store = MemoryStore::new();
        store.set_latest_time(Timestamp::new(500)).unwrap();
        let mut batch = WriteBatch::new(Timestamp::new(499));
        batch.adjust_reserve(TokenId::Native, Delta::Credit(1));
        assert!(batch.validate(&store).is_err());
    }

    #[test]
    fn stale_old_stake_breaks_conservation() {
        let mut store = MemoryStore::new();
        let now = Timestamp::new(10);
        let mut seed = WriteBatch::new(now);
        seed.put_stake(
            wallet(1),
            TokenId::Native,
            &Stake::EMPTY,
            Stake::new(Amount::new(3), now),
        )
        .unwrap();
        seed.commit(&mut store).unwrap();

        // Caller pretends the old stake was empty: pool would be credited 4
        // while the stake only grows by 1.
        let mut batch = WriteBatch::new(now);
        batch
            .put_stake(
                wallet(1),
                TokenId::Native,
                &Stake::EMPTY,
                Stake::new(Amount::new(4), now),
            )
            .unwrap();
        assert!(batch.validate(&store).is_err());
    }

    #[test]
    fn zero_change_batch_only_advances_time() {
        let mut store = MemoryStore::new();
        let now = Timestamp::new(42);
        let mut batch = WriteBatch::new(now);
        batch
            .put_stake(wallet(9), TokenId::Native, &Stake::EMPTY, Stake::EMPTY)
            .unwrap();
        batch.commit(&mut store).unwrap();
        assert!(store.stake_exists(&wallet(9), TokenId::Native));
        assert_eq!(store.get_pool(TokenId::Native), Pool::EMPTY);
        assert_eq!(store.latest_time(), Some(now));
    }
}
