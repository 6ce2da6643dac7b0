//! In-memory ledger store.

use std::collections::BTreeMap;

use hive_types::{Address, ParticipantId, Timestamp, TokenId};

use crate::error::StoreError;
use crate::ledger_store::LedgerStore;
use crate::record::{Pool, PoolAdjustment, Stake};

/// A ledger store held entirely in memory.
///
/// Stakes are keyed by `(token, participant)` so that one token's stakes form
/// a contiguous range. Ordered maps keep iteration (and therefore snapshot
/// hashes) deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    stakes: BTreeMap<(TokenId, ParticipantId), Stake>,
    pools: BTreeMap<TokenId, Pool>,
    latest_time: Option<Timestamp>,
}

impl MemoryStore {
    /// An empty ledger: no pools, no stakes, no accepted time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw records without validation. Used when rebuilding from a
    /// snapshot, which is verified as a whole afterwards.
    pub(crate) fn insert_raw(
        &mut self,
        stakes: impl IntoIterator<Item = (TokenId, ParticipantId, Stake)>,
        pools: impl IntoIterator<Item = (TokenId, Pool)>,
        latest_time: Option<Timestamp>,
    ) {
        for (token, participant, stake) in stakes {
            self.stakes.insert((token, participant), stake);
        }
        self.pools.extend(pools);
        self.latest_time = latest_time;
    }
}

impl LedgerStore for MemoryStore {
    fn get_stake(&self, participant: &ParticipantId, token: TokenId) -> Stake {
        self.stakes
            .get(&(token, *participant))
            .copied()
            .unwrap_or(Stake::EMPTY)
    }

    fn stake_exists(&self, participant: &ParticipantId, token: TokenId) -> bool {
        self.stakes.contains_key(&(token, *participant))
    }

    fn set_stake(
        &mut self,
        participant: &ParticipantId,
        token: TokenId,
        stake: Stake,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        stake.validate(now)?;
        self.stakes.insert((token, *participant), stake);
        Ok(())
    }

    fn get_pool(&self, token: TokenId) -> Pool {
        self.pools.get(&token).copied().unwrap_or(Pool::EMPTY)
    }

    fn adjust_pool(&mut self, token: TokenId, adjustment: &PoolAdjustment) -> Result<(), StoreError> {
        let adjusted = self.get_pool(token).adjusted(adjustment)?;
        self.pools.insert(token, adjusted);
        Ok(())
    }

    fn latest_time(&self) -> Option<Timestamp> {
        self.latest_time
    }

    fn set_latest_time(&mut self, now: Timestamp) -> Result<(), StoreError> {
        if let Some(latest) = self.latest_time {
            if now < latest {
                return Err(StoreError::InvalidState(format!(
                    "time {now} precedes latest accepted time {latest}"
                )));
            }
        }
        self.latest_time = Some(now);
        Ok(())
    }

    fn stakes_for(&self, token: TokenId) -> Vec<(ParticipantId, Stake)> {
        let lo = (token, Address::ZERO);
        let hi = (token, Address::new([0xff; 20]));
        self.stakes
            .range(lo..=hi)
            .map(|((_, participant), stake)| (*participant, *stake))
            .collect()
    }

    fn stakes(&self) -> Vec<(TokenId, ParticipantId, Stake)> {
        self.stakes
            .iter()
            .map(|((token, participant), stake)| (*token, *participant, *stake))
            .collect()
    }

    fn pools(&self) -> Vec<(TokenId, Pool)> {
        self.pools.iter().map(|(t, p)| (*t, *p)).collect()
    }
}
