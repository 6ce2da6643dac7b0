//! Ledger snapshots: capture every stake and pool at a point in time.
//!
//! A snapshot lets a hive be persisted and restored without replaying its
//! call history. The snapshot hash is computed deterministically from the
//! records in canonical order so a restored ledger can be checked for
//! integrity before use.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hive_types::{ParticipantId, Timestamp, TokenId};

use crate::error::StoreError;
use crate::ledger_store::LedgerStore;
use crate::memory::MemoryStore;
use crate::record::{Pool, Stake};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A ledger snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 of the records and latest time.
    pub hash: [u8; 32],
    /// Latest accepted call time at capture.
    pub latest_time: Option<Timestamp>,
    /// Every stake record, in (token, participant) order.
    pub stakes: Vec<StakeEntry>,
    /// Every pool, in token order.
    pub pools: Vec<PoolEntry>,
    /// Snapshot version for compatibility.
    pub version: u32,
}

/// One stake record captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEntry {
    pub token: TokenId,
    pub participant: ParticipantId,
    pub stake: Stake,
}

/// One pool captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub token: TokenId,
    pub pool: Pool,
}

impl LedgerSnapshot {
    /// Capture the full contents of `store`.
    pub fn capture<S: LedgerStore + ?Sized>(store: &S) -> Self {
        let stakes = store
            .stakes()
            .into_iter()
            .map(|(token, participant, stake)| StakeEntry {
                token,
                participant,
                stake,
            })
            .collect();
        let pools = store
            .pools()
            .into_iter()
            .map(|(token, pool)| PoolEntry { token, pool })
            .collect();
        let mut snap = Self {
            hash: [0u8; 32],
            latest_time: store.latest_time(),
            stakes,
            pools,
            version: SNAPSHOT_VERSION,
        };
        snap.hash = snap.compute_hash();
        snap
    }

    /// Compute the Blake2b-256 hash of this snapshot deterministically.
    fn compute_hash(&self) -> [u8; 32] {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let mut hasher = Blake2b::<U32>::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.latest_time.map_or(0u64, |t| t.as_secs()).to_le_bytes());
        for entry in &self.stakes {
            hasher.update(entry.token.address().as_bytes());
            hasher.update(entry.participant.as_bytes());
            hasher.update(entry.stake.amount.raw().to_le_bytes());
            hasher.update(entry.stake.since.map_or(0u64, |t| t.as_secs()).to_le_bytes());
        }
        for entry in &self.pools {
            hasher.update(entry.token.address().as_bytes());
            hasher.update(entry.pool.total_staked.raw().to_le_bytes());
            hasher.update(entry.pool.weighted_since.to_le_bytes());
            hasher.update(entry.pool.reward_reserve.raw().to_le_bytes());
        }

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        out
    }

    /// Verify the snapshot hash matches the records.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Hex form of the snapshot hash.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Write the snapshot to a file.
    pub fn write_to(&self, path: &Path) -> Result<(), StoreError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read a snapshot from a file. The hash is not checked here; see
    /// [`LedgerSnapshot::restore`].
    pub fn read_from(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Rebuild an in-memory store from this snapshot.
    ///
    /// Fails with `Corruption` if the hash does not match, the version is
    /// unknown, or the records violate a ledger invariant. The hash keys
    /// records by token address, so `Fungible(0x0)` is refused here rather
    /// than allowed to alias the native pool.
    pub fn restore(&self) -> Result<MemoryStore, StoreError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::Corruption(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if !self.verify() {
            return Err(StoreError::Corruption("snapshot hash mismatch".into()));
        }

        let stray = self
            .stakes
            .iter()
            .map(|e| e.token)
            .chain(self.pools.iter().map(|e| e.token))
            .find(|token| !token.is_canonical());
        if let Some(token) = stray {
            return Err(StoreError::Corruption(format!(
                "non-canonical token id {token:?}"
            )));
        }

        let now = self.latest_time.unwrap_or(Timestamp::EPOCH);
        for entry in &self.stakes {
            entry
                .stake
                .validate(now)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
        }

        let mut store = MemoryStore::new();
        store.insert_raw(
            self.stakes
                .iter()
                .map(|e| (e.token, e.participant, e.stake)),
            self.pools.iter().map(|e| (e.token, e.pool)),
            self.latest_time,
        );
        let tokens: BTreeSet<TokenId> = self
            .pools
            .iter()
            .map(|e| e.token)
            .chain(self.stakes.iter().map(|e| e.token))
            .collect();
        for token in tokens {
            store
                .check_conservation(token)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
        }
        Ok(store)
    }

    /// Number of stake records in this snapshot.
    pub fn stake_count(&self) -> usize {
        self.stakes.len()
    }
}
