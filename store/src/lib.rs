//! Ledger store for the hive.
//!
//! The store exclusively owns every [`Stake`] and [`Pool`] record. Reads are
//! plain lookups; writes go through [`WriteBatch`], which validates the whole
//! change set (timestamps, non-negative totals, stake conservation) before
//! touching anything. [`MemoryStore`] is the in-process backend; any other
//! backend implements [`LedgerStore`].

pub mod batch;
pub mod error;
pub mod ledger_store;
pub mod memory;
pub mod record;
pub mod snapshot;

pub use batch::WriteBatch;
pub use error::StoreError;
pub use ledger_store::LedgerStore;
pub use memory::MemoryStore;
pub use record::{Delta, Pool, PoolAdjustment, Stake};
pub use snapshot::{LedgerSnapshot, PoolEntry, StakeEntry};
