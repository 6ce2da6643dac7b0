//! Hive: a time-weighted value-pooling ledger.
//!
//! Participants deposit value of some token; the ledger tracks per
//! (participant, token) how much is staked and since when. A pool's reward
//! reserve is shared out in proportion to stake-seconds:
//!
//! `accrual(portion) = reserve × portion × (now − since) / Σ amount × (now − since)`
//!
//! This crate handles:
//! - Deposits, with stake-weighted blending of the weighting anchor on top-ups
//! - Withdrawals of principal plus the withdrawn portion's accrual
//! - Claims of accrual without touching principal
//! - Funding of the reward reserve
//!
//! [`AccrualEngine`] is pure planning over a [`hive_store::LedgerStore`];
//! [`Hive`] wires it to a clock and an asset-transfer primitive and applies
//! each call all-or-nothing.

pub mod engine;
pub mod error;
pub mod event;
pub mod hive;
pub mod share;

pub use engine::{AccrualEngine, Movement, Payout, Settlement};
pub use error::HiveError;
pub use event::HiveEvent;
pub use hive::Hive;
