//! Nullable infrastructure for deterministic testing and simulation.
//!
//! The ledger consumes two collaborators: a clock and an asset-transfer
//! primitive. This crate provides implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the system clock or a real chain
//!
//! Usage: swap real implementations for nullables in tests and in the
//! scenario simulator.

pub mod clock;
pub mod transfer;

pub use clock::NullClock;
pub use transfer::{NullTransfer, TransferDirection, TransferRecord};
