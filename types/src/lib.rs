//! Fundamental types for the hive ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! amounts, timestamps, addresses, token identifiers, and the two collaborator
//! seams the ledger consumes (a clock and an asset-transfer primitive).

pub mod address;
pub mod amount;
pub mod clock;
pub mod error;
pub mod math;
pub mod time;
pub mod token;
pub mod transfer;

pub use address::Address;
pub use amount::Amount;
pub use clock::Clock;
pub use error::ParseError;
pub use math::U256;
pub use time::Timestamp;
pub use token::TokenId;
pub use transfer::{AssetTransfer, TransferError};

/// A participant is identified by the (trusted) caller address.
pub type ParticipantId = Address;
