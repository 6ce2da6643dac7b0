//! Errors surfaced by ledger calls.

use hive_store::StoreError;
use hive_types::TransferError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HiveError {
    /// An internal-consistency violation: a timestamp earlier than one
    /// already accepted, a total that would go negative, or an overflowing
    /// ledger quantity.
    #[error("invalid ledger state: {0}")]
    InvalidState(String),

    #[error("insufficient stake: requested {requested}, staked {available}")]
    InsufficientStake { requested: u128, available: u128 },

    #[error("asset transfer failed: {0}")]
    TransferFailure(#[from] TransferError),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("no accrual to claim")]
    NothingToClaim,

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for HiveError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidState(reason) => Self::InvalidState(reason),
            other => Self::Store(other),
        }
    }
}
