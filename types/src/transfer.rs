//! Asset-transfer seam: how value enters and leaves the ledger's custody.

use thiserror::Error;

use crate::address::Address;
use crate::amount::Amount;
use crate::token::TokenId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient {token} balance for {account}: need {needed}, have {available}")]
    InsufficientFunds {
        token: TokenId,
        account: Address,
        needed: u128,
        available: u128,
    },

    #[error("transfer declined: {0}")]
    Declined(String),
}

/// Moves value of a token between a participant and the ledger's custody.
///
/// Both calls are synchronous; an `Err` means no value moved.
pub trait AssetTransfer {
    /// Move `amount` of `token` from `from` into custody.
    fn pull(&self, token: TokenId, from: Address, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` of `token` out of custody to `to`.
    fn push(&self, token: TokenId, to: Address, amount: Amount) -> Result<(), TransferError>;
}

impl<T: AssetTransfer + ?Sized> AssetTransfer for &T {
    fn pull(&self, token: TokenId, from: Address, amount: Amount) -> Result<(), TransferError> {
        (**self).pull(token, from, amount)
    }

    fn push(&self, token: TokenId, to: Address, amount: Amount) -> Result<(), TransferError> {
        (**self).push(token, to, amount)
    }
}
