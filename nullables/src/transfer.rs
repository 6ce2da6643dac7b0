//! Nullable asset transfer: an in-memory balance sheet that records every
//! movement instead of touching a chain.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use hive_types::{Address, Amount, AssetTransfer, TokenId, TransferError};
use serde::Serialize;

/// Which way value moved relative to the ledger's custody.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// From a participant into custody.
    Pull,
    /// From custody out to a participant.
    Push,
}

/// One completed movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub direction: TransferDirection,
    pub token: TokenId,
    pub account: Address,
    pub amount: Amount,
}

/// A test transfer primitive backed by in-memory balances.
///
/// Pulls fail when the participant's balance is short; pushes fail when
/// custody is short. [`NullTransfer::decline_next`] makes the next call fail
/// regardless, for exercising rollback paths.
pub struct NullTransfer {
    balances: RefCell<BTreeMap<(TokenId, Address), u128>>,
    custody: RefCell<BTreeMap<TokenId, u128>>,
    log: RefCell<Vec<TransferRecord>>,
    decline_next: Cell<bool>,
}

impl NullTransfer {
    pub fn new() -> Self {
        Self {
            balances: RefCell::new(BTreeMap::new()),
            custody: RefCell::new(BTreeMap::new()),
            log: RefCell::new(Vec::new()),
            decline_next: Cell::new(false),
        }
    }

    /// Give `account` an outside balance of `token` to deposit from.
    pub fn credit(&self, account: Address, token: TokenId, amount: Amount) {
        *self
            .balances
            .borrow_mut()
            .entry((token, account))
            .or_default() += amount.raw();
    }

    /// Builder form of [`NullTransfer::credit`].
    pub fn with_balance(self, account: Address, token: TokenId, amount: Amount) -> Self {
        self.credit(account, token, amount);
        self
    }

    /// Make the next pull or push fail with `Declined`.
    pub fn decline_next(&self) {
        self.decline_next.set(true);
    }

    /// Outside balance of `account`.
    pub fn balance_of(&self, account: Address, token: TokenId) -> Amount {
        Amount::new(
            self.balances
                .borrow()
                .get(&(token, account))
                .copied()
                .unwrap_or(0),
        )
    }

    /// Value of `token` currently held in the ledger's custody.
    pub fn custody(&self, token: TokenId) -> Amount {
        Amount::new(self.custody.borrow().get(&token).copied().unwrap_or(0))
    }

    /// Every completed movement, in order.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.log.borrow().clone()
    }

    fn take_decline(&self) -> Result<(), TransferError> {
        if self.decline_next.replace(false) {
            Err(TransferError::Declined("declined by test".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for NullTransfer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetTransfer for NullTransfer {
    fn pull(&self, token: TokenId, from: Address, amount: Amount) -> Result<(), TransferError> {
        self.take_decline()?;
        let mut balances = self.balances.borrow_mut();
        let available = balances.get(&(token, from)).copied().unwrap_or(0);
        if available < amount.raw() {
            return Err(TransferError::InsufficientFunds {
                token,
                account: from,
                needed: amount.raw(),
                available,
            });
        }
        balances.insert((token, from), available - amount.raw());
        *self.custody.borrow_mut().entry(token).or_default() += amount.raw();
        self.log.borrow_mut().push(TransferRecord {
            direction: TransferDirection::Pull,
            token,
            account: from,
            amount,
        });
        Ok(())
    }

    fn push(&self, token: TokenId, to: Address, amount: Amount) -> Result<(), TransferError> {
        self.take_decline()?;
        let mut custody = self.custody.borrow_mut();
        let held = custody.get(&token).copied().unwrap_or(0);
        if held < amount.raw() {
            return Err(TransferError::Declined(format!(
                "custody holds {held} of {token}, cannot release {amount}"
            )));
        }
        custody.insert(token, held - amount.raw());
        *self.balances.borrow_mut().entry((token, to)).or_default() += amount.raw();
        self.log.borrow_mut().push(TransferRecord {
            direction: TransferDirection::Push,
            token,
            account: to,
            amount,
        });
        Ok(())
    }
}
