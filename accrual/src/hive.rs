//! The hive: public ledger operations bound to a clock, a caller, and an
//! asset-transfer primitive.

use hive_store::{LedgerSnapshot, LedgerStore, MemoryStore, Pool, Stake};
use hive_types::{Address, Amount, AssetTransfer, Clock, ParticipantId, Timestamp, TokenId, U256};

use crate::engine::{AccrualEngine, Movement, Payout, Settlement};
use crate::error::HiveError;
use crate::event::HiveEvent;

/// A single ledger instance.
///
/// Every public operation is one transaction: the engine plans it against the
/// current store, the plan is validated, the asset transfer runs, and only
/// then are the writes committed. Any error leaves the store exactly as it
/// was and records no event.
pub struct Hive<S, C, T> {
    store: S,
    engine: AccrualEngine,
    clock: C,
    transfer: T,
    events: Vec<HiveEvent>,
}

impl<C: Clock, T: AssetTransfer> Hive<MemoryStore, C, T> {
    /// An empty in-memory hive.
    pub fn in_memory(clock: C, transfer: T) -> Self {
        Self::new(MemoryStore::new(), clock, transfer)
    }

    /// A hive restored from a verified snapshot.
    pub fn from_snapshot(snapshot: &LedgerSnapshot, clock: C, transfer: T) -> Result<Self, HiveError> {
        Ok(Self::new(snapshot.restore()?, clock, transfer))
    }
}

impl<S: LedgerStore, C: Clock, T: AssetTransfer> Hive<S, C, T> {
    pub fn new(store: S, clock: C, transfer: T) -> Self {
        Self {
            store,
            engine: AccrualEngine::new(),
            clock,
            transfer,
            events: Vec::new(),
        }
    }

    // ── Calls using ambient time ────────────────────────────────────────

    /// Deposit `amount` of `token` from `caller` at the clock's current time.
    pub fn deposit(&mut self, caller: ParticipantId, token: TokenId, amount: Amount) -> Result<(), HiveError> {
        let now = self.clock.now();
        self.deposit_at(caller, token, amount, now)
    }

    /// Withdraw `amount` of principal plus its accrual at the current time.
    pub fn withdraw(&mut self, caller: ParticipantId, token: TokenId, amount: Amount) -> Result<Payout, HiveError> {
        let now = self.clock.now();
        self.withdraw_at(caller, token, amount, now)
    }

    /// Claim the accrual of `caller`'s whole stake at the current time.
    pub fn claim(&mut self, caller: ParticipantId, token: TokenId) -> Result<Amount, HiveError> {
        let now = self.clock.now();
        self.claim_at(caller, token, now)
    }

    /// Add `amount` to `token`'s reward reserve at the current time.
    pub fn fund(&mut self, caller: Address, token: TokenId, amount: Amount) -> Result<(), HiveError> {
        let now = self.clock.now();
        self.fund_at(caller, token, amount, now)
    }

    // ── Calls with explicit time ────────────────────────────────────────

    pub fn deposit_at(
        &mut self,
        caller: ParticipantId,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), HiveError> {
        let settlement = self.engine.deposit(&self.store, caller, token, amount, now)?;
        self.settle(settlement)
    }

    pub fn withdraw_at(
        &mut self,
        caller: ParticipantId,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Payout, HiveError> {
        let (settlement, payout) = self.engine.withdraw(&self.store, caller, token, amount, now)?;
        self.settle(settlement)?;
        Ok(payout)
    }

    pub fn claim_at(&mut self, caller: ParticipantId, token: TokenId, now: Timestamp) -> Result<Amount, HiveError> {
        let (settlement, accrual) = self.engine.claim(&self.store, caller, token, now)?;
        self.settle(settlement)?;
        Ok(accrual)
    }

    pub fn fund_at(
        &mut self,
        caller: Address,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(), HiveError> {
        let settlement = self.engine.fund(&self.store, caller, token, amount, now)?;
        self.settle(settlement)
    }

    fn settle(&mut self, settlement: Settlement) -> Result<(), HiveError> {
        let Settlement {
            batch,
            movement,
            event,
        } = settlement;

        // A validated batch moves pool totals and stakes by the same amounts,
        // so a conserving pool stays conserving once it commits. Checking the
        // pool before the transfer keeps a corrupted store from taking value.
        self.store.check_conservation(event.token())?;
        batch.validate(&self.store)?;

        if let Some(movement) = movement {
            let result = match movement {
                Movement::Pull { token, from, amount } => self.transfer.pull(token, from, amount),
                Movement::Push { token, to, amount } => self.transfer.push(token, to, amount),
            };
            if let Err(e) = result {
                tracing::warn!(?movement, error = %e, "asset transfer rejected, call rolled back");
                return Err(HiveError::TransferFailure(e));
            }
        }

        batch.commit(&mut self.store)?;

        tracing::debug!(token = %event.token(), at = %event.at(), ?event, "hive call committed");
        self.events.push(event);
        Ok(())
    }

    // ── Views ───────────────────────────────────────────────────────────

    pub fn stake(&self, participant: &ParticipantId, token: TokenId) -> Stake {
        self.store.get_stake(participant, token)
    }

    pub fn stake_exists(&self, participant: &ParticipantId, token: TokenId) -> bool {
        self.store.stake_exists(participant, token)
    }

    pub fn pool(&self, token: TokenId) -> Pool {
        self.store.get_pool(token)
    }

    /// What `participant` would receive by claiming at the current time.
    pub fn accrued(&self, participant: &ParticipantId, token: TokenId) -> Result<Amount, HiveError> {
        self.accrued_at(participant, token, self.clock.now())
    }

    pub fn accrued_at(&self, participant: &ParticipantId, token: TokenId, now: Timestamp) -> Result<Amount, HiveError> {
        self.engine.accrued(&self.store, participant, token, now)
    }

    pub fn pool_weight(&self, token: TokenId) -> Result<U256, HiveError> {
        self.engine.pool_weight(&self.store, token, self.clock.now())
    }

    pub fn stake_weight(&self, participant: &ParticipantId, token: TokenId) -> U256 {
        self.engine
            .stake_weight(&self.store, participant, token, self.clock.now())
    }

    /// Every committed call, oldest first.
    pub fn events(&self) -> &[HiveEvent] {
        &self.events
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.store)
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
