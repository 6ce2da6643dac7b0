//! Core accrual engine.

use hive_store::{Delta, LedgerStore, Stake, WriteBatch};
use hive_types::{Address, Amount, ParticipantId, Timestamp, TokenId, U256};

use crate::error::HiveError;
use crate::event::HiveEvent;
use crate::share::{blend, distribution_share};

/// Value that must move for a call to take effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    /// Pull `amount` of `token` from `from` into custody.
    Pull {
        token: TokenId,
        from: Address,
        amount: Amount,
    },
    /// Push `amount` of `token` out of custody to `to`.
    Push {
        token: TokenId,
        to: Address,
        amount: Amount,
    },
}

/// A fully planned call: the staged writes, the transfer that must succeed
/// before they are committed, and the event to record once they are.
#[derive(Clone, Debug)]
pub struct Settlement {
    pub batch: WriteBatch,
    pub movement: Option<Movement>,
    pub event: HiveEvent,
}

/// What a withdrawal pays out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub principal: Amount,
    pub accrual: Amount,
}

impl Payout {
    /// Principal plus accrual; the engine has already checked this sum.
    pub fn total(&self) -> Amount {
        self.principal + self.accrual
    }
}

/// The accrual engine: plans deposits, withdrawals, claims and funding.
///
/// The engine never writes: every method reads the store, computes the new
/// records and the value to move, and returns a [`Settlement`]. Applying it is
/// the caller's job (see [`crate::Hive`]).
#[derive(Clone, Copy, Debug, Default)]
pub struct AccrualEngine;

impl AccrualEngine {
    pub fn new() -> Self {
        Self
    }

    /// Plan a deposit of `amount` (possibly zero) by `participant`.
    ///
    /// A zero deposit records an empty stake if none exists and otherwise
    /// changes nothing.
    pub fn deposit<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        participant: ParticipantId,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Settlement, HiveError> {
        check_time(store, now)?;
        let old = store.get_stake(&participant, token);
        let new = blend(&old, amount, now)?;

        let mut batch = WriteBatch::new(now);
        batch.put_stake(participant, token, &old, new)?;

        let movement = (!amount.is_zero()).then_some(Movement::Pull {
            token,
            from: participant,
            amount,
        });
        Ok(Settlement {
            batch,
            movement,
            event: HiveEvent::Deposited {
                participant,
                token,
                amount,
                since: new.since,
                at: now,
            },
        })
    }

    /// Plan a withdrawal of `amount` of principal plus the withdrawn
    /// portion's accrual. The remainder keeps its weighting anchor.
    pub fn withdraw<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        participant: ParticipantId,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(Settlement, Payout), HiveError> {
        check_time(store, now)?;
        let old = store.get_stake(&participant, token);
        if amount > old.amount {
            return Err(HiveError::InsufficientStake {
                requested: amount.raw(),
                available: old.amount.raw(),
            });
        }

        let accrual = self.portion_accrual(store, &old, amount, token, now)?;
        let remaining = old.amount - amount;
        let new = match old.since {
            Some(since) => Stake::new(remaining, since),
            None => Stake::EMPTY,
        };

        let mut batch = WriteBatch::new(now);
        if old != new {
            batch.put_stake(participant, token, &old, new)?;
        }
        if !accrual.is_zero() {
            batch.adjust_reserve(token, Delta::Debit(accrual.raw()));
        }

        let total = amount
            .checked_add(accrual)
            .ok_or_else(|| HiveError::InvalidState("payout overflows".into()))?;
        let movement = (!total.is_zero()).then_some(Movement::Push {
            token,
            to: participant,
            amount: total,
        });
        let settlement = Settlement {
            batch,
            movement,
            event: HiveEvent::Withdrawn {
                participant,
                token,
                principal: amount,
                accrual,
                at: now,
            },
        };
        let payout = Payout {
            principal: amount,
            accrual,
        };
        Ok((settlement, payout))
    }

    /// Plan a claim of the whole stake's accrual. Principal stays; the
    /// stake's weighting restarts at `now`. Returns the plan and the accrual
    /// it pays.
    pub fn claim<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        participant: ParticipantId,
        token: TokenId,
        now: Timestamp,
    ) -> Result<(Settlement, Amount), HiveError> {
        check_time(store, now)?;
        let old = store.get_stake(&participant, token);
        let accrual = self.portion_accrual(store, &old, old.amount, token, now)?;
        if accrual.is_zero() {
            return Err(HiveError::NothingToClaim);
        }

        let mut batch = WriteBatch::new(now);
        batch.put_stake(participant, token, &old, Stake::new(old.amount, now))?;
        batch.adjust_reserve(token, Delta::Debit(accrual.raw()));

        let settlement = Settlement {
            batch,
            movement: Some(Movement::Push {
                token,
                to: participant,
                amount: accrual,
            }),
            event: HiveEvent::Claimed {
                participant,
                token,
                accrual,
                at: now,
            },
        };
        Ok((settlement, accrual))
    }

    /// Plan adding `amount` to `token`'s reward reserve.
    pub fn fund<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        funder: Address,
        token: TokenId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Settlement, HiveError> {
        check_time(store, now)?;
        if amount.is_zero() {
            return Err(HiveError::ZeroAmount);
        }
        let mut batch = WriteBatch::new(now);
        batch.adjust_reserve(token, Delta::Credit(amount.raw()));
        Ok(Settlement {
            batch,
            movement: Some(Movement::Pull {
                token,
                from: funder,
                amount,
            }),
            event: HiveEvent::Funded {
                funder,
                token,
                amount,
                at: now,
            },
        })
    }

    /// Accrual the participant's whole stake would receive if claimed at `now`.
    pub fn accrued<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        participant: &ParticipantId,
        token: TokenId,
        now: Timestamp,
    ) -> Result<Amount, HiveError> {
        let stake = store.get_stake(participant, token);
        self.portion_accrual(store, &stake, stake.amount, token, now)
    }

    /// Aggregate stake-seconds of `token`'s pool at `now`.
    pub fn pool_weight<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        token: TokenId,
        now: Timestamp,
    ) -> Result<U256, HiveError> {
        store.get_pool(token).total_weight(now).ok_or_else(|| {
            HiveError::InvalidState(format!("pool weight for {token} undefined at {now}"))
        })
    }

    /// Stake-seconds held by one participant at `now`.
    pub fn stake_weight<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        participant: &ParticipantId,
        token: TokenId,
        now: Timestamp,
    ) -> U256 {
        store.get_stake(participant, token).weight(now)
    }

    fn portion_accrual<S: LedgerStore + ?Sized>(
        &self,
        store: &S,
        stake: &Stake,
        portion: Amount,
        token: TokenId,
        now: Timestamp,
    ) -> Result<Amount, HiveError> {
        let reserve = store.get_pool(token).reward_reserve;
        let part = stake.portion_weight(portion, now);
        if reserve.is_zero() || part.is_zero() {
            return Ok(Amount::ZERO);
        }
        let whole = self.pool_weight(store, token, now)?;
        distribution_share(reserve, part, whole)
    }
}

/// Reject a `now` earlier than the latest accepted time.
fn check_time<S: LedgerStore + ?Sized>(store: &S, now: Timestamp) -> Result<(), HiveError> {
    match store.latest_time() {
        Some(latest) if now < latest => Err(HiveError::InvalidState(format!(
            "time {now} precedes latest accepted time {latest}"
        ))),
        _ => Ok(()),
    }
}
