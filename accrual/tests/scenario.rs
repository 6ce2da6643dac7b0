//! End-to-end hive scenarios driven through the public facade with a
//! deterministic clock and an in-memory transfer primitive.

use hive_accrual::{Hive, HiveError, HiveEvent};
use hive_nullables::{NullClock, NullTransfer, TransferDirection};
use hive_store::{LedgerStore, MemoryStore, Pool, Stake};
use hive_types::time::SECS_PER_WEEK;
use hive_types::{Address, Amount, Timestamp, TokenId, U256};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const T0: u64 = 1_700_000_000;

fn wallet(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn funded_transfer() -> NullTransfer {
    let t = NullTransfer::new();
    for n in 1..=3 {
        t.credit(wallet(n), TokenId::Native, Amount::new(1_000_000));
    }
    t.credit(wallet(99), TokenId::Native, Amount::new(1_000_000));
    t
}

fn assert_custody_matches(hive: &Hive<MemoryStore, &NullClock, &NullTransfer>, token: TokenId) {
    let pool = hive.pool(token);
    let held = hive.transfer().custody(token);
    assert_eq!(
        held.raw(),
        pool.total_staked.raw() + pool.reward_reserve.raw(),
        "custody must equal principal plus reserve"
    );
}

// ---------------------------------------------------------------------------
// Zero deposits then a week of idle time
// ---------------------------------------------------------------------------

#[test]
fn zero_deposits_then_single_unit_then_one_week() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    for n in 1..=3 {
        hive.deposit(wallet(n), native, Amount::ZERO).unwrap();
    }
    assert_eq!(hive.pool(native).total_staked, Amount::ZERO);
    for n in 1..=3 {
        assert!(hive.stake_exists(&wallet(n), native));
        assert_eq!(hive.stake(&wallet(n), native).amount, Amount::ZERO);
    }
    assert!(transfer.transfers().is_empty(), "zero deposits move nothing");

    hive.deposit(wallet(1), native, Amount::new(1)).unwrap();
    let expected = Stake::new(Amount::new(1), Timestamp::new(T0));
    assert_eq!(hive.stake(&wallet(1), native), expected);
    assert_eq!(hive.pool(native).total_staked, Amount::new(1));

    assert_eq!(hive.stake_weight(&wallet(1), native), U256::ZERO);

    clock.advance(SECS_PER_WEEK);

    // Records are untouched by the passage of time.
    assert_eq!(hive.stake(&wallet(1), native), expected);
    for n in 2..=3 {
        assert_eq!(hive.stake(&wallet(n), native), Stake::EMPTY);
    }
    assert_eq!(hive.pool(native).total_staked, Amount::new(1));

    // Only the derived quantities move.
    let week = U256::from(SECS_PER_WEEK as u128);
    assert_eq!(hive.stake_weight(&wallet(1), native), week);
    assert_eq!(hive.pool_weight(native).unwrap(), week);
    assert_eq!(hive.stake_weight(&wallet(2), native), U256::ZERO);
    assert_eq!(hive.accrued(&wallet(1), native).unwrap(), Amount::ZERO);

    hive.fund(wallet(99), native, Amount::new(500)).unwrap();
    assert_eq!(hive.accrued(&wallet(1), native).unwrap(), Amount::new(500));
    assert_eq!(hive.accrued(&wallet(2), native).unwrap(), Amount::ZERO);
    assert_custody_matches(&hive, native);
}

// ---------------------------------------------------------------------------
// Withdrawals and claims
// ---------------------------------------------------------------------------

#[test]
fn full_withdraw_zeroes_stake_and_pool_contribution() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(40)).unwrap();
    clock.advance(100);
    hive.deposit(wallet(1), native, Amount::new(60)).unwrap();
    clock.advance(SECS_PER_WEEK);

    let payout = hive.withdraw(wallet(1), native, Amount::new(100)).unwrap();
    assert_eq!(payout.principal, Amount::new(100));
    assert_eq!(payout.accrual, Amount::ZERO);

    assert_eq!(hive.stake(&wallet(1), native), Stake::EMPTY);
    assert!(hive.stake_exists(&wallet(1), native));
    assert_eq!(hive.pool(native), Pool::EMPTY);
    assert_eq!(
        transfer.balance_of(wallet(1), native),
        Amount::new(1_000_000)
    );
    assert_custody_matches(&hive, native);
}

#[test]
fn withdraw_pays_share_and_leaves_others_untouched() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(1)).unwrap();
    hive.deposit(wallet(2), native, Amount::new(3)).unwrap();
    hive.fund(wallet(99), native, Amount::new(1_000)).unwrap();
    clock.advance(SECS_PER_WEEK);

    let before = hive.accrued(&wallet(2), native).unwrap();
    assert_eq!(before, Amount::new(750));

    let payout = hive.withdraw(wallet(1), native, Amount::new(1)).unwrap();
    assert_eq!(payout.accrual, Amount::new(250));
    assert_eq!(payout.total(), Amount::new(251));

    assert_eq!(hive.accrued(&wallet(2), native).unwrap(), before);
    assert_eq!(hive.pool(native).reward_reserve, Amount::new(750));
    assert_custody_matches(&hive, native);
}

#[test]
fn partial_withdraw_keeps_anchor() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(10)).unwrap();
    clock.advance(SECS_PER_WEEK);
    hive.withdraw(wallet(1), native, Amount::new(4)).unwrap();

    assert_eq!(
        hive.stake(&wallet(1), native),
        Stake::new(Amount::new(6), Timestamp::new(T0))
    );
    assert_eq!(hive.pool(native).total_staked, Amount::new(6));
}

#[test]
fn claim_pays_accrual_and_restarts_weighting() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(5)).unwrap();
    hive.fund(wallet(99), native, Amount::new(90)).unwrap();
    clock.advance(SECS_PER_WEEK);

    let claimed = hive.claim(wallet(1), native).unwrap();
    assert_eq!(claimed, Amount::new(90));
    assert_eq!(
        hive.stake(&wallet(1), native),
        Stake::new(Amount::new(5), Timestamp::new(T0 + SECS_PER_WEEK))
    );
    assert_eq!(hive.pool(native).reward_reserve, Amount::ZERO);
    assert!(matches!(
        hive.claim(wallet(1), native),
        Err(HiveError::NothingToClaim)
    ));
    assert_custody_matches(&hive, native);
}

#[test]
fn withdraw_beyond_stake_is_rejected_without_mutation() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(2)).unwrap();
    let before = hive.snapshot();
    let err = hive.withdraw(wallet(1), native, Amount::new(3)).unwrap_err();
    assert!(matches!(
        err,
        HiveError::InsufficientStake {
            requested: 3,
            available: 2
        }
    ));
    assert_eq!(hive.snapshot().hash, before.hash);
}

// ---------------------------------------------------------------------------
// Large-supply tokens
// ---------------------------------------------------------------------------

/// The largest stake whose `amount × since` term fits at `T0`.
const LARGEST_AT_T0: u128 = u128::MAX / T0 as u128;

#[test]
fn large_deposit_stays_withdrawable_after_a_week() {
    let clock = NullClock::new(T0);
    let transfer = NullTransfer::new();
    let token = TokenId::from(wallet(0xaa));
    transfer.credit(wallet(1), token, Amount::new(LARGEST_AT_T0));
    let mut hive = Hive::in_memory(&clock, &transfer);

    hive.deposit(wallet(1), token, Amount::new(LARGEST_AT_T0)).unwrap();
    clock.advance(SECS_PER_WEEK);

    // `total_staked × now` no longer fits u128; the weight is still defined.
    let weight = hive.pool_weight(token).unwrap();
    assert_eq!(weight, U256::mul(LARGEST_AT_T0, SECS_PER_WEEK as u128));
    assert_eq!(weight, hive.stake_weight(&wallet(1), token));
    assert_eq!(hive.accrued(&wallet(1), token).unwrap(), Amount::ZERO);

    let payout = hive
        .withdraw(wallet(1), token, Amount::new(LARGEST_AT_T0))
        .unwrap();
    assert_eq!(payout.principal, Amount::new(LARGEST_AT_T0));
    assert_eq!(payout.accrual, Amount::ZERO);
    assert_eq!(hive.pool(token), Pool::EMPTY);
    assert_eq!(transfer.balance_of(wallet(1), token), Amount::new(LARGEST_AT_T0));
    assert_custody_matches(&hive, token);
}

#[test]
fn large_deposit_collects_whole_reserve_after_a_week() {
    let clock = NullClock::new(T0);
    let transfer = NullTransfer::new();
    let token = TokenId::from(wallet(0xaa));
    transfer.credit(wallet(1), token, Amount::new(LARGEST_AT_T0));
    transfer.credit(wallet(99), token, Amount::new(1_000_000));
    let mut hive = Hive::in_memory(&clock, &transfer);

    hive.deposit(wallet(1), token, Amount::new(LARGEST_AT_T0)).unwrap();
    hive.fund(wallet(99), token, Amount::new(1_000_000)).unwrap();
    clock.advance(SECS_PER_WEEK);

    assert_eq!(hive.accrued(&wallet(1), token).unwrap(), Amount::new(1_000_000));
    let payout = hive
        .withdraw(wallet(1), token, Amount::new(LARGEST_AT_T0))
        .unwrap();
    assert_eq!(payout.accrual, Amount::new(1_000_000));
    assert_eq!(hive.pool(token), Pool::EMPTY);
    assert_custody_matches(&hive, token);
}

#[test]
fn deposit_past_anchor_range_is_rejected_without_mutation() {
    let clock = NullClock::new(T0);
    let transfer = NullTransfer::new();
    let token = TokenId::from(wallet(0xaa));
    transfer.credit(wallet(1), token, Amount::new(u128::MAX));
    transfer.credit(wallet(2), token, Amount::new(LARGEST_AT_T0));
    let mut hive = Hive::in_memory(&clock, &transfer);

    // A single stake whose anchor term overflows.
    let before = hive.snapshot();
    let err = hive
        .deposit(wallet(1), token, Amount::new(LARGEST_AT_T0 + 1))
        .unwrap_err();
    assert!(matches!(err, HiveError::InvalidState(_)));
    assert_eq!(hive.snapshot().hash, before.hash);
    assert!(hive.events().is_empty());
    assert_eq!(transfer.custody(token), Amount::ZERO);

    // Two stakes that fit alone but overflow the pool's anchor sum.
    hive.deposit(wallet(1), token, Amount::new(LARGEST_AT_T0)).unwrap();
    let before = hive.snapshot();
    let err = hive
        .deposit(wallet(2), token, Amount::new(LARGEST_AT_T0))
        .unwrap_err();
    assert!(matches!(err, HiveError::InvalidState(_)));
    assert_eq!(hive.snapshot().hash, before.hash);
    assert_eq!(transfer.balance_of(wallet(2), token), Amount::new(LARGEST_AT_T0));
    assert_custody_matches(&hive, token);
}

// ---------------------------------------------------------------------------
// Rollback
// ---------------------------------------------------------------------------

#[test]
fn store_out_of_balance_refuses_calls_before_moving_value() {
    let native = TokenId::Native;
    let mut store = MemoryStore::new();
    // A stake the pool totals know nothing about.
    store
        .set_stake(&wallet(1), native, Stake::new(Amount::new(5), Timestamp::new(T0)), Timestamp::new(T0))
        .unwrap();
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::new(store.clone(), &clock, &transfer);

    let err = hive.deposit(wallet(2), native, Amount::new(1)).unwrap_err();
    assert!(matches!(err, HiveError::InvalidState(_)));
    let err = hive.withdraw(wallet(1), native, Amount::new(5)).unwrap_err();
    assert!(matches!(err, HiveError::InvalidState(_)));

    assert_eq!(hive.store(), &store);
    assert!(transfer.transfers().is_empty());
    assert!(hive.events().is_empty());
}

#[test]
fn declined_transfer_rolls_back_the_call() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(10)).unwrap();
    clock.advance(60);
    let before = hive.snapshot();
    let events = hive.events().len();

    transfer.decline_next();
    let err = hive.deposit(wallet(1), native, Amount::new(5)).unwrap_err();
    assert!(matches!(err, HiveError::TransferFailure(_)));
    assert_eq!(hive.snapshot().hash, before.hash);
    assert_eq!(hive.store().latest_time(), Some(Timestamp::new(T0)));
    assert_eq!(hive.events().len(), events);

    transfer.decline_next();
    assert!(hive.withdraw(wallet(1), native, Amount::new(10)).is_err());
    assert_eq!(hive.snapshot().hash, before.hash);
    assert_custody_matches(&hive, native);
}

#[test]
fn deposit_beyond_outside_balance_fails() {
    let clock = NullClock::new(T0);
    let transfer = NullTransfer::new().with_balance(wallet(1), TokenId::Native, Amount::new(3));
    let mut hive = Hive::in_memory(&clock, &transfer);

    let err = hive
        .deposit(wallet(1), TokenId::Native, Amount::new(4))
        .unwrap_err();
    assert!(matches!(err, HiveError::TransferFailure(_)));
    assert!(!hive.stake_exists(&wallet(1), TokenId::Native));
    assert_eq!(hive.pool(TokenId::Native), Pool::EMPTY);
}

#[test]
fn calls_in_the_past_are_rejected() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(1)).unwrap();
    clock.set(T0 - 1);
    let before = hive.snapshot();
    assert!(matches!(
        hive.deposit(wallet(2), native, Amount::new(1)),
        Err(HiveError::InvalidState(_))
    ));
    assert!(matches!(
        hive.fund(wallet(99), native, Amount::new(1)),
        Err(HiveError::InvalidState(_))
    ));
    assert_eq!(hive.snapshot().hash, before.hash);

    // Equal time is fine: zero-length gaps are valid.
    clock.set(T0);
    hive.deposit(wallet(2), native, Amount::new(1)).unwrap();
}

// ---------------------------------------------------------------------------
// Tokens, events and snapshots
// ---------------------------------------------------------------------------

#[test]
fn pools_are_independent_per_token() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let erc = TokenId::from(wallet(0xe7c));
    transfer.credit(wallet(1), erc, Amount::new(50));
    let mut hive = Hive::in_memory(&clock, &transfer);

    hive.deposit(wallet(1), TokenId::Native, Amount::new(7)).unwrap();
    hive.deposit(wallet(1), erc, Amount::new(50)).unwrap();

    assert_eq!(hive.pool(TokenId::Native).total_staked, Amount::new(7));
    assert_eq!(hive.pool(erc).total_staked, Amount::new(50));
    assert_eq!(transfer.custody(erc), Amount::new(50));
    assert_eq!(TokenId::from(Address::ZERO), TokenId::Native);
    hive.store().check_conservation(erc).unwrap();
}

#[test]
fn events_record_committed_calls_in_order() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(3)).unwrap();
    hive.fund(wallet(99), native, Amount::new(30)).unwrap();
    clock.advance(10);
    hive.withdraw(wallet(1), native, Amount::new(3)).unwrap();

    let events = hive.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], HiveEvent::Deposited { .. }));
    assert!(matches!(events[1], HiveEvent::Funded { .. }));
    assert!(matches!(
        events[2],
        HiveEvent::Withdrawn { accrual, .. } if accrual == Amount::new(30)
    ));

    let json = serde_json::to_string(&events[0]).unwrap();
    assert!(json.contains("deposited"));

    let directions: Vec<_> = transfer.transfers().iter().map(|r| r.direction).collect();
    assert_eq!(
        directions,
        vec![
            TransferDirection::Pull,
            TransferDirection::Pull,
            TransferDirection::Push
        ]
    );
}

#[test]
fn snapshot_restores_an_equivalent_hive() {
    let clock = NullClock::new(T0);
    let transfer = funded_transfer();
    let mut hive = Hive::in_memory(&clock, &transfer);
    let native = TokenId::Native;

    hive.deposit(wallet(1), native, Amount::new(8)).unwrap();
    hive.deposit(wallet(2), native, Amount::ZERO).unwrap();
    hive.fund(wallet(99), native, Amount::new(64)).unwrap();
    clock.advance(SECS_PER_WEEK);

    let snap = hive.snapshot();
    let restored = Hive::from_snapshot(&snap, &clock, &transfer).unwrap();
    assert_eq!(restored.store(), hive.store());
    assert_eq!(
        restored.accrued(&wallet(1), native).unwrap(),
        hive.accrued(&wallet(1), native).unwrap()
    );
    assert!(restored.stake_exists(&wallet(2), native));
}
