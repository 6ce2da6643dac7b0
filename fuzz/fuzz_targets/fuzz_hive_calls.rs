#![no_main]

use libfuzzer_sys::fuzz_target;

use hive_accrual::Hive;
use hive_nullables::{NullClock, NullTransfer};
use hive_store::LedgerStore;
use hive_types::{Address, Amount, TokenId};

// Drive a hive with arbitrary calls. Each 10-byte chunk is one call:
// [op, wallet, 8 bytes of little-endian amount or seconds]. Pool totals
// must always match the stakes, whatever succeeds.
fuzz_target!(|data: &[u8]| {
    let clock = NullClock::new(1_000);
    let transfer = NullTransfer::new();
    for n in 0..4u64 {
        transfer.credit(Address::from_low_u64(n), TokenId::Native, Amount::new(u64::MAX as u128));
    }
    let mut hive = Hive::in_memory(&clock, &transfer);

    for chunk in data.chunks_exact(10) {
        let who = Address::from_low_u64(u64::from(chunk[1] % 4));
        let value = u64::from_le_bytes([
            chunk[2], chunk[3], chunk[4], chunk[5],
            chunk[6], chunk[7], chunk[8], chunk[9],
        ]);
        let amount = Amount::new(u128::from(value));
        let _ = match chunk[0] % 5 {
            0 => hive.deposit(who, TokenId::Native, amount).map(|_| ()),
            1 => hive.withdraw(who, TokenId::Native, amount).map(|_| ()),
            2 => hive.claim(who, TokenId::Native).map(|_| ()),
            3 => hive.fund(who, TokenId::Native, amount).map(|_| ()),
            _ => {
                clock.advance(value % 10_000_000);
                Ok(())
            }
        };
        assert!(hive.store().check_conservation(TokenId::Native).is_ok());
    }
});
