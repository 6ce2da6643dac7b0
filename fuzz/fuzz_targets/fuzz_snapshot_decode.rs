#![no_main]

use libfuzzer_sys::fuzz_target;

use hive_store::LedgerSnapshot;

fuzz_target!(|data: &[u8]| {
    // Decoding and restoring arbitrary bytes must fail cleanly, never panic.
    if let Ok(snapshot) = LedgerSnapshot::from_bytes(data) {
        let _ = snapshot.verify();
        let _ = snapshot.restore();
    }

    let _ = bincode::deserialize::<hive_types::Amount>(data);
    let _ = bincode::deserialize::<hive_types::Address>(data);
    let _ = bincode::deserialize::<hive_types::TokenId>(data);
    let _ = bincode::deserialize::<hive_store::Stake>(data);
});
