#![no_main]

use libfuzzer_sys::fuzz_target;

use rebase_ledger::{LedgerSnapshot, RebasingLedger};

// Decoding and restoring arbitrary bytes must fail cleanly, never panic.
fuzz_target!(|data: &[u8]| {
    if let Ok(snapshot) = LedgerSnapshot::from_bytes(data) {
        let _ = snapshot.verify();
        if let Ok(ledger) = RebasingLedger::from_snapshot(snapshot) {
            let _ = ledger.total_supply_checked();
        }
    }
});
