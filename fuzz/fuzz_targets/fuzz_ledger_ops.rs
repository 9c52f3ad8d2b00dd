#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rebase_ledger::{LedgerConfig, RebasingLedger, Role};
use rebase_types::{Address, RebaseState};

const ADMIN: u64 = 0xa0;
const RESERVE: u64 = 0xff;

#[derive(Arbitrary, Debug)]
enum Op {
    Mint { to: u8, amount: u32 },
    Burn { from: u8, amount: u32 },
    Transfer { from: u8, to: u8, amount: u64 },
    TransferFrom { spender: u8, from: u8, to: u8, amount: u64 },
    Approve { owner: u8, spender: u8, amount: u64 },
    DecreaseAllowance { owner: u8, spender: u8, amount: u64 },
    OptOut { account: u8 },
    OptIn { account: u8 },
    ChangeSupply { percent: u8 },
}

#[derive(Arbitrary, Debug)]
struct Input {
    mints: [u32; 4],
    ops: Vec<Op>,
}

fn account(i: u8) -> Address {
    // Index 0 maps to the zero address so its rejections get exercised too.
    Address::from_low_u64(u64::from(i % 7))
}

/// `(all balances, non-rebasing balances)` over every reachable account.
fn holdings(ledger: &RebasingLedger) -> (u128, u128) {
    let mut held = 0u128;
    let mut fixed = 0u128;
    for a in (1..7).chain(std::iter::once(RESERVE)).map(Address::from_low_u64) {
        let balance = ledger.balance_of(&a);
        held = held.saturating_add(balance);
        if ledger.rebase_state(&a) == RebaseState::NonRebasing {
            fixed = fixed.saturating_add(balance);
        }
    }
    (held, fixed)
}

// Arbitrary operation sequences must never panic. The non-rebasing pool
// matches its accounts, balances never exceed total supply, and only mint,
// burn and change_supply can add to the sum of balances.
fuzz_target!(|input: Input| {
    let admin = Address::from_low_u64(ADMIN);
    let mut config = LedgerConfig::new(admin);
    config.exchanger = Some(admin);
    config.payout_manager = Some(admin);
    config.non_rebasing.push(Address::from_low_u64(RESERVE));
    let mut ledger = match RebasingLedger::new(config) {
        Ok(ledger) => ledger,
        Err(_) => return,
    };
    let Ok(exchanger) = ledger.authorize(&admin, Role::Exchanger) else {
        return;
    };
    let Ok(payout) = ledger.authorize(&admin, Role::PayoutManager) else {
        return;
    };

    let _ = ledger.mint(&exchanger, &Address::from_low_u64(RESERVE), 1_000_000);
    for (i, amount) in input.mints.iter().enumerate() {
        let _ = ledger.mint(&exchanger, &account(i as u8 + 1), u128::from(*amount));
    }

    for op in input.ops.iter().take(256) {
        let (held_before, _) = holdings(&ledger);
        let mut supply_may_move = false;
        match *op {
            Op::Mint { to, amount } => {
                supply_may_move = true;
                let _ = ledger.mint(&exchanger, &account(to), u128::from(amount));
            }
            Op::Burn { from, amount } => {
                supply_may_move = true;
                let _ = ledger.burn(&exchanger, &account(from), u128::from(amount));
            }
            Op::Transfer { from, to, amount } => {
                let _ = ledger.transfer(&account(from), &account(to), u128::from(amount));
            }
            Op::TransferFrom {
                spender,
                from,
                to,
                amount,
            } => {
                let _ = ledger.transfer_from(
                    &account(spender),
                    &account(from),
                    &account(to),
                    u128::from(amount),
                );
            }
            Op::Approve {
                owner,
                spender,
                amount,
            } => {
                let _ = ledger.approve(&account(owner), &account(spender), u128::from(amount));
            }
            Op::DecreaseAllowance {
                owner,
                spender,
                amount,
            } => {
                let _ = ledger.decrease_allowance(
                    &account(owner),
                    &account(spender),
                    u128::from(amount),
                );
            }
            Op::OptOut { account: i } => {
                let _ = ledger.rebase_opt_out(&payout, &account(i));
            }
            Op::OptIn { account: i } => {
                let _ = ledger.rebase_opt_in(&payout, &account(i));
            }
            Op::ChangeSupply { percent } => {
                supply_may_move = true;
                let fixed = ledger.non_rebasing_supply();
                if let Ok(total) = ledger.total_supply_checked() {
                    let rebasing = total.saturating_sub(fixed);
                    let target = rebasing * (50 + u128::from(percent % 151)) / 100;
                    let _ = ledger.change_supply(&payout, fixed.saturating_add(target));
                }
            }
        }

        let _ = ledger.drain_events();
        let (held, fixed) = holdings(&ledger);
        assert_eq!(ledger.non_rebasing_supply(), fixed, "pool drifted on {op:?}");
        if let Ok(total) = ledger.total_supply_checked() {
            assert!(held <= total, "balances {held} exceed total {total} after {op:?}");
        }
        if !supply_may_move {
            assert!(held <= held_before, "{op:?} grew balances from {held_before} to {held}");
        }
    }

    let _ = ledger.snapshot().verify();
});
