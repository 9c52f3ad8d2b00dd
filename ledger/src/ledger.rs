//! The rebasing ledger engine.

use rebase_types::{Address, RebaseState, TokenParams};
use std::collections::HashMap;

use crate::account::Account;
use crate::allowance::Allowances;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::event::{EventLog, LedgerEvent};
use crate::math::{self, INITIAL_CREDITS_PER_TOKEN, MAX_SUPPLY, PRECISION};
use crate::roles::{Capability, Role, RoleTable};

/// The two supply pools. Staged as a value so a call can compute the new
/// pools in full before committing anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pools {
    rebasing_credits: u128,
    non_rebasing_supply: u128,
}

/// Credits-based balance ledger with a global rebasing rate.
///
/// Rebasing balances are `credits * 1e18 / rebasing_credits_per_token`, so a
/// supply change is a single rate update: O(1) regardless of how many
/// accounts exist. Non-rebasing accounts freeze their own rate and are
/// untouched by supply changes.
///
/// The sum of all balances never exceeds `total_supply()`. The gap is the
/// rebasing pool's rounding dust: less than one unit per rebasing account.
#[derive(Debug)]
pub struct RebasingLedger {
    params: TokenParams,
    roles: RoleTable,
    accounts: HashMap<Address, Account>,
    allowances: Allowances,
    /// Sum of credits over all rebasing accounts.
    rebasing_credits: u128,
    /// Global credits-per-token at scale 1e18. Starts at
    /// `INITIAL_CREDITS_PER_TOKEN`.
    rebasing_credits_per_token: u128,
    /// Sum of non-rebasing token balances.
    non_rebasing_supply: u128,
    events: EventLog,
}

impl RebasingLedger {
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;

        let mut roles = RoleTable::new(config.admin);
        if let Some(exchanger) = config.exchanger {
            roles.assign(Role::Exchanger, exchanger);
        }
        if let Some(payout_manager) = config.payout_manager {
            roles.assign(Role::PayoutManager, payout_manager);
        }

        let accounts = config
            .non_rebasing
            .iter()
            .map(|addr| (*addr, Account::non_rebasing()))
            .collect();

        Ok(Self {
            params: config.token,
            roles,
            accounts,
            allowances: Allowances::new(),
            rebasing_credits: 0,
            rebasing_credits_per_token: INITIAL_CREDITS_PER_TOKEN,
            non_rebasing_supply: 0,
            events: EventLog::new(),
        })
    }

    /// Reassemble a ledger from already-verified parts (see `snapshot`).
    pub(crate) fn from_parts(
        params: TokenParams,
        roles: RoleTable,
        accounts: HashMap<Address, Account>,
        allowances: Allowances,
        rebasing_credits: u128,
        rebasing_credits_per_token: u128,
        non_rebasing_supply: u128,
    ) -> Self {
        Self {
            params,
            roles,
            accounts,
            allowances,
            rebasing_credits,
            rebasing_credits_per_token,
            non_rebasing_supply,
            events: EventLog::new(),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn params(&self) -> &TokenParams {
        &self.params
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn symbol(&self) -> &str {
        &self.params.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.params.decimals
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    /// Stored position of `address`, if it has ever been touched.
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Account)> {
        self.accounts.iter()
    }

    pub(crate) fn allowance_entries(&self) -> &Allowances {
        &self.allowances
    }

    fn load(&self, address: &Address) -> Account {
        self.accounts.get(address).copied().unwrap_or_default()
    }

    /// Token balance with checked arithmetic.
    pub fn balance_of_checked(&self, address: &Address) -> Result<u128, LedgerError> {
        if address.is_zero() {
            return Ok(0);
        }
        self.load(address)
            .balance_checked(self.rebasing_credits_per_token)
    }

    /// Token balance, returning 0 on overflow. The zero address is always 0.
    pub fn balance_of(&self, address: &Address) -> u128 {
        self.balance_of_checked(address).unwrap_or(0)
    }

    /// `(credits, credits_per_token)`: the account's raw position and the
    /// rate it converts at.
    pub fn credits_balance_of(&self, address: &Address) -> (u128, u128) {
        let account = self.load(address);
        (
            account.credits(),
            account.credits_per_token(self.rebasing_credits_per_token),
        )
    }

    pub fn rebase_state(&self, address: &Address) -> RebaseState {
        self.load(address).state()
    }

    pub fn rebasing_credits_highres(&self) -> u128 {
        self.rebasing_credits
    }

    pub fn rebasing_credits_per_token_highres(&self) -> u128 {
        self.rebasing_credits_per_token
    }

    pub fn non_rebasing_supply(&self) -> u128 {
        self.non_rebasing_supply
    }

    /// Token value of `credits` rebasing credits, rounded up.
    fn rebasing_supply(&self, credits: u128) -> Result<u128, LedgerError> {
        math::to_tokens_ceil(credits, self.rebasing_credits_per_token)
    }

    fn supply_of(&self, pools: Pools) -> Result<u128, LedgerError> {
        self.rebasing_supply(pools.rebasing_credits)?
            .checked_add(pools.non_rebasing_supply)
            .ok_or(LedgerError::Overflow)
    }

    fn pools(&self) -> Pools {
        Pools {
            rebasing_credits: self.rebasing_credits,
            non_rebasing_supply: self.non_rebasing_supply,
        }
    }

    /// `ceil(rebasing_credits * 1e18 / rate) + non_rebasing_supply`.
    pub fn total_supply_checked(&self) -> Result<u128, LedgerError> {
        self.supply_of(self.pools())
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply_checked().unwrap_or(MAX_SUPPLY)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(owner, spender)
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Take every event emitted since the last drain. The log keeps growing
    /// until the host drains it, so call this after every operation.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> &[LedgerEvent] {
        self.events.pending()
    }

    // ── Roles ───────────────────────────────────────────────────────────

    /// Exchange `caller` for a capability if it currently holds `role`.
    pub fn authorize(&self, caller: &Address, role: Role) -> Result<Capability, LedgerError> {
        self.roles.authorize(caller, role)
    }

    /// Hand `role` to `holder`. Admin only.
    pub fn assign_role(
        &mut self,
        cap: &Capability,
        role: Role,
        holder: Address,
    ) -> Result<(), LedgerError> {
        self.roles.check(cap, &[Role::Admin])?;
        if holder.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "role holder must not be the zero address",
            ));
        }
        self.roles.assign(role, holder);
        tracing::info!(%role, %holder, "role assigned");
        self.events.push(LedgerEvent::RoleAssigned { role, holder });
        Ok(())
    }

    pub fn set_exchanger(&mut self, cap: &Capability, holder: Address) -> Result<(), LedgerError> {
        self.assign_role(cap, Role::Exchanger, holder)
    }

    pub fn set_payout_manager(
        &mut self,
        cap: &Capability,
        holder: Address,
    ) -> Result<(), LedgerError> {
        self.assign_role(cap, Role::PayoutManager, holder)
    }

    /// Hand the admin role over. The caller's admin capability stops working.
    pub fn set_admin(&mut self, cap: &Capability, holder: Address) -> Result<(), LedgerError> {
        self.assign_role(cap, Role::Admin, holder)
    }

    // ── Pool bookkeeping ────────────────────────────────────────────────

    /// Pools after each `(before, after)` position change is applied.
    ///
    /// Rebasing positions move `rebasing_credits` by their credits and
    /// non-rebasing positions move `non_rebasing_supply` by their token
    /// balance, so the pools stay the sum of the positions they cover.
    fn pools_after(&self, changes: &[(Account, Account)]) -> Result<Pools, LedgerError> {
        let global = self.rebasing_credits_per_token;
        let mut credits_in = 0u128;
        let mut credits_out = 0u128;
        let mut supply_in = 0u128;
        let mut supply_out = 0u128;
        for (before, after) in changes {
            if before.is_rebasing() {
                credits_out = credits_out
                    .checked_add(before.credits())
                    .ok_or(LedgerError::Overflow)?;
            } else {
                supply_out = supply_out
                    .checked_add(before.balance_checked(global)?)
                    .ok_or(LedgerError::Overflow)?;
            }
            if after.is_rebasing() {
                credits_in = credits_in
                    .checked_add(after.credits())
                    .ok_or(LedgerError::Overflow)?;
            } else {
                supply_in = supply_in
                    .checked_add(after.balance_checked(global)?)
                    .ok_or(LedgerError::Overflow)?;
            }
        }
        let rebasing_credits = self
            .rebasing_credits
            .checked_add(credits_in)
            .and_then(|c| c.checked_sub(credits_out))
            .ok_or(LedgerError::Overflow)?;
        let non_rebasing_supply = self
            .non_rebasing_supply
            .checked_add(supply_in)
            .and_then(|s| s.checked_sub(supply_out))
            .ok_or(LedgerError::Overflow)?;
        Ok(Pools {
            rebasing_credits,
            non_rebasing_supply,
        })
    }

    fn commit_pools(&mut self, pools: Pools) {
        self.rebasing_credits = pools.rebasing_credits;
        self.non_rebasing_supply = pools.non_rebasing_supply;
    }

    fn ensure_balance(&self, account: &Account, amount: u128) -> Result<(), LedgerError> {
        let available = account.balance_checked(self.rebasing_credits_per_token)?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Credits to take from `account` for `amount` tokens, rounded up.
    ///
    /// A remainder worth less than one base unit is swept along with the
    /// debit, so emptying an account leaves no credit dust behind.
    fn debit_credits(&self, account: &Account, amount: u128) -> Result<u128, LedgerError> {
        let current = account.credits();
        let rate = account.credits_per_token(self.rebasing_credits_per_token);
        let credits = math::to_credits_ceil(amount, rate)?.min(current);
        if math::to_tokens(current - credits, rate)? == 0 {
            return Ok(current);
        }
        Ok(credits)
    }

    // ── Mint / burn ─────────────────────────────────────────────────────

    /// Create `amount` tokens for `to`. Exchanger only.
    pub fn mint(&mut self, cap: &Capability, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.roles.check(cap, &[Role::Exchanger])?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("mint amount must be non-zero"));
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidAmount("mint to the zero address"));
        }

        let account = self.load(to).with_rate_if_unset(PRECISION);
        let rate = account.credits_per_token(self.rebasing_credits_per_token);
        let credits = math::to_credits(amount, rate)?;
        if credits == 0 {
            return Err(LedgerError::InvalidAmount("mint amount is worth less than one credit"));
        }
        let updated = account.with_credits(
            account
                .credits()
                .checked_add(credits)
                .ok_or(LedgerError::Overflow)?,
        );

        let pools = self.pools_after(&[(account, updated)])?;
        // Rejects a total supply past MAX_SUPPLY.
        self.supply_of(pools)?;

        self.accounts.insert(*to, updated);
        self.commit_pools(pools);
        tracing::debug!(%to, amount, credits, "mint");
        self.events.push(LedgerEvent::Transfer {
            from: Address::ZERO,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Destroy `amount` tokens held by `from`. Exchanger only.
    ///
    /// Credits are taken rounded up, so the holder loses at least `amount`.
    /// Burning the whole balance zeroes the position.
    pub fn burn(&mut self, cap: &Capability, from: &Address, amount: u128) -> Result<(), LedgerError> {
        self.roles.check(cap, &[Role::Exchanger])?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount("burn amount must be non-zero"));
        }
        if from.is_zero() {
            return Err(LedgerError::InvalidAmount("burn from the zero address"));
        }

        let account = self.load(from);
        self.ensure_balance(&account, amount)?;
        let removed = self.debit_credits(&account, amount)?;
        let updated = account.with_credits(account.credits() - removed);
        let pools = self.pools_after(&[(account, updated)])?;

        self.accounts.insert(*from, updated);
        self.commit_pools(pools);
        tracing::debug!(%from, amount, credits = removed, "burn");
        self.events.push(LedgerEvent::Transfer {
            from: *from,
            to: Address::ZERO,
            amount,
        });
        Ok(())
    }

    // ── Transfers ───────────────────────────────────────────────────────

    fn check_transfer_parties(from: &Address, to: &Address) -> Result<(), LedgerError> {
        if from.is_zero() {
            return Err(LedgerError::InvalidAmount("transfer from the zero address"));
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidAmount("transfer to the zero address"));
        }
        Ok(())
    }

    /// Move `amount` from `sender` to `to`.
    pub fn transfer(&mut self, sender: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.execute_transfer(sender, to, amount)
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. The allowance is only spent if the transfer succeeds.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        Self::check_transfer_parties(from, to)?;
        self.allowances.ensure(from, spender, amount)?;
        self.execute_transfer(from, to, amount)?;
        self.allowances.decrease(*from, *spender, amount);
        Ok(())
    }

    /// Debits round up and credits round down, so the sender gives up at
    /// least `amount` and the receiver gains at most `amount`.
    fn execute_transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        Self::check_transfer_parties(from, to)?;

        let sender = self.load(from);
        self.ensure_balance(&sender, amount)?;

        if from == to || amount == 0 {
            self.events.push(LedgerEvent::Transfer {
                from: *from,
                to: *to,
                amount,
            });
            return Ok(());
        }

        let global = self.rebasing_credits_per_token;
        // First inbound value freezes an unset receiver rate at the current
        // global rate.
        let receiver = self.load(to).with_rate_if_unset(global);

        let debited = self.debit_credits(&sender, amount)?;
        let credited = math::to_credits(amount, receiver.credits_per_token(global))?;

        let sender_after = sender.with_credits(sender.credits() - debited);
        let receiver_after = receiver.with_credits(
            receiver
                .credits()
                .checked_add(credited)
                .ok_or(LedgerError::Overflow)?,
        );
        let pools = self.pools_after(&[(sender, sender_after), (receiver, receiver_after)])?;

        self.accounts.insert(*from, sender_after);
        self.accounts.insert(*to, receiver_after);
        self.commit_pools(pools);
        tracing::debug!(%from, %to, amount, debited, credited, "transfer");
        self.events.push(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    // ── Allowances ──────────────────────────────────────────────────────

    fn check_allowance_parties(owner: &Address, spender: &Address) -> Result<(), LedgerError> {
        if owner.is_zero() {
            return Err(LedgerError::InvalidAmount("approve from the zero address"));
        }
        if spender.is_zero() {
            return Err(LedgerError::InvalidAmount("approve to the zero address"));
        }
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s tokens to exactly `amount`.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) -> Result<(), LedgerError> {
        Self::check_allowance_parties(owner, spender)?;
        self.allowances.set(*owner, *spender, amount);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        Self::check_allowance_parties(owner, spender)?;
        let updated = self.allowances.increase(*owner, *spender, amount)?;
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount: updated,
        });
        Ok(())
    }

    /// Lower the allowance by `amount`, clamping at zero.
    pub fn decrease_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        Self::check_allowance_parties(owner, spender)?;
        let updated = self.allowances.decrease(*owner, *spender, amount);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount: updated,
        });
        Ok(())
    }

    // ── Rebase opt-in / opt-out ─────────────────────────────────────────

    /// Freeze `account` at the current global rate. Payout manager or admin.
    pub fn rebase_opt_out(&mut self, cap: &Capability, account: &Address) -> Result<(), LedgerError> {
        self.roles.check(cap, &[Role::PayoutManager, Role::Admin])?;
        if account.is_zero() {
            return Err(LedgerError::InvalidAmount("zero address cannot change rebase mode"));
        }

        let current = self.load(account);
        let credits = match current {
            Account::Rebasing { credits } => credits,
            Account::NonRebasing { .. } => {
                return Err(LedgerError::InvalidState("Account has not opted in"))
            }
        };
        let global = self.rebasing_credits_per_token;
        let frozen = Account::NonRebasing {
            credits,
            credits_per_token: Some(global),
        };
        let pools = self.pools_after(&[(current, frozen)])?;

        self.accounts.insert(*account, frozen);
        self.commit_pools(pools);
        tracing::info!(%account, credits, credits_per_token = global, "rebase opt-out");
        self.events
            .push(LedgerEvent::RebaseOptOut { account: *account });
        Ok(())
    }

    /// Return `account` to the rebasing pool. Payout manager or admin.
    ///
    /// Credits are rescaled by `global / private`, which is exact when the
    /// rate has not moved since the opt-out.
    pub fn rebase_opt_in(&mut self, cap: &Capability, account: &Address) -> Result<(), LedgerError> {
        self.roles.check(cap, &[Role::PayoutManager, Role::Admin])?;
        if account.is_zero() {
            return Err(LedgerError::InvalidAmount("zero address cannot change rebase mode"));
        }

        let current = self.load(account);
        if current.is_rebasing() {
            return Err(LedgerError::InvalidState("Account has not opted out"));
        }
        let global = self.rebasing_credits_per_token;
        let private = current.credits_per_token(global);
        let credits = math::mul_div(current.credits(), global, private)?;
        let joined = Account::Rebasing { credits };
        let pools = self.pools_after(&[(current, joined)])?;

        self.accounts.insert(*account, joined);
        self.commit_pools(pools);
        tracing::info!(%account, credits, "rebase opt-in");
        self.events.push(LedgerEvent::RebaseOptIn { account: *account });
        Ok(())
    }

    // ── Supply change ───────────────────────────────────────────────────

    /// Rescale every rebasing balance so total supply becomes `new_total`.
    /// Exchanger or payout manager.
    ///
    /// The new rate is floored, so total supply lands at or above
    /// `new_total`, by at most `ceil((new_total - non_rebasing_supply) / rate)`
    /// units. That is one unit while the rebasing supply stays below the
    /// rate, about 1e27 base units from a fresh ledger.
    pub fn change_supply(&mut self, cap: &Capability, new_total: u128) -> Result<(), LedgerError> {
        self.roles
            .check(cap, &[Role::Exchanger, Role::PayoutManager])?;

        if self.total_supply_checked()? != new_total {
            if new_total < self.non_rebasing_supply {
                return Err(LedgerError::InvalidAmount(
                    "new supply is below the non-rebasing supply",
                ));
            }
            let rebasing_target = new_total - self.non_rebasing_supply;
            if rebasing_target == 0 {
                return Err(LedgerError::InvalidAmount(
                    "new supply leaves nothing for rebasing accounts",
                ));
            }
            if self.rebasing_credits == 0 {
                return Err(LedgerError::InvalidAmount("no rebasing supply to change"));
            }
            let rate = math::mul_div(self.rebasing_credits, PRECISION, rebasing_target)?;
            if rate == 0 {
                return Err(LedgerError::InvalidAmount("invalid change in supply"));
            }

            let previous = self.rebasing_credits_per_token;
            self.rebasing_credits_per_token = rate;
            tracing::info!(
                new_total,
                previous_rate = previous,
                rate,
                rebasing_credits = self.rebasing_credits,
                "supply changed"
            );
        }

        self.events.push(LedgerEvent::SupplyChanged {
            total_supply: self.total_supply(),
            rebasing_credits: self.rebasing_credits,
            rebasing_credits_per_token: self.rebasing_credits_per_token,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: u128 = 1_000_000;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    const ADMIN: u64 = 0xa0;
    const EXCHANGER: u64 = 0xe0;
    const PAYOUT: u64 = 0xb0;

    fn make_ledger() -> RebasingLedger {
        let mut config = LedgerConfig::new(addr(ADMIN));
        config.exchanger = Some(addr(EXCHANGER));
        config.payout_manager = Some(addr(PAYOUT));
        RebasingLedger::new(config).unwrap()
    }

    fn exchanger(ledger: &RebasingLedger) -> Capability {
        ledger.authorize(&addr(EXCHANGER), Role::Exchanger).unwrap()
    }

    fn payout(ledger: &RebasingLedger) -> Capability {
        ledger.authorize(&addr(PAYOUT), Role::PayoutManager).unwrap()
    }

    /// Everything observable except the event log.
    fn state_of(ledger: &RebasingLedger) -> (Vec<(Address, Account)>, u128, u128, u128) {
        let mut accounts: Vec<_> = ledger.accounts().map(|(a, acc)| (*a, *acc)).collect();
        accounts.sort_by_key(|(a, _)| *a);
        (
            accounts,
            ledger.rebasing_credits_highres(),
            ledger.rebasing_credits_per_token_highres(),
            ledger.non_rebasing_supply(),
        )
    }

    #[test]
    fn fresh_ledger_starts_at_initial_rate_with_no_supply() {
        let ledger = make_ledger();
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(
            ledger.rebasing_credits_per_token_highres(),
            INITIAL_CREDITS_PER_TOKEN
        );
        assert_eq!(ledger.decimals(), 6);
        assert_eq!(
            ledger.credits_balance_of(&addr(1)),
            (0, INITIAL_CREDITS_PER_TOKEN)
        );
    }

    #[test]
    fn mint_requires_exchanger() {
        let mut ledger = make_ledger();
        let cap = payout(&ledger);
        let err = ledger.mint(&cap, &addr(1), 100 * ONE).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
        assert!(ledger.authorize(&addr(1), Role::Exchanger).is_err());
    }

    #[test]
    fn mint_rejects_zero_amount_and_zero_address() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        assert!(matches!(
            ledger.mint(&cap, &addr(1), 0),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.mint(&cap, &Address::ZERO, ONE),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn mint_to_rebasing_grows_rebasing_pool() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 100 * ONE).unwrap();
        assert_eq!(ledger.balance_of(&addr(1)), 100 * ONE);
        assert_eq!(
            ledger.rebasing_credits_highres(),
            100 * ONE * math::RESOLUTION_INCREASE
        );
        assert_eq!(ledger.non_rebasing_supply(), 0);
        assert_eq!(ledger.total_supply(), 100 * ONE);
    }

    #[test]
    fn mint_to_unset_non_rebasing_sets_unit_rate() {
        let mut config = LedgerConfig::new(addr(ADMIN));
        config.exchanger = Some(addr(EXCHANGER));
        config.non_rebasing.push(addr(7));
        let mut ledger = RebasingLedger::new(config).unwrap();
        let cap = exchanger(&ledger);

        assert_eq!(ledger.rebase_state(&addr(7)), RebaseState::NonRebasing);
        ledger.mint(&cap, &addr(7), 40 * ONE).unwrap();
        assert_eq!(
            ledger.account(&addr(7)),
            Some(&Account::NonRebasing {
                credits: 40 * ONE,
                credits_per_token: Some(PRECISION)
            })
        );
        assert_eq!(ledger.non_rebasing_supply(), 40 * ONE);
        assert_eq!(ledger.rebasing_credits_highres(), 0);
    }

    #[test]
    fn mint_past_max_supply_fails_without_side_effects() {
        let mut config = LedgerConfig::new(addr(ADMIN));
        config.exchanger = Some(addr(EXCHANGER));
        config.non_rebasing.push(addr(7));
        let mut ledger = RebasingLedger::new(config).unwrap();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(7), u128::MAX - 5).unwrap();
        let before = state_of(&ledger);
        assert_eq!(ledger.mint(&cap, &addr(7), 10), Err(LedgerError::Overflow));
        assert_eq!(ledger.mint(&cap, &addr(1), 10), Err(LedgerError::Overflow));
        assert_eq!(state_of(&ledger), before);
    }

    #[test]
    fn mint_after_expansion_grows_supply_by_amount() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        ledger.mint(&ex, &addr(1), 100).unwrap();
        ledger.change_supply(&ex, 200).unwrap();

        ledger.mint(&ex, &addr(2), 1).unwrap();
        assert_eq!(ledger.balance_of(&addr(2)), 1);
        assert_eq!(ledger.total_supply(), 201);
    }

    #[test]
    fn mint_worth_less_than_one_credit_is_rejected() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        ledger.mint(&ex, &addr(1), 1).unwrap();
        // Ten billion-fold expansion: one credit is now worth ten units.
        ledger.change_supply(&ex, 10_000_000_000).unwrap();
        assert_eq!(ledger.rebasing_credits_per_token_highres(), PRECISION / 10);

        let before = state_of(&ledger);
        assert!(matches!(
            ledger.mint(&ex, &addr(2), 1),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(state_of(&ledger), before);
        ledger.mint(&ex, &addr(2), 10).unwrap();
        assert_eq!(ledger.balance_of(&addr(2)), 10);
    }

    #[test]
    fn burn_removes_supply_and_sweeps_dust() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 100 * ONE).unwrap();
        ledger.burn(&cap, &addr(1), 40 * ONE).unwrap();
        assert_eq!(ledger.balance_of(&addr(1)), 60 * ONE);
        assert_eq!(ledger.total_supply(), 60 * ONE);

        // Leave half a unit of credits above what the burn amount converts to.
        let dust = math::RESOLUTION_INCREASE / 2;
        let credits = 60 * ONE * math::RESOLUTION_INCREASE + dust;
        ledger.accounts.insert(addr(1), Account::Rebasing { credits });
        ledger.rebasing_credits = credits;
        ledger.burn(&cap, &addr(1), 60 * ONE).unwrap();
        assert_eq!(ledger.credits_balance_of(&addr(1)).0, 0);
        assert_eq!(ledger.rebasing_credits_highres(), 0);
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn partial_burn_from_one_to_one_account_keeps_last_unit() {
        let mut config = LedgerConfig::new(addr(ADMIN));
        config.exchanger = Some(addr(EXCHANGER));
        config.non_rebasing.push(addr(7));
        let mut ledger = RebasingLedger::new(config).unwrap();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(7), 100).unwrap();
        ledger.burn(&cap, &addr(7), 99).unwrap();
        assert_eq!(ledger.balance_of(&addr(7)), 1);
        assert_eq!(ledger.non_rebasing_supply(), 1);
    }

    #[test]
    fn small_transfers_after_expansion_debit_the_sender() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        let pm = payout(&ledger);
        ledger.mint(&ex, &addr(1), 100 * ONE).unwrap();
        ledger.rebase_opt_out(&pm, &addr(2)).unwrap();
        ledger.change_supply(&pm, 200 * ONE).unwrap();

        for _ in 0..1000 {
            ledger.transfer(&addr(1), &addr(2), 1).unwrap();
        }
        assert_eq!(ledger.balance_of(&addr(1)), 200 * ONE - 1000);
        assert_eq!(ledger.balance_of(&addr(2)), 1000);
        assert_eq!(ledger.non_rebasing_supply(), 1000);
        assert_eq!(ledger.total_supply(), 200 * ONE);
    }

    #[test]
    fn transfer_debit_never_rounds_below_amount() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        let pm = payout(&ledger);
        ledger.mint(&ex, &addr(1), 77 * ONE).unwrap();
        ledger.mint(&ex, &addr(3), 33 * ONE).unwrap();
        ledger.rebase_opt_out(&pm, &addr(2)).unwrap();
        // Leaves a rate that is not a whole number of credits per unit.
        ledger.change_supply(&pm, 123 * ONE + 7).unwrap();

        for amount in 1..200u128 {
            let sender = ledger.balance_of(&addr(1));
            let receiver = ledger.balance_of(&addr(2));
            ledger.transfer(&addr(1), &addr(2), amount).unwrap();
            assert!(sender - ledger.balance_of(&addr(1)) >= amount);
            assert_eq!(ledger.balance_of(&addr(2)) - receiver, amount);
        }
        let held = ledger.balance_of(&addr(1))
            + ledger.balance_of(&addr(2))
            + ledger.balance_of(&addr(3));
        assert!(held <= ledger.total_supply());
        assert_eq!(ledger.non_rebasing_supply(), ledger.balance_of(&addr(2)));
    }

    #[test]
    fn burn_more_than_balance_fails() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 10 * ONE).unwrap();
        assert_eq!(
            ledger.burn(&cap, &addr(1), 11 * ONE),
            Err(LedgerError::InsufficientBalance {
                needed: 11 * ONE,
                available: 10 * ONE
            })
        );
    }

    #[test]
    fn failed_transfer_leaves_state_untouched() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 10 * ONE).unwrap();
        let before = state_of(&ledger);
        assert!(matches!(
            ledger.transfer(&addr(1), &addr(2), 11 * ONE),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            ledger.transfer(&addr(1), &Address::ZERO, ONE),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(state_of(&ledger), before);
    }

    #[test]
    fn failed_transfer_from_keeps_allowance() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 10 * ONE).unwrap();
        ledger.approve(&addr(1), &addr(2), 50 * ONE).unwrap();
        assert!(ledger
            .transfer_from(&addr(2), &addr(1), &addr(3), 20 * ONE)
            .is_err());
        assert_eq!(ledger.allowance(&addr(1), &addr(2)), 50 * ONE);
    }

    #[test]
    fn transfer_from_checks_parties_before_allowance() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 10 * ONE).unwrap();
        assert!(matches!(
            ledger.transfer_from(&addr(2), &Address::ZERO, &addr(3), ONE),
            Err(LedgerError::InvalidAmount("transfer from the zero address"))
        ));
        assert!(matches!(
            ledger.transfer_from(&addr(2), &addr(1), &Address::ZERO, ONE),
            Err(LedgerError::InvalidAmount("transfer to the zero address"))
        ));
    }

    #[test]
    fn self_transfer_changes_nothing() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 10 * ONE).unwrap();
        let before = state_of(&ledger);
        ledger.transfer(&addr(1), &addr(1), 5 * ONE).unwrap();
        assert_eq!(state_of(&ledger), before);
    }

    #[test]
    fn zero_address_balance_is_always_zero() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        ledger.mint(&cap, &addr(1), 10 * ONE).unwrap();
        assert_eq!(ledger.balance_of(&Address::ZERO), 0);
        assert!(ledger.transfer(&Address::ZERO, &addr(1), 0).is_err());
    }

    #[test]
    fn opt_out_twice_fails_with_not_opted_in() {
        let mut ledger = make_ledger();
        let cap = payout(&ledger);
        ledger.rebase_opt_out(&cap, &addr(5)).unwrap();
        assert_eq!(
            ledger.rebase_opt_out(&cap, &addr(5)),
            Err(LedgerError::InvalidState("Account has not opted in"))
        );
    }

    #[test]
    fn opt_in_without_opt_out_fails() {
        let mut ledger = make_ledger();
        let cap = payout(&ledger);
        assert_eq!(
            ledger.rebase_opt_in(&cap, &addr(5)),
            Err(LedgerError::InvalidState("Account has not opted out"))
        );
    }

    #[test]
    fn opt_out_requires_payout_manager_or_admin() {
        let mut ledger = make_ledger();
        let cap = exchanger(&ledger);
        assert!(matches!(
            ledger.rebase_opt_out(&cap, &addr(5)),
            Err(LedgerError::Unauthorized { .. })
        ));
        let admin = ledger.authorize(&addr(ADMIN), Role::Admin).unwrap();
        ledger.rebase_opt_out(&admin, &addr(5)).unwrap();
    }

    #[test]
    fn change_supply_rejects_bad_targets() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        let pm = payout(&ledger);

        assert!(matches!(
            ledger.change_supply(&pm, 100 * ONE),
            Err(LedgerError::InvalidAmount(_))
        ));

        ledger.rebase_opt_out(&pm, &addr(2)).unwrap();
        ledger.mint(&ex, &addr(2), 100 * ONE).unwrap();
        ledger.mint(&ex, &addr(1), 100 * ONE).unwrap();
        let before = state_of(&ledger);
        assert!(matches!(
            ledger.change_supply(&pm, 50 * ONE),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            ledger.change_supply(&pm, 100 * ONE),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(state_of(&ledger), before);
    }

    #[test]
    fn change_supply_to_current_is_a_no_op() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        ledger.mint(&ex, &addr(1), 100 * ONE).unwrap();
        ledger.change_supply(&ex, 100 * ONE).unwrap();
        assert_eq!(
            ledger.rebasing_credits_per_token_highres(),
            INITIAL_CREDITS_PER_TOKEN
        );
    }

    #[test]
    fn revoked_exchanger_capability_stops_working() {
        let mut ledger = make_ledger();
        let old = exchanger(&ledger);
        let admin = ledger.authorize(&addr(ADMIN), Role::Admin).unwrap();
        ledger.set_exchanger(&admin, addr(0xe2)).unwrap();
        assert!(matches!(
            ledger.mint(&old, &addr(1), ONE),
            Err(LedgerError::Unauthorized { .. })
        ));
        let new = ledger.authorize(&addr(0xe2), Role::Exchanger).unwrap();
        ledger.mint(&new, &addr(1), ONE).unwrap();
    }

    #[test]
    fn admin_handover_revokes_old_admin() {
        let mut ledger = make_ledger();
        let old = ledger.authorize(&addr(ADMIN), Role::Admin).unwrap();
        ledger.set_admin(&old, addr(0xa1)).unwrap();
        assert!(ledger.set_exchanger(&old, addr(9)).is_err());
        let new = ledger.authorize(&addr(0xa1), Role::Admin).unwrap();
        ledger.set_exchanger(&new, addr(9)).unwrap();
        assert_eq!(ledger.roles().holder(Role::Exchanger), Some(&addr(9)));
    }

    #[test]
    fn only_admin_assigns_roles() {
        let mut ledger = make_ledger();
        let pm = payout(&ledger);
        assert!(ledger.set_exchanger(&pm, addr(9)).is_err());
        let admin = ledger.authorize(&addr(ADMIN), Role::Admin).unwrap();
        assert!(matches!(
            ledger.set_payout_manager(&admin, Address::ZERO),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn events_record_committed_calls_only() {
        let mut ledger = make_ledger();
        let ex = exchanger(&ledger);
        ledger.mint(&ex, &addr(1), 10 * ONE).unwrap();
        let _ = ledger.transfer(&addr(1), &addr(2), 20 * ONE);
        ledger.transfer(&addr(1), &addr(2), 3 * ONE).unwrap();
        let events = ledger.drain_events();
        assert_eq!(
            events,
            vec![
                LedgerEvent::Transfer {
                    from: Address::ZERO,
                    to: addr(1),
                    amount: 10 * ONE
                },
                LedgerEvent::Transfer {
                    from: addr(1),
                    to: addr(2),
                    amount: 3 * ONE
                },
            ]
        );
        assert!(ledger.pending_events().is_empty());
    }
}
