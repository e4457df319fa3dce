//! # Goal Savings Ledger
//!
//! Wraps a share-vault position with a goal date and an early withdrawal
//! penalty. Each account holds at most one [`UserDeposit`]:
//!
//! ```text
//! NoDeposit --deposit()--> Active --withdraw()--> NoDeposit
//! ```
//!
//! ## Penalty Policy
//!
//! Withdrawing before the goal date with a positive yield sends half of the
//! yield (floor) to the treasury. On an odd yield the extra unit stays with
//! the depositor. On or after the goal date the depositor receives the full
//! current value.

use near_sdk::json_types::{U128, U64};
use near_sdk::store::LookupMap;
use near_sdk::{env, near, AccountId, IntoStorageKey};

use crate::error::{SavingsError, SavingsResult};
use crate::is_null_account;
use crate::port::AssetTransferPort;
use crate::vault_standards::events::{
    DepositRecorded, OwnershipTransferred, PenaltyCollected, TreasuryUpdated, WithdrawalCompleted,
};
use crate::vault_standards::VaultCore;

/// Largest shortfall of redeemed assets against the previewed value that a
/// withdrawal accepts.
pub const REDEEM_TOLERANCE: u128 = 10;

/// An account's single active savings position.
#[near(serializers = [borsh])]
#[derive(Clone, Debug, PartialEq)]
pub struct UserDeposit {
    /// Vault shares held by the ledger on behalf of the account.
    pub shares: u128,
    /// Assets originally deposited.
    pub principal: u128,
    /// Seconds. Withdrawals before this instant pay the penalty.
    pub goal_date: u64,
    /// Seconds.
    pub deposit_date: u64,
}

/// How a position's current value splits between depositor and treasury.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawalSplit {
    pub current_value: u128,
    pub yield_amount: u128,
    pub penalty: u128,
    pub user_receives: u128,
}

impl WithdrawalSplit {
    pub fn compute(principal: u128, current_value: u128, is_early: bool) -> SavingsResult<Self> {
        let yield_amount = current_value.saturating_sub(principal);

        if is_early && yield_amount > 0 {
            let penalty = yield_amount / 2;
            let user_receives = principal
                .checked_add(yield_amount - penalty)
                .ok_or(SavingsError::ArithmeticOverflow)?;
            return Ok(Self {
                current_value,
                yield_amount,
                penalty,
                user_receives,
            });
        }

        Ok(Self {
            current_value,
            yield_amount,
            penalty: 0,
            user_receives: current_value,
        })
    }
}

/// Read-only snapshot of an account's position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub principal: u128,
    pub current_value: u128,
    pub yield_amount: u128,
    pub goal_date: u64,
    pub is_early: bool,
    pub potential_penalty: u128,
}

/// What a withdrawal would pay right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawalPreview {
    pub user_will_receive: u128,
    pub penalty_amount: u128,
}

/// Outcome of a completed withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub principal: u128,
    pub yield_amount: u128,
    pub penalty: u128,
    pub total_received: u128,
    pub is_early: bool,
}

#[near(serializers = [borsh])]
pub struct GoalSavingsLedger {
    /// Custody account of the ledger's assets in the asset port.
    pub ledger_id: AccountId,
    /// Custody account of the vault the ledger deposits into.
    pub vault_id: AccountId,
    /// Administrator allowed to change the treasury and transfer ownership.
    pub owner_id: AccountId,
    /// Destination of collected penalties.
    pub treasury_id: AccountId,
    deposits: LookupMap<AccountId, UserDeposit>,
}

impl GoalSavingsLedger {
    pub fn new<S: IntoStorageKey>(
        ledger_id: AccountId,
        vault_id: AccountId,
        owner_id: AccountId,
        treasury_id: AccountId,
        deposits_prefix: S,
    ) -> Self {
        Self {
            ledger_id,
            vault_id,
            owner_id,
            treasury_id,
            deposits: LookupMap::new(deposits_prefix),
        }
    }

    pub fn deposit_of(&self, account_id: &AccountId) -> Option<&UserDeposit> {
        self.deposits.get(account_id)
    }

    pub fn has_active_deposit(&self, account_id: &AccountId) -> bool {
        self.deposits.contains_key(account_id)
    }

    /// Whether `account_id` holds pooled assets in the asset port.
    pub fn is_custody_account(&self, account_id: &AccountId) -> bool {
        account_id == &self.ledger_id || account_id == &self.vault_id
    }

    /// Owner and treasury may be neither the null account nor a custody account.
    pub fn check_role_account(&self, account_id: &AccountId) -> SavingsResult<()> {
        if is_null_account(account_id) || self.is_custody_account(account_id) {
            return Err(SavingsError::InvalidAddress);
        }
        Ok(())
    }

    /// Opens a goal deposit of `amount` for `caller`, maturing at `goal_date`.
    ///
    /// Returns the vault shares minted for the position.
    pub fn deposit<V: VaultCore, P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        amount: u128,
        goal_date: u64,
        now: u64,
        vault: &mut V,
        port: &mut P,
    ) -> SavingsResult<u128> {
        if amount == 0 {
            return Err(SavingsError::InvalidAmount);
        }
        if goal_date <= now {
            return Err(SavingsError::GoalDateNotInFuture);
        }
        if self.has_active_deposit(caller) {
            return Err(SavingsError::DuplicateActiveDeposit);
        }
        if vault.preview_deposit(amount, now)? == 0 {
            return Err(SavingsError::ZeroSharesOrAssetsResult);
        }

        port.pull(&self.ledger_id, caller, amount)?;
        port.approve(&self.ledger_id, vault.vault_id(), amount)?;

        let shares = match vault.deposit(&self.ledger_id, amount, &self.ledger_id, now, port) {
            Ok(shares) => shares,
            Err(err) => {
                port.approve(&self.ledger_id, vault.vault_id(), 0)?;
                port.push(&self.ledger_id, caller, amount)?;
                return Err(err);
            }
        };

        self.deposits.insert(
            caller.clone(),
            UserDeposit {
                shares,
                principal: amount,
                goal_date,
                deposit_date: now,
            },
        );

        DepositRecorded {
            account_id: caller,
            amount: U128(amount),
            shares: U128(shares),
            goal_date: U64(goal_date),
            deposit_date: U64(now),
        }
        .emit();

        Ok(shares)
    }

    /// Closes `caller`'s deposit and pays it out, minus the early penalty.
    ///
    /// The record is removed before the vault or the port is called. If the
    /// redemption cannot be settled, the redeemed assets go back into the
    /// vault and the record is restored with the shares they buy.
    pub fn withdraw<V: VaultCore, P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        now: u64,
        vault: &mut V,
        port: &mut P,
    ) -> SavingsResult<WithdrawalReceipt> {
        let deposit = self
            .deposits
            .get(caller)
            .cloned()
            .ok_or(SavingsError::NoActiveDeposit)?;

        let is_early = now < deposit.goal_date;
        let current_value = vault.convert_to_assets(deposit.shares, now)?;
        let split = WithdrawalSplit::compute(deposit.principal, current_value, is_early)?;

        self.deposits.remove(caller);

        let redeemed = match vault.redeem(
            &self.ledger_id,
            deposit.shares,
            &self.ledger_id,
            &self.ledger_id,
            now,
            port,
        ) {
            Ok(assets) => assets,
            Err(err) => {
                self.deposits.insert(caller.clone(), deposit);
                return Err(err);
            }
        };

        let total_received = match self.check_settlement(caller, &split, redeemed, port) {
            Ok(total_received) => total_received,
            Err(err) => {
                self.restore_position(caller, deposit, redeemed, now, vault, port)?;
                return Err(err);
            }
        };

        // Both pushes passed `check_settlement`.
        if split.penalty > 0 {
            port.push(&self.ledger_id, &self.treasury_id, split.penalty)?;
            PenaltyCollected {
                account_id: caller,
                treasury_id: &self.treasury_id,
                amount: U128(split.penalty),
            }
            .emit();
        }

        port.push(&self.ledger_id, caller, total_received)?;

        WithdrawalCompleted {
            account_id: caller,
            principal: U128(deposit.principal),
            yield_amount: U128(split.yield_amount),
            penalty: U128(split.penalty),
            total_received: U128(total_received),
            is_early,
        }
        .emit();

        Ok(WithdrawalReceipt {
            principal: deposit.principal,
            yield_amount: split.yield_amount,
            penalty: split.penalty,
            total_received,
            is_early,
        })
    }

    /// Amount owed to `caller` out of `redeemed`, once the redemption is
    /// within tolerance and both payouts can leave ledger custody.
    fn check_settlement<P: AssetTransferPort>(
        &self,
        caller: &AccountId,
        split: &WithdrawalSplit,
        redeemed: u128,
        port: &P,
    ) -> SavingsResult<u128> {
        if redeemed.saturating_add(REDEEM_TOLERANCE) < split.current_value {
            env::log_str(&format!(
                "redeem_value_mismatch account={} expected={} redeemed={}",
                caller, split.current_value, redeemed
            ));
            return Err(SavingsError::ValueMismatchOnRedeem);
        }

        let total_received = redeemed
            .checked_sub(split.penalty)
            .ok_or(SavingsError::ArithmeticOverflow)?;

        if split.penalty > 0 {
            port.check_push(&self.ledger_id, &self.treasury_id, split.penalty)?;
        }
        port.check_push(&self.ledger_id, caller, total_received)?;

        Ok(total_received)
    }

    /// Undoes a redemption: deposits `redeemed` back into the vault and
    /// reopens `caller`'s record with the new shares.
    fn restore_position<V: VaultCore, P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        mut deposit: UserDeposit,
        redeemed: u128,
        now: u64,
        vault: &mut V,
        port: &mut P,
    ) -> SavingsResult<()> {
        port.approve(&self.ledger_id, vault.vault_id(), redeemed)?;
        deposit.shares = vault.deposit(&self.ledger_id, redeemed, &self.ledger_id, now, port)?;

        env::log_str(&format!(
            "withdrawal_rolled_back account={} assets={} shares={}",
            caller, redeemed, deposit.shares
        ));
        self.deposits.insert(caller.clone(), deposit);
        Ok(())
    }

    /// Position summary; all zero/false when the account has no deposit.
    pub fn user_info<V: VaultCore>(
        &self,
        account_id: &AccountId,
        now: u64,
        vault: &V,
    ) -> SavingsResult<UserInfo> {
        let Some(deposit) = self.deposits.get(account_id) else {
            return Ok(UserInfo::default());
        };

        let is_early = now < deposit.goal_date;
        let current_value = vault.convert_to_assets(deposit.shares, now)?;
        let split = WithdrawalSplit::compute(deposit.principal, current_value, is_early)?;

        Ok(UserInfo {
            principal: deposit.principal,
            current_value,
            yield_amount: split.yield_amount,
            goal_date: deposit.goal_date,
            is_early,
            potential_penalty: split.penalty,
        })
    }

    /// Exactly what `withdraw` would pay `account_id` at `now`.
    pub fn preview_withdrawal<V: VaultCore>(
        &self,
        account_id: &AccountId,
        now: u64,
        vault: &V,
    ) -> SavingsResult<WithdrawalPreview> {
        let Some(deposit) = self.deposits.get(account_id) else {
            return Ok(WithdrawalPreview::default());
        };

        let is_early = now < deposit.goal_date;
        let current_value = vault.convert_to_assets(deposit.shares, now)?;
        let split = WithdrawalSplit::compute(deposit.principal, current_value, is_early)?;

        Ok(WithdrawalPreview {
            user_will_receive: split.user_receives,
            penalty_amount: split.penalty,
        })
    }

    pub fn update_treasury(
        &mut self,
        caller: &AccountId,
        new_treasury_id: AccountId,
    ) -> SavingsResult<()> {
        self.require_owner(caller)?;
        self.check_role_account(&new_treasury_id)?;

        let old_treasury_id = std::mem::replace(&mut self.treasury_id, new_treasury_id);
        TreasuryUpdated {
            old_treasury_id: &old_treasury_id,
            new_treasury_id: &self.treasury_id,
        }
        .emit();

        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner_id: AccountId,
    ) -> SavingsResult<()> {
        self.require_owner(caller)?;
        self.check_role_account(&new_owner_id)?;

        let old_owner_id = std::mem::replace(&mut self.owner_id, new_owner_id);
        OwnershipTransferred {
            old_owner_id: &old_owner_id,
            new_owner_id: &self.owner_id,
        }
        .emit();

        Ok(())
    }

    fn require_owner(&self, caller: &AccountId) -> SavingsResult<()> {
        if caller != &self.owner_id {
            return Err(SavingsError::Unauthorized);
        }
        Ok(())
    }
}
