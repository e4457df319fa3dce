//! # Asset Transfer Port
//!
//! The only collaborator the vault and the ledger use to move the underlying
//! asset. Each call names the `custodian` it acts for, so one port instance
//! can serve both components.
//!
//! [`AssetBook`] is the contract's implementation: an internal custody ledger
//! of the NEP-141 asset held by this contract. Tokens are credited when they
//! arrive through `ft_on_transfer` and debited when a payout `ft_transfer` is
//! scheduled.

use near_sdk::store::LookupMap;
use near_sdk::{near, AccountId, IntoStorageKey};

use crate::error::{SavingsError, SavingsResult};

/// Moves asset balances in and out of a custodian's holding.
pub trait AssetTransferPort {
    /// Moves `amount` from `from` into `custodian`. Pulling from another
    /// account consumes `from`'s allowance to `custodian`.
    fn pull(&mut self, custodian: &AccountId, from: &AccountId, amount: u128)
        -> SavingsResult<()>;

    /// Moves `amount` out of `custodian` to `to`.
    fn push(&mut self, custodian: &AccountId, to: &AccountId, amount: u128) -> SavingsResult<()>;

    /// Fails exactly when `push` with the same arguments would, without
    /// moving anything.
    fn check_push(&self, custodian: &AccountId, to: &AccountId, amount: u128)
        -> SavingsResult<()>;

    /// Sets the amount `spender` may pull from `owner`.
    fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u128)
        -> SavingsResult<()>;
}

/// In-contract balances of the underlying asset.
#[near(serializers = [borsh])]
pub struct AssetBook {
    balances: LookupMap<AccountId, u128>,
    allowances: LookupMap<(AccountId, AccountId), u128>,
}

impl AssetBook {
    pub fn new<S: IntoStorageKey>(balances_prefix: S, allowances_prefix: S) -> Self {
        Self {
            balances: LookupMap::new(balances_prefix),
            allowances: LookupMap::new(allowances_prefix),
        }
    }

    pub fn balance_of(&self, account_id: &AccountId) -> u128 {
        self.balances.get(account_id).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Adds tokens that arrived from outside the contract.
    pub fn credit(&mut self, account_id: &AccountId, amount: u128) -> SavingsResult<()> {
        let balance = self
            .balance_of(account_id)
            .checked_add(amount)
            .ok_or(SavingsError::ArithmeticOverflow)?;
        self.balances.insert(account_id.clone(), balance);
        Ok(())
    }

    /// Removes tokens that are about to leave the contract.
    pub fn debit(&mut self, account_id: &AccountId, amount: u128) -> SavingsResult<()> {
        let balance = self
            .balance_of(account_id)
            .checked_sub(amount)
            .ok_or(SavingsError::InsufficientBalance)?;
        if balance == 0 {
            self.balances.remove(account_id);
        } else {
            self.balances.insert(account_id.clone(), balance);
        }
        Ok(())
    }

    fn check_transfer(&self, from: &AccountId, to: &AccountId, amount: u128) -> SavingsResult<()> {
        if amount == 0 {
            return Err(SavingsError::InvalidAmount);
        }
        if self.balance_of(from) < amount {
            return Err(SavingsError::InsufficientBalance);
        }
        self.balance_of(to)
            .checked_add(amount)
            .ok_or(SavingsError::ArithmeticOverflow)?;
        Ok(())
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> SavingsResult<()> {
        // Check both sides before touching either balance.
        self.check_transfer(from, to, amount)?;
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

impl AssetTransferPort for AssetBook {
    fn pull(
        &mut self,
        custodian: &AccountId,
        from: &AccountId,
        amount: u128,
    ) -> SavingsResult<()> {
        if from != custodian {
            let allowance = self.allowance(from, custodian);
            let remaining = allowance
                .checked_sub(amount)
                .ok_or(SavingsError::InsufficientAllowance)?;
            self.transfer(from, custodian, amount)?;
            return self.approve(from, custodian, remaining);
        }
        self.transfer(from, custodian, amount)
    }

    fn push(&mut self, custodian: &AccountId, to: &AccountId, amount: u128) -> SavingsResult<()> {
        self.transfer(custodian, to, amount)
    }

    fn check_push(&self, custodian: &AccountId, to: &AccountId, amount: u128) -> SavingsResult<()> {
        self.check_transfer(custodian, to, amount)
    }

    fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> SavingsResult<()> {
        let key = (owner.clone(), spender.clone());
        if amount == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, amount);
        }
        Ok(())
    }
}
