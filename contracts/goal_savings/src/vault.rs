//! # Share Vault
//!
//! Pools a single asset, mints and burns shares against it and prices those
//! shares against a total value that grows linearly at a fixed annual rate.
//!
//! ## Invariants
//!
//! - `total_share_supply` equals the sum of every holder balance
//! - `last_accrual_time` never moves backwards
//! - Accrual is folded in before supply or cached assets change
//! - The first deposit permanently locks `DEAD_SHARES` with an unreachable holder

use near_sdk::store::LookupMap;
use near_sdk::{near, AccountId, AccountIdRef, IntoStorageKey};

use crate::error::{SavingsError, SavingsResult};
use crate::is_null_account;
use crate::port::AssetTransferPort;
use crate::vault_standards::mul_div::Rounding;
use crate::vault_standards::VaultCore;

/// Shares minted to the dead holder by the first deposit.
pub const DEAD_SHARES: u128 = 1_000;

/// Implicit account nobody holds a key for.
pub const DEAD_SHARES_HOLDER: &AccountIdRef =
    AccountIdRef::new_or_panic("000000000000000000000000000000000000000000000000000000000000dead");

pub const SECONDS_PER_YEAR: u128 = 31_536_000;

pub const BPS_DENOMINATOR: u128 = 10_000;

#[near(serializers = [borsh])]
pub struct ShareVault {
    /// Custody account of the vault's assets in the asset port.
    pub vault_id: AccountId,
    /// Linear yield rate in basis points per year.
    pub annual_yield_rate_bps: u32,
    pub total_share_supply: u128,
    /// Pool value at `last_accrual_time`.
    pub cached_total_assets: u128,
    /// Seconds.
    pub last_accrual_time: u64,
    pub dead_shares_minted: bool,
    pub(crate) holder_share_balance: LookupMap<AccountId, u128>,
    share_allowances: LookupMap<(AccountId, AccountId), u128>,
}

impl ShareVault {
    pub fn new<S: IntoStorageKey>(
        vault_id: AccountId,
        annual_yield_rate_bps: u32,
        now: u64,
        balances_prefix: S,
        allowances_prefix: S,
    ) -> Self {
        Self {
            vault_id,
            annual_yield_rate_bps,
            total_share_supply: 0,
            cached_total_assets: 0,
            last_accrual_time: now,
            dead_shares_minted: false,
            holder_share_balance: LookupMap::new(balances_prefix),
            share_allowances: LookupMap::new(allowances_prefix),
        }
    }

    pub(crate) fn share_balance(&self, account_id: &AccountId) -> u128 {
        self.holder_share_balance
            .get(account_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn share_allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.share_allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn set_share_allowance(&mut self, owner: &AccountId, spender: &AccountId, shares: u128) {
        let key = (owner.clone(), spender.clone());
        if shares == 0 {
            self.share_allowances.remove(&key);
        } else {
            self.share_allowances.insert(key, shares);
        }
    }

    /// Lets `spender` redeem or withdraw up to `shares` of `owner`'s position.
    pub fn approve_shares(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        shares: u128,
    ) -> SavingsResult<()> {
        if is_null_account(spender) {
            return Err(SavingsError::InvalidAddress);
        }
        self.set_share_allowance(owner, spender, shares);
        Ok(())
    }

    /// Assets required to mint exactly `shares`, rounded up.
    ///
    /// On an unseeded vault the dead-share seed is added on top.
    pub fn preview_mint(&self, shares: u128, now: u64) -> SavingsResult<u128> {
        if !self.dead_shares_minted {
            return shares
                .checked_add(DEAD_SHARES)
                .ok_or(SavingsError::ArithmeticOverflow);
        }
        let total_assets = self.internal_total_assets(now)?;
        self.internal_convert_to_assets(shares, total_assets, Rounding::Up)
    }

    /// Shares that must be burned to withdraw exactly `assets`, rounded up.
    pub fn preview_withdraw(&self, assets: u128, now: u64) -> SavingsResult<u128> {
        let total_assets = self.internal_total_assets(now)?;
        self.internal_convert_to_shares(assets, total_assets, Rounding::Up)
    }

    /// Mints exactly `shares` to `receiver`, pulling the rounded-up asset cost
    /// from `caller`. Returns the assets pulled.
    pub fn mint<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        shares: u128,
        receiver: &AccountId,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<u128> {
        if shares == 0 {
            return Err(SavingsError::InvalidAmount);
        }
        if is_null_account(receiver) {
            return Err(SavingsError::InvalidAddress);
        }

        // Rounded up. Dead shares keep total assets above zero once seeded.
        let assets = self.preview_mint(shares, now)?;
        let seed_shares = if self.dead_shares_minted { 0 } else { DEAD_SHARES };

        self.internal_execute_deposit(caller, receiver, assets, seed_shares, shares, now, port)?;
        Ok(assets)
    }

    /// Burns the rounded-up share cost of `assets` from `owner` and pushes
    /// exactly `assets` to `receiver`. Returns the shares burned.
    pub fn withdraw<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        assets: u128,
        receiver: &AccountId,
        owner: &AccountId,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<u128> {
        if assets == 0 {
            return Err(SavingsError::InvalidAmount);
        }
        if is_null_account(receiver) {
            return Err(SavingsError::InvalidAddress);
        }
        if self.total_share_supply == 0 {
            return Err(SavingsError::InsufficientBalance);
        }

        let shares = self.preview_withdraw(assets, now)?;
        if shares == 0 {
            return Err(SavingsError::ZeroSharesOrAssetsResult);
        }

        self.internal_execute_withdrawal(caller, owner, receiver, shares, assets, now, port)?;
        Ok(shares)
    }
}

impl VaultCore for ShareVault {
    fn vault_id(&self) -> &AccountId {
        &self.vault_id
    }

    fn total_assets(&self, now: u64) -> SavingsResult<u128> {
        self.internal_total_assets(now)
    }

    fn total_share_supply(&self) -> u128 {
        self.total_share_supply
    }

    fn share_balance_of(&self, account_id: &AccountId) -> u128 {
        self.share_balance(account_id)
    }

    fn convert_to_shares(&self, assets: u128, now: u64) -> SavingsResult<u128> {
        let total_assets = self.internal_total_assets(now)?;
        self.internal_convert_to_shares(assets, total_assets, Rounding::Down)
    }

    fn convert_to_assets(&self, shares: u128, now: u64) -> SavingsResult<u128> {
        let total_assets = self.internal_total_assets(now)?;
        self.internal_convert_to_assets(shares, total_assets, Rounding::Down)
    }

    fn preview_deposit(&self, assets: u128, now: u64) -> SavingsResult<u128> {
        let total_assets = self.internal_total_assets(now)?;
        let (_, shares) = self.internal_deposit_split(assets, total_assets)?;
        Ok(shares)
    }

    fn deposit<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        assets: u128,
        receiver: &AccountId,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<u128> {
        if assets == 0 {
            return Err(SavingsError::InvalidAmount);
        }
        if is_null_account(receiver) {
            return Err(SavingsError::InvalidAddress);
        }

        let total_assets = self.internal_total_assets(now)?;
        let (seed_shares, shares) = self.internal_deposit_split(assets, total_assets)?;

        self.internal_execute_deposit(caller, receiver, assets, seed_shares, shares, now, port)?;
        Ok(shares)
    }

    fn redeem<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        shares: u128,
        receiver: &AccountId,
        owner: &AccountId,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<u128> {
        if shares == 0 {
            return Err(SavingsError::InvalidAmount);
        }
        if is_null_account(receiver) {
            return Err(SavingsError::InvalidAddress);
        }
        if self.share_balance(owner) < shares {
            return Err(SavingsError::InsufficientBalance);
        }

        let assets = self.convert_to_assets(shares, now)?;
        if assets == 0 {
            return Err(SavingsError::ZeroSharesOrAssetsResult);
        }

        self.internal_execute_withdrawal(caller, owner, receiver, shares, assets, now, port)?;
        Ok(assets)
    }
}
