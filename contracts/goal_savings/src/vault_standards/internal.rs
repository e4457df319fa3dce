//! # Internal Vault Operations
//!
//! Accrual math, rounding-aware conversions and the two execution paths
//! (`internal_execute_deposit`, `internal_execute_withdrawal`) shared by
//! `deposit`/`mint` and `redeem`/`withdraw`.
//!
//! Every conversion takes the pool's total assets as an argument so a caller
//! can evaluate several conversions against one accrued snapshot.

use near_sdk::{env, json_types::U128, AccountId};

use super::core::U256;
use super::events::{VaultDeposit, VaultWithdraw};
use super::mul_div::{mul_div, to_u128, Rounding};
use crate::error::{SavingsError, SavingsResult};
use crate::port::AssetTransferPort;
use crate::vault::{
    ShareVault, BPS_DENOMINATOR, DEAD_SHARES, DEAD_SHARES_HOLDER, SECONDS_PER_YEAR,
};

/// Values restored if the outbound transfer of a withdrawal fails.
struct WithdrawalRollback {
    cached_total_assets: u128,
    last_accrual_time: u64,
    owner_shares: u128,
    allowance: Option<u128>,
}

impl ShareVault {
    /// Pool value at `now`: cached assets plus linear yield since the last accrual.
    ///
    /// Formula: cached + cached * rate_bps * elapsed / (SECONDS_PER_YEAR * 10_000)
    pub(crate) fn internal_total_assets(&self, now: u64) -> SavingsResult<u128> {
        let cached = self.cached_total_assets;
        let elapsed = now.saturating_sub(self.last_accrual_time);

        if cached == 0 || self.annual_yield_rate_bps == 0 || elapsed == 0 {
            return Ok(cached);
        }

        let accrued = to_u128(
            U256::from(cached) * U256::from(self.annual_yield_rate_bps) * U256::from(elapsed)
                / U256::from(SECONDS_PER_YEAR * BPS_DENOMINATOR),
        )?;

        cached
            .checked_add(accrued)
            .ok_or(SavingsError::ArithmeticOverflow)
    }

    /// Folds the yield earned up to `now` into `cached_total_assets`.
    pub(crate) fn internal_accrue(&mut self, now: u64) -> SavingsResult<u128> {
        let total_assets = self.internal_total_assets(now)?;
        self.cached_total_assets = total_assets;
        self.last_accrual_time = self.last_accrual_time.max(now);
        Ok(total_assets)
    }

    /// Converts assets to shares against `total_assets`.
    ///
    /// 1:1 while the vault has no supply or no assets.
    pub(crate) fn internal_convert_to_shares(
        &self,
        assets: u128,
        total_assets: u128,
        rounding: Rounding,
    ) -> SavingsResult<u128> {
        if self.total_share_supply == 0 || total_assets == 0 {
            return Ok(assets);
        }

        mul_div(assets, self.total_share_supply, total_assets, rounding)
    }

    /// Converts shares to assets against `total_assets`.
    ///
    /// 1:1 while the vault has no supply.
    pub(crate) fn internal_convert_to_assets(
        &self,
        shares: u128,
        total_assets: u128,
        rounding: Rounding,
    ) -> SavingsResult<u128> {
        if self.total_share_supply == 0 {
            return Ok(shares);
        }

        mul_div(shares, total_assets, self.total_share_supply, rounding)
    }

    /// Splits a deposit into (seed shares, receiver shares).
    ///
    /// On a vault that has not been seeded yet, `DEAD_SHARES` of the deposit
    /// back the dead shares 1:1 and the rest is minted 1:1 to the receiver.
    pub(crate) fn internal_deposit_split(
        &self,
        assets: u128,
        total_assets: u128,
    ) -> SavingsResult<(u128, u128)> {
        if !self.dead_shares_minted {
            if assets < DEAD_SHARES {
                return Err(SavingsError::FirstDepositBelowFloor);
            }
            return Ok((DEAD_SHARES, assets - DEAD_SHARES));
        }

        let shares = self.internal_convert_to_shares(assets, total_assets, Rounding::Down)?;
        if shares == 0 {
            return Err(SavingsError::ZeroSharesOrAssetsResult);
        }
        Ok((0, shares))
    }

    pub(crate) fn internal_mint_shares(
        &mut self,
        account_id: &AccountId,
        shares: u128,
    ) -> SavingsResult<()> {
        let balance = self
            .share_balance(account_id)
            .checked_add(shares)
            .ok_or(SavingsError::ArithmeticOverflow)?;
        self.total_share_supply = self
            .total_share_supply
            .checked_add(shares)
            .ok_or(SavingsError::ArithmeticOverflow)?;
        self.holder_share_balance.insert(account_id.clone(), balance);
        Ok(())
    }

    pub(crate) fn internal_burn_shares(
        &mut self,
        account_id: &AccountId,
        shares: u128,
    ) -> SavingsResult<()> {
        let balance = self
            .share_balance(account_id)
            .checked_sub(shares)
            .ok_or(SavingsError::InsufficientBalance)?;
        self.total_share_supply = self
            .total_share_supply
            .checked_sub(shares)
            .ok_or(SavingsError::ArithmeticOverflow)?;
        if balance == 0 {
            self.holder_share_balance.remove(account_id);
        } else {
            self.holder_share_balance.insert(account_id.clone(), balance);
        }
        Ok(())
    }

    /// Pulls `assets` from `caller`, then mints the seed and receiver shares.
    ///
    /// Nothing is written unless the pull succeeds.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_execute_deposit<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        receiver: &AccountId,
        assets: u128,
        seed_shares: u128,
        shares: u128,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<()> {
        let total_assets = self.internal_total_assets(now)?;
        let new_total_assets = total_assets
            .checked_add(assets)
            .ok_or(SavingsError::ArithmeticOverflow)?;
        self.total_share_supply
            .checked_add(seed_shares)
            .and_then(|supply| supply.checked_add(shares))
            .ok_or(SavingsError::ArithmeticOverflow)?;

        port.pull(&self.vault_id, caller, assets)?;

        self.internal_accrue(now)?;
        if seed_shares > 0 {
            let dead = DEAD_SHARES_HOLDER.to_owned();
            self.internal_mint_shares(&dead, seed_shares)?;
            self.dead_shares_minted = true;
            env::log_str(&format!(
                "seeded_vault holder={} shares={}",
                dead, seed_shares
            ));
        }
        if shares > 0 {
            self.internal_mint_shares(receiver, shares)?;
        }
        self.cached_total_assets = new_total_assets;

        VaultDeposit {
            sender_id: caller,
            owner_id: receiver,
            assets: U128(assets),
            shares: U128(shares),
        }
        .emit();

        Ok(())
    }

    /// Executes a withdrawal following the CEI (Checks-Effects-Interactions) pattern.
    ///
    /// 1. **Checks**: Validates balance and allowance
    /// 2. **Effects**: Accrues, burns shares and reduces cached assets
    /// 3. **Interactions**: Pushes assets through the port
    ///
    /// A failed push restores every effect before the error is returned.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal_execute_withdrawal<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        receiver: &AccountId,
        shares: u128,
        assets: u128,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<()> {
        // Checks
        let owner_shares = self.share_balance(owner);
        if owner_shares < shares {
            return Err(SavingsError::InsufficientBalance);
        }
        let allowance = if caller != owner {
            let allowance = self.share_allowance(owner, caller);
            if allowance < shares {
                return Err(SavingsError::InsufficientAllowance);
            }
            Some(allowance)
        } else {
            None
        };
        let total_assets = self.internal_total_assets(now)?;
        let remaining_assets = total_assets
            .checked_sub(assets)
            .ok_or(SavingsError::InsufficientBalance)?;

        let rollback = WithdrawalRollback {
            cached_total_assets: self.cached_total_assets,
            last_accrual_time: self.last_accrual_time,
            owner_shares,
            allowance,
        };

        // Effects
        self.internal_accrue(now)?;
        self.internal_burn_shares(owner, shares)?;
        self.cached_total_assets = remaining_assets;
        if let Some(allowance) = allowance {
            self.set_share_allowance(owner, caller, allowance - shares);
        }

        // Interactions
        if let Err(err) = port.push(&self.vault_id, receiver, assets) {
            self.internal_rollback_withdrawal(caller, owner, shares, rollback);
            env::log_str(&format!(
                "withdrawal_rolled_back owner={} shares={} reason={}",
                owner, shares, err
            ));
            return Err(err);
        }

        VaultWithdraw {
            owner_id: owner,
            receiver_id: receiver,
            shares: U128(shares),
            assets: U128(assets),
        }
        .emit();

        Ok(())
    }

    fn internal_rollback_withdrawal(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        shares: u128,
        rollback: WithdrawalRollback,
    ) {
        self.cached_total_assets = rollback.cached_total_assets;
        self.last_accrual_time = rollback.last_accrual_time;
        self.total_share_supply += shares;
        self.holder_share_balance
            .insert(owner.clone(), rollback.owner_shares);
        if let Some(allowance) = rollback.allowance {
            self.set_share_allowance(owner, caller, allowance);
        }
    }
}
