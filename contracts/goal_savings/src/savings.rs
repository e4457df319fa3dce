//! # Savings Entry Points
//!
//! Connects the NEP-141 asset to the engine:
//!
//! - `ft_on_transfer` credits the asset book and routes the transfer by `msg`
//! - `withdraw` closes the caller's goal deposit and schedules payouts
//! - `claim` retries a payout whose `ft_transfer` failed
//!
//! Every payout debits the asset book before the `ft_transfer` is issued;
//! `resolve_payout` credits it back if the transfer fails.

use near_contract_standards::fungible_token::core::ext_ft_core;
use near_contract_standards::fungible_token::receiver::FungibleTokenReceiver;
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{
    env, ext_contract,
    json_types::{U128, U64},
    near, require, AccountId, Gas, NearToken, Promise, PromiseOrValue, PromiseResult,
};
use schemars::JsonSchema;

use crate::error::{OrPanic, SavingsError};
use crate::ledger::{UserInfo, WithdrawalPreview};
use crate::port::AssetTransferPort;
use crate::vault::DEAD_SHARES;
use crate::vault_standards::VaultCore;
use crate::{now_secs, Contract, ContractExt};

/// Gas allocation for the payout `ft_transfer`.
const GAS_FOR_FT_TRANSFER: Gas = Gas::from_tgas(30);

/// Gas allocation for the `resolve_payout` callback.
const GAS_FOR_RESOLVE_PAYOUT: Gas = Gas::from_tgas(10);

/// External contract interface for callback methods.
#[allow(dead_code)]
#[ext_contract(ext_self)]
trait ExtContract {
    fn resolve_payout(&mut self, receiver_id: AccountId, amount: U128) -> U128;
}

#[derive(Deserialize)]
#[serde(crate = "near_sdk::serde")]
#[serde(rename_all = "snake_case")]
pub enum FtTransferAction {
    /// Opens a goal deposit for the sender.
    Deposit(DepositMessage),
    /// Owner only. Locks the dead-share floor; any excess funds the yield reserve.
    SeedVault {},
    /// Adds to the vault's holdings that back accrued yield. Mints no shares.
    FundYield {},
}

#[derive(Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub struct DepositMessage {
    /// Seconds since the Unix epoch.
    pub goal_date: U64,
}

/// Position summary returned by `get_user_info`. Amounts are decimal strings.
#[derive(Serialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct UserInfoView {
    pub principal: String,
    pub current_value: String,
    #[serde(rename = "yield")]
    pub yield_amount: String,
    /// Seconds since the Unix epoch.
    pub goal_date: String,
    pub is_early: bool,
    pub potential_penalty: String,
}

impl From<UserInfo> for UserInfoView {
    fn from(value: UserInfo) -> Self {
        UserInfoView {
            principal: value.principal.to_string(),
            current_value: value.current_value.to_string(),
            yield_amount: value.yield_amount.to_string(),
            goal_date: value.goal_date.to_string(),
            is_early: value.is_early,
            potential_penalty: value.potential_penalty.to_string(),
        }
    }
}

#[derive(Serialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct WithdrawalPreviewView {
    pub user_will_receive: String,
    pub penalty_amount: String,
}

impl From<WithdrawalPreview> for WithdrawalPreviewView {
    fn from(value: WithdrawalPreview) -> Self {
        WithdrawalPreviewView {
            user_will_receive: value.user_will_receive.to_string(),
            penalty_amount: value.penalty_amount.to_string(),
        }
    }
}

impl Contract {
    fn handle_deposit(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: DepositMessage,
    ) -> PromiseOrValue<U128> {
        let now = now_secs();

        self.book.credit(&sender_id, amount.0).or_panic();
        self.book
            .approve(&sender_id, &self.ledger.ledger_id, amount.0)
            .or_panic();
        let shares = self
            .ledger
            .deposit(
                &sender_id,
                amount.0,
                msg.goal_date.0,
                now,
                &mut self.vault,
                &mut self.book,
            )
            .or_panic();

        env::log_str(&format!(
            "goal_deposit account={} amount={} shares={} goal_date={}",
            sender_id, amount.0, shares, msg.goal_date.0
        ));

        PromiseOrValue::Value(U128(0))
    }

    fn handle_seed(&mut self, sender_id: AccountId, amount: U128) -> PromiseOrValue<U128> {
        require!(
            sender_id == self.ledger.owner_id,
            SavingsError::Unauthorized.as_ref()
        );
        require!(!self.vault.dead_shares_minted, "Vault is already seeded");
        require!(
            amount.0 >= DEAD_SHARES,
            SavingsError::FirstDepositBelowFloor.as_ref()
        );

        let now = now_secs();
        let vault_id = self.vault.vault_id.clone();

        self.book.credit(&sender_id, amount.0).or_panic();
        self.book
            .approve(&sender_id, &vault_id, DEAD_SHARES)
            .or_panic();
        self.vault
            .deposit(&sender_id, DEAD_SHARES, &sender_id, now, &mut self.book)
            .or_panic();

        let reserve = amount.0 - DEAD_SHARES;
        if reserve > 0 {
            self.book.push(&sender_id, &vault_id, reserve).or_panic();
        }

        env::log_str(&format!(
            "vault_seeded owner={} floor={} reserve={}",
            sender_id, DEAD_SHARES, reserve
        ));

        PromiseOrValue::Value(U128(0))
    }

    fn handle_fund_yield(&mut self, sender_id: AccountId, amount: U128) -> PromiseOrValue<U128> {
        require!(amount.0 > 0, SavingsError::InvalidAmount.as_ref());

        let vault_id = self.vault.vault_id.clone();
        self.book.credit(&vault_id, amount.0).or_panic();

        env::log_str(&format!(
            "yield_reserve_funded sender={} amount={} vault_balance={}",
            sender_id,
            amount.0,
            self.book.balance_of(&vault_id)
        ));

        PromiseOrValue::Value(U128(0))
    }

    /// Sends `account_id`'s whole asset book balance out with `ft_transfer`.
    ///
    /// Returns `None` when there is nothing to pay.
    fn internal_payout(&mut self, account_id: &AccountId) -> Option<Promise> {
        let amount = self.book.balance_of(account_id);
        if amount == 0 {
            return None;
        }
        self.book.debit(account_id, amount).or_panic();

        let promise = ext_ft_core::ext(self.asset.clone())
            .with_attached_deposit(NearToken::from_yoctonear(1))
            .with_static_gas(GAS_FOR_FT_TRANSFER)
            .ft_transfer(
                account_id.clone(),
                U128(amount),
                Some("Goal savings payout".to_string()),
            )
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(GAS_FOR_RESOLVE_PAYOUT)
                    .resolve_payout(account_id.clone(), U128(amount)),
            );

        Some(promise)
    }
}

#[near]
impl Contract {
    /// Closes the caller's goal deposit.
    ///
    /// Early withdrawals with a positive yield pay half of the yield to the
    /// treasury. Both payouts are `ft_transfer`s of the asset.
    ///
    /// # Returns
    ///
    /// The amount paid to the caller.
    #[handle_result]
    pub fn withdraw(&mut self) -> Result<U128, SavingsError> {
        self.require_not_paused();
        let account_id = env::predecessor_account_id();

        let receipt =
            self.ledger
                .withdraw(&account_id, now_secs(), &mut self.vault, &mut self.book)?;

        // Dropping a `Promise` still schedules it; neither payout is the return value.
        if receipt.penalty > 0 {
            let treasury_id = self.ledger.treasury_id.clone();
            let _ = self.internal_payout(&treasury_id);
        }
        let _ = self.internal_payout(&account_id);

        Ok(U128(receipt.total_received))
    }

    /// Pays out any asset balance the caller still holds in the book, such as
    /// a payout whose `ft_transfer` failed.
    pub fn claim(&mut self) -> PromiseOrValue<U128> {
        let account_id = env::predecessor_account_id();
        require!(
            !self.ledger.is_custody_account(&account_id),
            "Custody accounts cannot claim"
        );

        match self.internal_payout(&account_id) {
            Some(promise) => PromiseOrValue::Promise(promise),
            None => PromiseOrValue::Value(U128(0)),
        }
    }

    /// Credits a failed payout back to the receiver's book balance.
    ///
    /// # Returns
    ///
    /// The amount delivered, 0 if the transfer failed.
    #[private]
    pub fn resolve_payout(&mut self, receiver_id: AccountId, amount: U128) -> U128 {
        match env::promise_result(0) {
            PromiseResult::Successful(_) => amount,
            _ => {
                self.book.credit(&receiver_id, amount.0).or_panic();
                env::log_str(&format!(
                    "payout_failed receiver={} amount={} credited_back=true",
                    receiver_id, amount.0
                ));
                U128(0)
            }
        }
    }

    // ==================== View Methods ====================

    pub fn get_user_info(&self, account_id: AccountId) -> UserInfoView {
        self.ledger
            .user_info(&account_id, now_secs(), &self.vault)
            .or_panic()
            .into()
    }

    pub fn preview_withdrawal(&self, account_id: AccountId) -> WithdrawalPreviewView {
        self.ledger
            .preview_withdrawal(&account_id, now_secs(), &self.vault)
            .or_panic()
            .into()
    }

    pub fn total_assets(&self) -> U128 {
        U128(self.vault.total_assets(now_secs()).or_panic())
    }

    pub fn total_share_supply(&self) -> U128 {
        U128(self.vault.total_share_supply())
    }

    pub fn convert_to_shares(&self, assets: U128) -> U128 {
        U128(self.vault.convert_to_shares(assets.0, now_secs()).or_panic())
    }

    pub fn convert_to_assets(&self, shares: U128) -> U128 {
        U128(self.vault.convert_to_assets(shares.0, now_secs()).or_panic())
    }

    pub fn preview_deposit(&self, assets: U128) -> U128 {
        U128(self.vault.preview_deposit(assets.0, now_secs()).or_panic())
    }

    pub fn preview_mint(&self, shares: U128) -> U128 {
        U128(self.vault.preview_mint(shares.0, now_secs()).or_panic())
    }

    pub fn preview_withdraw(&self, assets: U128) -> U128 {
        U128(self.vault.preview_withdraw(assets.0, now_secs()).or_panic())
    }

    pub fn preview_redeem(&self, shares: U128) -> U128 {
        U128(self.vault.preview_redeem(shares.0, now_secs()).or_panic())
    }

    pub fn share_balance_of(&self, account_id: AccountId) -> U128 {
        U128(self.vault.share_balance_of(&account_id))
    }

    /// Asset held for `account_id` in the contract's book.
    pub fn asset_balance_of(&self, account_id: AccountId) -> U128 {
        U128(self.book.balance_of(&account_id))
    }
}

#[near]
impl FungibleTokenReceiver for Contract {
    fn ft_on_transfer(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: String,
    ) -> PromiseOrValue<U128> {
        assert_eq!(
            env::predecessor_account_id(),
            self.asset.clone(),
            "Only the underlying asset can call ft_on_transfer"
        );
        self.require_not_paused();

        let action = serde_json::from_str::<FtTransferAction>(&msg)
            .unwrap_or_else(|_| env::panic_str("Invalid ft_on_transfer message"));

        match action {
            FtTransferAction::Deposit(deposit) => self.handle_deposit(sender_id, amount, deposit),
            FtTransferAction::SeedVault {} => self.handle_seed(sender_id, amount),
            FtTransferAction::FundYield {} => self.handle_fund_yield(sender_id, amount),
        }
    }
}
