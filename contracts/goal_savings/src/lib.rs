//! # Goal Savings Contract
//!
//! A NEAR smart contract that lets an account lock a NEP-141 asset until a
//! self-chosen goal date while it earns a fixed annual yield.
//!
//! - **Share Vault**: NEP-621 style vault whose assets grow linearly at a
//!   configured basis-point rate
//! - **Goal Ledger**: one active deposit per account, with half of the yield
//!   sent to the treasury on early withdrawal
//! - **Custody**: tokens arrive through `ft_on_transfer` and leave through
//!   `ft_transfer` payouts
//!
//! ## Architecture
//!
//! - [`vault`]: Share vault state, accrual and ERC-4626 style operations
//! - [`ledger`]: Goal deposits, withdrawal split and administration
//! - [`port`]: Asset transfer seam and the in-contract asset book
//! - [`savings`]: Contract entry points, payouts and views
//! - [`vault_standards`]: Vault trait, rounding math and NEP-297 events

use near_sdk::{
    borsh::{self, BorshDeserialize, BorshSerialize},
    env, near, require, AccountId, AccountIdRef, BorshStorageKey, PanicOnDefault,
};

pub mod error;
pub mod ledger;
pub mod port;
mod savings;
pub mod vault;
pub mod vault_standards;

#[cfg(test)]
pub mod test_utils;

use error::OrPanic;
pub use error::{SavingsError, SavingsResult};
use ledger::GoalSavingsLedger;
use port::AssetBook;
use vault::ShareVault;

/// The invalid destination address.
pub const NULL_ACCOUNT: &AccountIdRef =
    AccountIdRef::new_or_panic("0000000000000000000000000000000000000000000000000000000000000000");

const NANOS_PER_SECOND: u64 = 1_000_000_000;

pub(crate) fn is_null_account(account_id: &AccountId) -> bool {
    account_id.as_str() == NULL_ACCOUNT.as_str()
}

/// Current block time in seconds.
pub(crate) fn now_secs() -> u64 {
    env::block_timestamp() / NANOS_PER_SECOND
}

/// Storage keys for NEAR SDK collections.
#[derive(BorshSerialize, BorshDeserialize, BorshStorageKey)]
#[borsh(crate = "near_sdk::borsh")]
pub enum StorageKey {
    /// Asset balances held in custody, by account.
    AssetBalances,
    /// Asset allowances, by (owner, spender).
    AssetAllowances,
    /// Vault share balances, by holder.
    ShareBalances,
    /// Vault share allowances, by (owner, spender).
    ShareAllowances,
    /// Active goal deposits, by account.
    Deposits,
}

/// Main contract state: custody book, share vault and goal ledger.
#[near(contract_state)]
#[derive(PanicOnDefault)]
pub struct Contract {
    /// Whether the contract is paused (deposits and withdrawals blocked).
    pub is_paused: bool,
    /// Account ID of the underlying asset token (NEP-141).
    pub asset: AccountId,
    /// Custody balances of the underlying asset.
    pub book: AssetBook,
    pub vault: ShareVault,
    pub ledger: GoalSavingsLedger,
}

#[near]
impl Contract {
    /// Initializes the contract.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - Account authorized to manage contract settings
    /// * `treasury_id` - Receiver of early withdrawal penalties
    /// * `asset` - Account ID of the underlying NEP-141 asset token
    /// * `annual_yield_rate_bps` - Yearly vault growth in basis points (500 = 5%)
    ///
    /// The vault holds its assets under `vault.<contract id>` in the asset book
    /// and the ledger under the contract id itself.
    #[init]
    #[private]
    pub fn init(
        owner_id: AccountId,
        treasury_id: AccountId,
        asset: AccountId,
        annual_yield_rate_bps: u32,
    ) -> Self {
        let ledger_id = env::current_account_id();
        let vault_id: AccountId = format!("vault.{}", ledger_id)
            .parse()
            .unwrap_or_else(|_| env::panic_str("Contract account id is too long"));

        let ledger = GoalSavingsLedger::new(
            ledger_id,
            vault_id.clone(),
            owner_id,
            treasury_id,
            StorageKey::Deposits,
        );
        ledger.check_role_account(&ledger.owner_id).or_panic();
        ledger.check_role_account(&ledger.treasury_id).or_panic();

        env::log_str(&format!(
            "goal_savings_init owner={} treasury={} asset={} rate_bps={}",
            ledger.owner_id, ledger.treasury_id, asset, annual_yield_rate_bps
        ));

        Self {
            is_paused: false,
            asset,
            book: AssetBook::new(StorageKey::AssetBalances, StorageKey::AssetAllowances),
            vault: ShareVault::new(
                vault_id,
                annual_yield_rate_bps,
                now_secs(),
                StorageKey::ShareBalances,
                StorageKey::ShareAllowances,
            ),
            ledger,
        }
    }

    /// Pauses the contract, blocking deposits and withdrawals.
    ///
    /// Only the contract owner can pause. View methods and `claim` remain accessible.
    ///
    /// # Panics
    ///
    /// Panics if caller is not the contract owner.
    pub fn pause(&mut self) {
        self.require_owner();
        self.is_paused = true;
    }

    /// Unpauses the contract, resuming normal operations.
    ///
    /// # Panics
    ///
    /// Panics if caller is not the contract owner.
    pub fn unpause(&mut self) {
        self.require_owner();
        self.is_paused = false;
    }

    /// Points penalty payouts at `new_treasury_id`.
    #[handle_result]
    pub fn update_treasury(&mut self, new_treasury_id: AccountId) -> Result<(), SavingsError> {
        self.ledger
            .update_treasury(&env::predecessor_account_id(), new_treasury_id)
    }

    /// Hands administration over to `new_owner_id`.
    #[handle_result]
    pub fn transfer_ownership(&mut self, new_owner_id: AccountId) -> Result<(), SavingsError> {
        self.ledger
            .transfer_ownership(&env::predecessor_account_id(), new_owner_id)
    }

    // ==================== View Methods ====================

    pub fn get_owner(&self) -> AccountId {
        self.ledger.owner_id.clone()
    }

    pub fn get_treasury(&self) -> AccountId {
        self.ledger.treasury_id.clone()
    }

    pub fn get_asset(&self) -> AccountId {
        self.asset.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn annual_yield_rate_bps(&self) -> u32 {
        self.vault.annual_yield_rate_bps
    }
}

impl Contract {
    /// Asserts that the caller is the contract owner.
    ///
    /// # Panics
    ///
    /// Panics if the predecessor account is not the owner.
    pub(crate) fn require_owner(&self) {
        require!(
            env::predecessor_account_id() == self.ledger.owner_id,
            SavingsError::Unauthorized.as_ref()
        );
    }

    /// Asserts that the contract is not paused.
    ///
    /// # Panics
    ///
    /// Panics if the contract is currently paused.
    pub(crate) fn require_not_paused(&self) {
        require!(!self.is_paused, "Contract is paused");
    }
}
