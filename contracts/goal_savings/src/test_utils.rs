//! # Test Utilities
//!
//! Provides helper functions and builders for unit testing the contract.
//! These utilities simplify test setup by handling NEAR SDK context
//! initialization and contract configuration.
//!
//! ## Modules
//!
//! - [`helpers`]: Low-level context, engine and contract initialization
//! - [`builders`]: Builder pattern for flexible contract configuration
//! - [`fakes`]: In-memory asset port and a short-paying vault for deterministic engine tests

/// Helper functions for test context and contract initialization.
#[cfg(test)]
pub mod helpers {
    use crate::ledger::GoalSavingsLedger;
    use crate::vault::ShareVault;
    use crate::{Contract, StorageKey};
    use near_sdk::test_utils::VMContextBuilder;
    use near_sdk::{testing_env, AccountId, NearToken};

    /// Account the contract is deployed to in unit tests.
    pub const CONTRACT_ID: &str = "savings.test";

    /// Custody account of the embedded share vault.
    pub const VAULT_CUSTODY_ID: &str = "vault.savings.test";

    const NANOS_PER_SECOND: u64 = 1_000_000_000;

    pub fn account(id: &str) -> AccountId {
        id.parse().unwrap()
    }

    /// Initializes the NEAR VM context for testing.
    ///
    /// # Arguments
    ///
    /// * `predecessor` - The account ID that will be the caller
    /// * `deposit_yocto` - Amount of yoctoNEAR attached to calls
    pub fn init_ctx(predecessor: &str, deposit_yocto: u128) {
        init_ctx_at(predecessor, deposit_yocto, 0);
    }

    /// Same as [`init_ctx`] with the block timestamp set to `now_secs`.
    pub fn init_ctx_at(predecessor: &str, deposit_yocto: u128, now_secs: u64) {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(account(CONTRACT_ID))
            .predecessor_account_id(account(predecessor))
            .attached_deposit(NearToken::from_yoctonear(deposit_yocto))
            .block_timestamp(now_secs * NANOS_PER_SECOND);
        testing_env!(builder.build());
    }

    /// Standalone share vault held under `vault.test`.
    pub fn new_vault(annual_yield_rate_bps: u32, now: u64) -> ShareVault {
        ShareVault::new(
            account("vault.test"),
            annual_yield_rate_bps,
            now,
            StorageKey::ShareBalances,
            StorageKey::ShareAllowances,
        )
    }

    /// Standalone ledger under `ledger.test` next to a vault under
    /// `vault.test`, owned by `owner.test`, penalties to `treasury.test`.
    pub fn new_ledger() -> GoalSavingsLedger {
        GoalSavingsLedger::new(
            account("ledger.test"),
            account("vault.test"),
            account("owner.test"),
            account("treasury.test"),
            StorageKey::Deposits,
        )
    }

    /// Initializes a contract paying 5% a year, penalties to `treasury.test`.
    pub fn init_contract(owner: &str, asset: &str) -> Contract {
        init_ctx(CONTRACT_ID, 0);
        Contract::init(account(owner), account("treasury.test"), account(asset), 500)
    }
}

/// Builder pattern for flexible contract configuration in tests.
#[cfg(test)]
pub mod builders {
    use crate::test_utils::helpers::{account, init_ctx_at, CONTRACT_ID};
    use crate::Contract;
    use near_contract_standards::fungible_token::receiver::FungibleTokenReceiver;
    use near_sdk::json_types::U128;

    /// Builder for creating test `Contract` instances with custom configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let contract = ContractBuilder::new("owner.test", "usdc.test")
    ///     .now(1_700_000_000)
    ///     .seed(1_000_000)
    ///     .yield_reserve(10_000_000)
    ///     .predecessor("alice.test")
    ///     .build();
    /// ```
    pub struct ContractBuilder {
        owner: String,
        asset: String,
        treasury: String,
        rate_bps: u32,
        now: u64,
        seed: u128,
        yield_reserve: u128,
        predecessor: Option<String>,
    }

    impl ContractBuilder {
        pub fn new(owner: &str, asset: &str) -> Self {
            Self {
                owner: owner.to_string(),
                asset: asset.to_string(),
                treasury: "treasury.test".to_string(),
                rate_bps: 500,
                now: 0,
                seed: 0,
                yield_reserve: 0,
                predecessor: Some(owner.to_string()),
            }
        }

        pub fn treasury(mut self, id: &str) -> Self {
            self.treasury = id.to_string();
            self
        }

        pub fn yield_rate_bps(mut self, bps: u32) -> Self {
            self.rate_bps = bps;
            self
        }

        /// Block time, in seconds, for initialization and subsequent calls.
        pub fn now(mut self, secs: u64) -> Self {
            self.now = secs;
            self
        }

        /// Seeds the vault from the owner through `ft_on_transfer`.
        pub fn seed(mut self, amount: u128) -> Self {
            self.seed = amount;
            self
        }

        /// Funds the vault's yield reserve through `ft_on_transfer`.
        pub fn yield_reserve(mut self, amount: u128) -> Self {
            self.yield_reserve = amount;
            self
        }

        /// Sets the predecessor (caller) account for subsequent calls.
        pub fn predecessor(mut self, id: &str) -> Self {
            self.predecessor = Some(id.to_string());
            self
        }

        pub fn build(self) -> Contract {
            init_ctx_at(CONTRACT_ID, 0, self.now);
            let mut c = Contract::init(
                account(&self.owner),
                account(&self.treasury),
                account(&self.asset),
                self.rate_bps,
            );

            if self.seed > 0 {
                init_ctx_at(&self.asset, 1, self.now);
                let _ = c.ft_on_transfer(
                    account(&self.owner),
                    U128(self.seed),
                    r#"{"seed_vault":{}}"#.to_string(),
                );
            }
            if self.yield_reserve > 0 {
                init_ctx_at(&self.asset, 1, self.now);
                let _ = c.ft_on_transfer(
                    account(&self.owner),
                    U128(self.yield_reserve),
                    r#"{"fund_yield":{}}"#.to_string(),
                );
            }

            if let Some(p) = &self.predecessor {
                init_ctx_at(p, 0, self.now);
            }
            c
        }
    }
}

/// In-memory asset port with the same rules as the contract's asset book,
/// and a vault that short-pays redemptions.
#[cfg(test)]
pub mod fakes {
    use std::collections::{HashMap, HashSet};

    use near_sdk::AccountId;

    use crate::error::{SavingsError, SavingsResult};
    use crate::port::AssetTransferPort;
    use crate::vault::ShareVault;
    use crate::vault_standards::VaultCore;

    #[derive(Default)]
    pub struct FakePort {
        balances: HashMap<String, u128>,
        allowances: HashMap<(String, String), u128>,
        failing_custodians: HashSet<String>,
    }

    impl FakePort {
        /// Adds `amount` to `who`'s balance.
        pub fn fund(&mut self, who: &str, amount: u128) {
            *self.balances.entry(who.to_string()).or_default() += amount;
        }

        /// Sets how much `spender` may pull from `owner`.
        pub fn allow(&mut self, owner: &str, spender: &str, amount: u128) {
            self.allowances
                .insert((owner.to_string(), spender.to_string()), amount);
        }

        pub fn balance(&self, who: &str) -> u128 {
            self.balances.get(who).copied().unwrap_or(0)
        }

        /// Every later push out of `custodian` fails.
        pub fn fail_pushes_from(&mut self, custodian: &str) {
            self.failing_custodians.insert(custodian.to_string());
        }

        fn transfer(&mut self, from: &str, to: &str, amount: u128) -> SavingsResult<()> {
            if amount == 0 {
                return Err(SavingsError::InvalidAmount);
            }
            let from_balance = self
                .balance(from)
                .checked_sub(amount)
                .ok_or(SavingsError::InsufficientBalance)?;
            self.balances.insert(from.to_string(), from_balance);
            self.fund(to, amount);
            Ok(())
        }
    }

    impl AssetTransferPort for FakePort {
        fn pull(
            &mut self,
            custodian: &AccountId,
            from: &AccountId,
            amount: u128,
        ) -> SavingsResult<()> {
            if from != custodian {
                let key = (from.to_string(), custodian.to_string());
                let allowance = self.allowances.get(&key).copied().unwrap_or(0);
                let remaining = allowance
                    .checked_sub(amount)
                    .ok_or(SavingsError::InsufficientAllowance)?;
                self.transfer(from.as_str(), custodian.as_str(), amount)?;
                self.allowances.insert(key, remaining);
                return Ok(());
            }
            self.transfer(from.as_str(), custodian.as_str(), amount)
        }

        fn push(
            &mut self,
            custodian: &AccountId,
            to: &AccountId,
            amount: u128,
        ) -> SavingsResult<()> {
            if self.failing_custodians.contains(custodian.as_str()) {
                return Err(SavingsError::InsufficientBalance);
            }
            self.transfer(custodian.as_str(), to.as_str(), amount)
        }

        fn check_push(
            &self,
            custodian: &AccountId,
            _to: &AccountId,
            amount: u128,
        ) -> SavingsResult<()> {
            if self.failing_custodians.contains(custodian.as_str()) {
                return Err(SavingsError::InsufficientBalance);
            }
            if amount == 0 {
                return Err(SavingsError::InvalidAmount);
            }
            if self.balance(custodian.as_str()) < amount {
                return Err(SavingsError::InsufficientBalance);
            }
            Ok(())
        }

        fn approve(
            &mut self,
            owner: &AccountId,
            spender: &AccountId,
            amount: u128,
        ) -> SavingsResult<()> {
            self.allow(owner.as_str(), spender.as_str(), amount);
            Ok(())
        }
    }

    /// Share vault that pays `shortfall` fewer assets than it prices on
    /// every redeem. The withheld assets go back to the vault's custody.
    pub struct ShortPayVault {
        pub inner: ShareVault,
        pub shortfall: u128,
    }

    impl VaultCore for ShortPayVault {
        fn vault_id(&self) -> &AccountId {
            self.inner.vault_id()
        }

        fn total_assets(&self, now: u64) -> SavingsResult<u128> {
            self.inner.total_assets(now)
        }

        fn total_share_supply(&self) -> u128 {
            self.inner.total_share_supply()
        }

        fn share_balance_of(&self, account_id: &AccountId) -> u128 {
            self.inner.share_balance_of(account_id)
        }

        fn convert_to_shares(&self, assets: u128, now: u64) -> SavingsResult<u128> {
            self.inner.convert_to_shares(assets, now)
        }

        fn convert_to_assets(&self, shares: u128, now: u64) -> SavingsResult<u128> {
            self.inner.convert_to_assets(shares, now)
        }

        fn preview_deposit(&self, assets: u128, now: u64) -> SavingsResult<u128> {
            self.inner.preview_deposit(assets, now)
        }

        fn deposit<P: AssetTransferPort>(
            &mut self,
            caller: &AccountId,
            assets: u128,
            receiver: &AccountId,
            now: u64,
            port: &mut P,
        ) -> SavingsResult<u128> {
            self.inner.deposit(caller, assets, receiver, now, port)
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
            let assets = self.inner.redeem(caller, shares, receiver, owner, now, port)?;
            port.push(receiver, &self.inner.vault_id, self.shortfall)?;
            Ok(assets - self.shortfall)
        }
    }
}
