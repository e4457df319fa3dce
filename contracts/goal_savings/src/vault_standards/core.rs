use near_sdk::AccountId;
use uint::construct_uint;

use crate::error::SavingsResult;
use crate::port::AssetTransferPort;

construct_uint! {
    pub struct U256(4);
}

/// Share pricing and custody surface the ledger consumes.
///
/// Time is passed in explicitly (seconds) so that every read is a
/// deterministic function of state and `now`.
pub trait VaultCore {
    /// Account under which the vault holds its assets in the asset port.
    fn vault_id(&self) -> &AccountId;

    fn total_assets(&self, now: u64) -> SavingsResult<u128>;

    fn total_share_supply(&self) -> u128;

    fn share_balance_of(&self, account_id: &AccountId) -> u128;

    fn convert_to_shares(&self, assets: u128, now: u64) -> SavingsResult<u128>;

    fn convert_to_assets(&self, shares: u128, now: u64) -> SavingsResult<u128>;

    /// Shares that `deposit(assets)` would mint at `now`, including the
    /// dead-share seed on a fresh vault.
    fn preview_deposit(&self, assets: u128, now: u64) -> SavingsResult<u128>;

    fn deposit<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        assets: u128,
        receiver: &AccountId,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<u128>;

    fn redeem<P: AssetTransferPort>(
        &mut self,
        caller: &AccountId,
        shares: u128,
        receiver: &AccountId,
        owner: &AccountId,
        now: u64,
        port: &mut P,
    ) -> SavingsResult<u128>;

    fn max_redeem(&self, owner: &AccountId) -> u128 {
        self.share_balance_of(owner)
    }

    fn max_withdraw(&self, owner: &AccountId, now: u64) -> SavingsResult<u128> {
        self.convert_to_assets(self.share_balance_of(owner), now)
    }

    fn preview_redeem(&self, shares: u128, now: u64) -> SavingsResult<u128> {
        self.convert_to_assets(shares, now)
    }
}
