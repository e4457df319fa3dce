//! # Savings Events
//!
//! NEP-297 event logging for vault and goal-savings operations.
//! Events are emitted as JSON logs prefixed with `EVENT_JSON:`.
//!
//! ## Event Types
//!
//! - `VaultDeposit`: Assets entered the share vault and shares were minted
//! - `VaultWithdraw`: Shares were burned and assets left the share vault
//! - `DepositRecorded`: A goal deposit was opened for an account
//! - `WithdrawalCompleted`: A goal deposit was closed and paid out
//! - `PenaltyCollected`: Part of the yield was sent to the treasury
//! - `TreasuryUpdated`: The penalty destination changed
//! - `OwnershipTransferred`: The administrator changed
//!
//! ## Format
//!
//! ```json
//! {
//!   "standard": "goal_savings",
//!   "version": "1.0.0",
//!   "event": "deposit_recorded",
//!   "data": [{ ... }]
//! }
//! ```

use near_sdk::json_types::{U128, U64};
use near_sdk::serde::Serialize;
use near_sdk::{env, AccountIdRef};

// ============================================================================
// Event Wrapper
// ============================================================================

/// Top-level event wrapper carrying the standard name.
#[derive(Serialize, Debug)]
#[serde(crate = "near_sdk::serde")]
#[serde(tag = "standard")]
#[must_use = "don't forget to `.emit()` this event"]
#[serde(rename_all = "snake_case")]
pub(crate) enum NearEvent<'a> {
    GoalSavings(GoalSavingsEvent<'a>),
}

impl<'a> NearEvent<'a> {
    fn to_json_string(&self) -> String {
        #[allow(clippy::redundant_closure)]
        serde_json::to_string(self)
            .ok()
            .unwrap_or_else(|| env::abort())
    }

    fn to_json_event_string(&self) -> String {
        format!("EVENT_JSON:{}", self.to_json_string())
    }

    /// Logs the event to the NEAR runtime.
    pub(crate) fn emit(self) {
        env::log_str(&self.to_json_event_string());
    }
}

// ============================================================================
// Vault Events
// ============================================================================

/// Emitted when assets are deposited into the share vault and shares are minted.
#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct VaultDeposit<'a> {
    /// The account the assets were pulled from.
    pub sender_id: &'a AccountIdRef,
    /// The account credited with the shares.
    pub owner_id: &'a AccountIdRef,
    pub assets: U128,
    pub shares: U128,
}

impl VaultDeposit<'_> {
    pub fn emit(self) {
        new_v1(EventKind::VaultDeposit(&[self])).emit()
    }
}

/// Emitted when shares are burned and assets are pushed out of the vault.
#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct VaultWithdraw<'a> {
    /// The account that owned the shares.
    pub owner_id: &'a AccountIdRef,
    /// The account that received the assets.
    pub receiver_id: &'a AccountIdRef,
    pub shares: U128,
    pub assets: U128,
}

impl VaultWithdraw<'_> {
    pub fn emit(self) {
        new_v1(EventKind::VaultWithdraw(&[self])).emit()
    }
}

// ============================================================================
// Ledger Events
// ============================================================================

#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct DepositRecorded<'a> {
    pub account_id: &'a AccountIdRef,
    pub amount: U128,
    pub shares: U128,
    pub goal_date: U64,
    pub deposit_date: U64,
}

impl DepositRecorded<'_> {
    pub fn emit(self) {
        new_v1(EventKind::DepositRecorded(&[self])).emit()
    }
}

#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct WithdrawalCompleted<'a> {
    pub account_id: &'a AccountIdRef,
    pub principal: U128,
    #[serde(rename = "yield")]
    pub yield_amount: U128,
    pub penalty: U128,
    pub total_received: U128,
    pub is_early: bool,
}

impl WithdrawalCompleted<'_> {
    pub fn emit(self) {
        new_v1(EventKind::WithdrawalCompleted(&[self])).emit()
    }
}

#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct PenaltyCollected<'a> {
    pub account_id: &'a AccountIdRef,
    pub treasury_id: &'a AccountIdRef,
    pub amount: U128,
}

impl PenaltyCollected<'_> {
    pub fn emit(self) {
        new_v1(EventKind::PenaltyCollected(&[self])).emit()
    }
}

#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct TreasuryUpdated<'a> {
    pub old_treasury_id: &'a AccountIdRef,
    pub new_treasury_id: &'a AccountIdRef,
}

impl TreasuryUpdated<'_> {
    pub fn emit(self) {
        new_v1(EventKind::TreasuryUpdated(&[self])).emit()
    }
}

#[must_use]
#[derive(Serialize, Debug, Clone)]
#[serde(crate = "near_sdk::serde")]
pub struct OwnershipTransferred<'a> {
    pub old_owner_id: &'a AccountIdRef,
    pub new_owner_id: &'a AccountIdRef,
}

impl OwnershipTransferred<'_> {
    pub fn emit(self) {
        new_v1(EventKind::OwnershipTransferred(&[self])).emit()
    }
}

// ============================================================================
// Internal Event Structures
// ============================================================================

#[derive(Serialize, Debug)]
#[serde(crate = "near_sdk::serde")]
pub(crate) struct GoalSavingsEvent<'a> {
    version: &'static str,
    #[serde(flatten)]
    event_kind: EventKind<'a>,
}

#[derive(Serialize, Debug)]
#[serde(crate = "near_sdk::serde")]
#[serde(tag = "event", content = "data")]
#[serde(rename_all = "snake_case")]
enum EventKind<'a> {
    VaultDeposit(&'a [VaultDeposit<'a>]),
    VaultWithdraw(&'a [VaultWithdraw<'a>]),
    DepositRecorded(&'a [DepositRecorded<'a>]),
    WithdrawalCompleted(&'a [WithdrawalCompleted<'a>]),
    PenaltyCollected(&'a [PenaltyCollected<'a>]),
    TreasuryUpdated(&'a [TreasuryUpdated<'a>]),
    OwnershipTransferred(&'a [OwnershipTransferred<'a>]),
}

fn new_v1(event_kind: EventKind) -> NearEvent {
    NearEvent::GoalSavings(GoalSavingsEvent {
        version: "1.0.0",
        event_kind,
    })
}
