//! # Savings Errors
//!
//! Every rejected operation surfaces one of these variants. Public contract
//! methods return them through `#[handle_result]`; `near-sdk` turns the
//! message into a panic, which reverts the whole receipt.

use std::fmt;

use near_sdk::env;

/// Precondition or accounting failure raised by the vault, the ledger or an
/// asset port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsError {
    /// Zero amount of assets or shares requested.
    InvalidAmount,
    /// Null account, or one of the contract's custody accounts, used as a
    /// destination or role.
    InvalidAddress,
    /// The goal date is not strictly after the current block time.
    GoalDateNotInFuture,
    /// The account already holds an active deposit.
    DuplicateActiveDeposit,
    /// The account has no active deposit.
    NoActiveDeposit,
    /// The source account does not hold enough assets or shares.
    InsufficientBalance,
    /// The spender is not approved for the requested amount.
    InsufficientAllowance,
    /// A share or asset conversion collapsed to zero.
    ZeroSharesOrAssetsResult,
    /// The first deposit into the vault is below the dead-share floor.
    FirstDepositBelowFloor,
    /// Redeemed assets fell short of the previewed value beyond tolerance.
    ValueMismatchOnRedeem,
    /// The caller is not the administrator.
    Unauthorized,
    /// Share or asset arithmetic overflowed or underflowed.
    ArithmeticOverflow,
}

impl AsRef<str> for SavingsError {
    fn as_ref(&self) -> &str {
        match self {
            Self::InvalidAmount => "Amount must be greater than zero",
            Self::InvalidAddress => "Destination must not be the null account or a custody account",
            Self::GoalDateNotInFuture => "Goal date must be in the future",
            Self::DuplicateActiveDeposit => "Account already has an active deposit",
            Self::NoActiveDeposit => "No active deposit for account",
            Self::InsufficientBalance => "Insufficient balance",
            Self::InsufficientAllowance => "Insufficient allowance",
            Self::ZeroSharesOrAssetsResult => "Conversion resulted in zero shares or assets",
            Self::FirstDepositBelowFloor => "First deposit is below the minimum seed amount",
            Self::ValueMismatchOnRedeem => "Redeemed value deviates from preview beyond tolerance",
            Self::Unauthorized => "Caller is not the owner",
            Self::ArithmeticOverflow => "Arithmetic overflow",
        }
    }
}

impl fmt::Display for SavingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::error::Error for SavingsError {}

/// Shorthand used across the engine.
pub type SavingsResult<T> = Result<T, SavingsError>;

/// Aborts the receipt with the error's message.
pub(crate) trait OrPanic<T> {
    fn or_panic(self) -> T;
}

impl<T> OrPanic<T> for SavingsResult<T> {
    fn or_panic(self) -> T {
        self.unwrap_or_else(|err| env::panic_str(err.as_ref()))
    }
}
