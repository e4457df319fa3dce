//! # Vault Standards Module
//!
//! Share-vault building blocks in the shape of the NEP-621 fungible token
//! vault standard.
//!
//! ## Module Organization
//!
//! - [`core`]: `VaultCore` pricing trait and the 256-bit integer type
//! - [`events`]: NEP-297 event logging for vault and savings operations
//! - [`internal`]: Accrual math and rounding-aware share/asset conversions
//! - [`mul_div`]: Checked multiplication and division with configurable rounding

pub mod core;
pub mod events;
pub mod internal;
pub mod mul_div;

pub use core::*;
