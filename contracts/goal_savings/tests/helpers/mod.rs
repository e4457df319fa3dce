//! # Test Helpers Module
//!
//! Provides common infrastructure for NEAR sandbox integration tests.
//! These helpers abstract away boilerplate for deploying contracts, creating
//! accounts, and performing common operations.
//!
//! ## Modules
//!
//! - [`test_builder`]: Builder pattern for constructing savings scenarios
//!
//! ## Key Functions
//!
//! - [`deploy_mock_ft`]: Deploys a mock NEP-141 fungible token
//! - [`deploy_savings_contract`]: Deploys the goal savings contract with mock FT
//! - [`create_user_account`]: Creates funded test accounts
//! - [`create_network_config`]: Configures connection to sandbox

use near_api::near_primitives::views::FinalExecutionStatus;
use near_api::{
    signer, Account, AccountId, Contract, NearToken, NetworkConfig, RPCEndpoint, Signer,
};
use near_sandbox::{GenesisAccount, Sandbox};
use serde_json::json;
use std::sync::Arc;


// ============================================================================
// Constants
// ============================================================================

/// Path to the compiled goal savings contract WASM.
pub const CONTRACT_WASM_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../target/near/goal_savings/goal_savings.wasm"
);

/// Path to the compiled mock FT contract WASM.
pub const MOCK_FT_WASM_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../target/near/mock_ft/mock_ft.wasm"
);

/// Annual yield configured at deploy time (5%).
pub const ANNUAL_YIELD_RATE_BPS: u32 = 500;

/// Dead-share floor locked by the first deposit.
#[allow(dead_code)]
pub const DEAD_SHARES: u128 = 1_000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Validates that a transaction execution status indicates success.
///
/// # Arguments
///
/// * `status` - The execution status to check
/// * `context` - Description for error messages
pub fn ensure_success_status(
    status: &FinalExecutionStatus,
    context: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match status {
        FinalExecutionStatus::SuccessValue(_) => Ok(()),
        FinalExecutionStatus::Failure(err) => {
            Err(format!("{context} failed with execution error: {:?}", err).into())
        }
        other => Err(format!("{context} returned unexpected status: {:?}", other).into()),
    }
}

/// Creates a network configuration for connecting to the sandbox.
pub fn create_network_config(sandbox: &Sandbox) -> NetworkConfig {
    NetworkConfig {
        network_name: "sandbox".to_string(),
        rpc_endpoints: vec![RPCEndpoint::new(sandbox.rpc_addr.parse().unwrap())],
        ..NetworkConfig::testnet()
    }
}

/// Retrieves the genesis account credentials from the sandbox.
///
/// The genesis account holds the initial NEAR balance, the whole mock USDC
/// supply and owns the savings contract.
pub async fn setup_genesis_account() -> (AccountId, Arc<Signer>) {
    let genesis_account_default = GenesisAccount::default();
    let genesis_account_id: AccountId = genesis_account_default.account_id;
    let genesis_signer: Arc<Signer> = Signer::new(Signer::from_secret_key(
        genesis_account_default.private_key.parse().unwrap(),
    ))
    .unwrap();

    (genesis_account_id, genesis_signer)
}

/// Deploys a mock NEP-141 fungible token contract under `usdc.<genesis>`.
///
/// # Returns
///
/// The account ID of the deployed FT contract.
pub async fn deploy_mock_ft(
    network_config: &NetworkConfig,
    genesis_account_id: &AccountId,
    genesis_signer: &Arc<Signer>,
    total_supply: &str,
) -> Result<AccountId, Box<dyn std::error::Error + Send + Sync>> {
    let ft_id: AccountId = format!("usdc.{}", genesis_account_id).parse()?;
    let ft_secret_key = signer::generate_secret_key()?;

    Account::create_account(ft_id.clone())
        .fund_myself(genesis_account_id.clone(), NearToken::from_near(10))
        .public_key(ft_secret_key.public_key())
        .unwrap()
        .with_signer(genesis_signer.clone())
        .send_to(network_config)
        .await?;

    println!("Mock FT account created: {}", ft_id);

    let wasm_bytes = std::fs::read(MOCK_FT_WASM_PATH)?;
    let ft_signer: Arc<Signer> = Signer::new(Signer::from_secret_key(ft_secret_key)).unwrap();

    let deploy_res = Contract::deploy(ft_id.clone())
        .use_code(wasm_bytes)
        .with_init_call(
            "new",
            json!({
                "owner_id": genesis_account_id,
                "total_supply": total_supply,
                "metadata": {
                    "spec": "ft-1.0.0",
                    "name": "Mock USDC",
                    "symbol": "USDC",
                    "icon": null,
                    "reference": null,
                    "reference_hash": null,
                    "decimals": 6
                }
            }),
        )?
        .with_signer(ft_signer)
        .send_to(network_config)
        .await?;

    ensure_success_status(&deploy_res.status, "Mock FT deploy")?;
    println!("Mock FT deployed with total_supply: {}", total_supply);

    Ok(ft_id)
}

/// Registers `account_id` for storage on the FT contract.
pub async fn register_with_ft(
    network_config: &NetworkConfig,
    ft_id: &AccountId,
    account_id: &AccountId,
    payer_id: &AccountId,
    payer_signer: &Arc<Signer>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Contract(ft_id.clone())
        .call_function("storage_deposit", json!({ "account_id": account_id }))?
        .transaction()
        .deposit(NearToken::from_millinear(10))
        .with_signer(payer_id.clone(), payer_signer.clone())
        .send_to(network_config)
        .await?;
    Ok(())
}

/// Deploys the goal savings contract with a mock FT as the underlying asset.
///
/// This function:
/// 1. Deploys a mock USDC token with 1M supply
/// 2. Creates the treasury account and registers it with the FT
/// 3. Creates, deploys and initializes the savings contract
/// 4. Registers the savings contract with the FT for storage
///
/// # Returns
///
/// `(savings_id, asset_id, treasury_id)`.
pub async fn deploy_savings_contract(
    network_config: &NetworkConfig,
    genesis_account_id: &AccountId,
    genesis_signer: &Arc<Signer>,
) -> Result<(AccountId, AccountId, AccountId), Box<dyn std::error::Error + Send + Sync>> {
    let total_supply = "1000000000000"; // 1 million USDC (6 decimals)
    let asset_id =
        deploy_mock_ft(network_config, genesis_account_id, genesis_signer, total_supply).await?;

    let (treasury_id, _) =
        create_user_account(network_config, genesis_account_id, genesis_signer, "treasury")
            .await?;
    register_with_ft(
        network_config,
        &asset_id,
        &treasury_id,
        genesis_account_id,
        genesis_signer,
    )
    .await?;

    let contract_id: AccountId = format!("savings.{}", genesis_account_id).parse()?;
    let contract_secret_key = signer::generate_secret_key()?;

    Account::create_account(contract_id.clone())
        .fund_myself(genesis_account_id.clone(), NearToken::from_near(10))
        .public_key(contract_secret_key.public_key())
        .unwrap()
        .with_signer(genesis_signer.clone())
        .send_to(network_config)
        .await?;

    println!("Savings contract account created: {}", contract_id);

    let wasm_bytes = std::fs::read(CONTRACT_WASM_PATH)?;
    let contract_signer: Arc<Signer> =
        Signer::new(Signer::from_secret_key(contract_secret_key)).unwrap();

    let init_args = json!({
        "owner_id": genesis_account_id,
        "treasury_id": treasury_id,
        "asset": asset_id,
        "annual_yield_rate_bps": ANNUAL_YIELD_RATE_BPS,
    });
    println!("Deploying savings contract with init args: {}", init_args);

    let deploy_res = Contract::deploy(contract_id.clone())
        .use_code(wasm_bytes)
        .with_init_call("init", init_args)?
        .with_signer(contract_signer)
        .send_to(network_config)
        .await?;

    ensure_success_status(&deploy_res.status, "Savings deploy/init")?;

    register_with_ft(
        network_config,
        &asset_id,
        &contract_id,
        genesis_account_id,
        genesis_signer,
    )
    .await?;

    println!("Savings contract registered with FT contract for storage");

    Ok((contract_id, asset_id, treasury_id))
}

/// Creates a new user account funded with NEAR.
///
/// # Arguments
///
/// * `user_name` - Name prefix for the account (e.g., "alice" -> "alice.{genesis}")
pub async fn create_user_account(
    network_config: &NetworkConfig,
    genesis_account_id: &AccountId,
    genesis_signer: &Arc<Signer>,
    user_name: &str,
) -> Result<(AccountId, Arc<Signer>), Box<dyn std::error::Error + Send + Sync>> {
    let user_id: AccountId = format!("{}.{}", user_name, genesis_account_id).parse()?;
    let user_secret_key = signer::generate_secret_key()?;
    let user_signer: Arc<Signer> =
        Signer::new(Signer::from_secret_key(user_secret_key.clone())).unwrap();

    Account::create_account(user_id.clone())
        .fund_myself(genesis_account_id.clone(), NearToken::from_near(5))
        .public_key(user_secret_key.public_key())
        .unwrap()
        .with_signer(genesis_signer.clone())
        .send_to(network_config)
        .await?;

    println!("User account created: {}", user_id);

    Ok((user_id, user_signer))
}
