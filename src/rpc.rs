//! RPC client boundary.
//!
//! Network transport is delegated to the page's connection facade (the
//! external RPC client); this trait is the query surface the session and
//! submitter need. `wasm::boundaries::JsRpc` adapts the injected facade,
//! tests use a scripted mock.
//!
//! Every method is a single network round trip and may fail; failures map
//! to `TokenStudioError::Network` except where a confirmed-on-chain
//! failure maps to `TokenStudioError::Chain`.

use serde::{Deserialize, Serialize};

use crate::error::TokenStudioError;

/// One token holding discovered by scanning the wallet's accounts under
/// the token program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountSummary {
    pub mint: String,
    /// Holding in base units.
    pub balance_base_units: u64,
    pub decimals: u8,
    pub owner: String,
}

/// Mint metadata as reported by the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintSummary {
    /// Total supply in base units.
    pub supply_base_units: u64,
    pub decimals: u8,
    #[serde(default)]
    pub mint_authority: Option<String>,
    #[serde(default)]
    pub freeze_authority: Option<String>,
    pub is_initialized: bool,
}

/// One entry of the wallet's recent signature history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSummary {
    pub signature: String,
    /// Whether the transaction failed on-chain.
    #[serde(default)]
    pub err: bool,
    /// Unix seconds, when the cluster reports it.
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// The query/broadcast surface of the external RPC client.
#[allow(async_fn_in_trait)]
pub trait RpcApi {
    /// SOL balance in lamports.
    async fn get_balance(&self, address: &str) -> Result<u64, TokenStudioError>;

    /// Whether an account exists on-chain (used for recipient holding
    /// accounts before a transfer).
    async fn get_account_exists(&self, address: &str) -> Result<bool, TokenStudioError>;

    /// Rent-exempt minimum for an account of `space` bytes, from current
    /// network rent parameters.
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        space: u64,
    ) -> Result<u64, TokenStudioError>;

    /// A recent blockhash (the short-lived checkpoint id every transaction
    /// must carry).
    async fn get_latest_blockhash(&self) -> Result<String, TokenStudioError>;

    /// Broadcast wire-format transaction bytes. Returns the signature.
    async fn send_transaction(&self, tx_bytes: &[u8]) -> Result<String, TokenStudioError>;

    /// Block until the cluster confirms or rejects the signature.
    /// On-chain rejection is `Err(Chain)`.
    async fn confirm_transaction(&self, signature: &str) -> Result<(), TokenStudioError>;

    /// All token holdings owned by `owner` under the token program.
    async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<TokenAccountSummary>, TokenStudioError>;

    async fn get_mint_summary(&self, mint: &str) -> Result<MintSummary, TokenStudioError>;

    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureSummary>, TokenStudioError>;

    /// Devnet faucet request. Returns the airdrop signature.
    async fn request_airdrop(
        &self,
        address: &str,
        lamports: u64,
    ) -> Result<String, TokenStudioError>;
}
