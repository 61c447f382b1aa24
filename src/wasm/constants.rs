//! Program ID constants exported via WASM.
//!
//! These constants allow JavaScript code to reference well-known Solana
//! program IDs without needing to import @solana/web3.js.

use wasm_bindgen::prelude::*;

use crate::intent::{
    derive_holding_account, MINT_ACCOUNT_SPACE, SPL_ATA_PROGRAM_ID, SPL_TOKEN_PROGRAM_ID,
    SYSTEM_PROGRAM_ID,
};

/// System Program ID
#[wasm_bindgen]
pub fn system_program_id() -> String {
    SYSTEM_PROGRAM_ID.to_string()
}

/// Token Program ID (SPL Token)
#[wasm_bindgen]
pub fn token_program_id() -> String {
    SPL_TOKEN_PROGRAM_ID.to_string()
}

/// Associated Token Account Program ID
#[wasm_bindgen]
pub fn ata_program_id() -> String {
    SPL_ATA_PROGRAM_ID.to_string()
}

/// Mint account space in bytes (82)
#[wasm_bindgen]
pub fn mint_account_space() -> u64 {
    MINT_ACCOUNT_SPACE
}

/// Derive the associated holding account for a given wallet and mint.
///
/// This allows JavaScript code to compute ATA addresses without needing
/// @solana/spl-token.
#[wasm_bindgen]
pub fn get_associated_token_address(
    wallet_address: &str,
    mint_address: &str,
) -> Result<String, JsValue> {
    use solana_sdk::pubkey::Pubkey;

    let wallet: Pubkey = wallet_address
        .parse()
        .map_err(|_| JsValue::from_str(&format!("Invalid wallet address: {}", wallet_address)))?;
    let mint: Pubkey = mint_address
        .parse()
        .map_err(|_| JsValue::from_str(&format!("Invalid mint address: {}", mint_address)))?;

    Ok(derive_holding_account(&wallet, &mint).to_string())
}
