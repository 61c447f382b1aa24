//! Solana public key (address) implementation.
//!
//! Wraps `solana_pubkey::Pubkey` for WASM compatibility.

use crate::error::TokenStudioError;
use std::str::FromStr;

/// Re-export the underlying Solana Pubkey type.
pub use solana_pubkey::Pubkey;

/// Extension trait for Pubkey to add WASM-friendly error handling.
pub trait PubkeyExt {
    fn from_base58(address: &str) -> Result<Pubkey, TokenStudioError>;
}

impl PubkeyExt for Pubkey {
    /// Create a Pubkey from a base58 string.
    fn from_base58(address: &str) -> Result<Pubkey, TokenStudioError> {
        Pubkey::from_str(address)
            .map_err(|e| TokenStudioError::invalid_address(format!("{}: {}", address, e)))
    }
}
