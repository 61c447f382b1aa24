//! Ed25519 keypair implementation for Solana.
//!
//! Wraps `solana_keypair::Keypair` for WASM compatibility. The only keypairs
//! this crate ever generates are throwaway mint-account co-signers; the
//! user's own key never leaves the wallet extension.

use crate::error::TokenStudioError;
use solana_signer::Signer;

/// Re-export the underlying Solana Keypair type.
pub use solana_keypair::Keypair;

/// Extension trait for Keypair to add WASM-friendly methods.
pub trait KeypairExt {
    fn from_secret_key_bytes(secret_key: &[u8]) -> Result<Keypair, TokenStudioError>;
    fn public_key_bytes(&self) -> [u8; 32];
    fn secret_key_bytes(&self) -> [u8; 32];
    fn address(&self) -> String;
}

impl KeypairExt for Keypair {
    /// Create a keypair from a 32-byte secret key (Ed25519 seed).
    fn from_secret_key_bytes(secret_key: &[u8]) -> Result<Keypair, TokenStudioError> {
        let bytes: [u8; 32] = secret_key.try_into().map_err(|_| {
            TokenStudioError::Wallet(format!(
                "secret key must be 32 bytes, got {}",
                secret_key.len()
            ))
        })?;

        // Use official solana-keypair method that handles 32-byte seeds
        Ok(Keypair::new_from_array(bytes))
    }

    /// Get the public key bytes (32 bytes).
    fn public_key_bytes(&self) -> [u8; 32] {
        self.pubkey().to_bytes()
    }

    /// Get the secret key bytes (32 bytes, the seed only).
    fn secret_key_bytes(&self) -> [u8; 32] {
        let bytes = self.to_bytes();
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&bytes[..32]);
        secret
    }

    /// Get the Solana address (base58-encoded public key).
    fn address(&self) -> String {
        self.pubkey().to_string()
    }
}
