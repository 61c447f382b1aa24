//! Solana transaction assembly and signature manipulation.
//!
//! # Wire Format
//!
//! Solana transactions use a compact binary format:
//! - Signatures (variable length array)
//! - Message (contains instructions, accounts, blockhash)
//!
//! The submitter assembles an unsigned transaction here, signs locally
//! generated keypairs, and round-trips the wire bytes through the wallet
//! extension for the user-facing signature.

use crate::error::TokenStudioError;
use solana_address::Address;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_signature::Signature;
use std::str::FromStr;

/// Re-export the underlying Solana Transaction type.
pub use solana_transaction::Transaction;

/// Assemble an unsigned transaction from an instruction sequence, a fee
/// payer, and a recent blockhash string.
pub fn assemble_unsigned(
    instructions: &[Instruction],
    fee_payer: &str,
    blockhash: &str,
) -> Result<Transaction, TokenStudioError> {
    let fee_payer: Pubkey = fee_payer
        .parse()
        .map_err(|_| TokenStudioError::invalid_address(format!("invalid feePayer: {}", fee_payer)))?;
    let blockhash: Hash = blockhash
        .parse()
        .map_err(|_| TokenStudioError::Network(format!("invalid blockhash: {}", blockhash)))?;

    let message = Message::new_with_blockhash(instructions, Some(&fee_payer), &blockhash);
    Ok(Transaction::new_unsigned(message))
}

/// Extension trait for Transaction to add WASM-friendly methods.
pub trait TransactionExt {
    /// Deserialize a transaction from raw bytes (wire format).
    fn from_bytes(bytes: &[u8]) -> Result<Transaction, TokenStudioError>;

    /// Serialize transaction to bytes (wire format).
    fn to_bytes(&self) -> Result<Vec<u8>, TokenStudioError>;

    /// Get the signable message bytes (what gets signed).
    fn signable_payload(&self) -> Vec<u8>;

    /// Get the number of instructions.
    fn num_instructions(&self) -> usize;

    /// Get the number of signatures.
    fn num_signatures(&self) -> usize;

    /// Get the index of a pubkey in the account keys, if it's a signer.
    fn signer_index(&self, pubkey: &str) -> Option<usize>;

    /// Add a signature for a given public key.
    ///
    /// The pubkey must be one of the required signers in the transaction.
    /// The signature bytes must be exactly 64 bytes (Ed25519 signature).
    fn add_signature(&mut self, pubkey: &str, signature: &[u8]) -> Result<(), TokenStudioError>;

    /// Whether every required signature slot has been filled.
    fn is_fully_signed(&self) -> bool;
}

impl TransactionExt for Transaction {
    fn from_bytes(bytes: &[u8]) -> Result<Transaction, TokenStudioError> {
        bincode::deserialize(bytes).map_err(|e| {
            TokenStudioError::Wallet(format!("failed to deserialize transaction: {}", e))
        })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, TokenStudioError> {
        bincode::serialize(self)
            .map_err(|e| TokenStudioError::Wallet(format!("failed to serialize transaction: {}", e)))
    }

    fn signable_payload(&self) -> Vec<u8> {
        self.message.serialize()
    }

    fn num_instructions(&self) -> usize {
        self.message.instructions.len()
    }

    fn num_signatures(&self) -> usize {
        self.signatures.len()
    }

    fn signer_index(&self, pubkey: &str) -> Option<usize> {
        let target_address = Address::from_str(pubkey).ok()?;
        let num_signers = self.message.header.num_required_signatures as usize;

        // Use the same pattern as Solana's get_signing_keypair_positions
        let signed_keys = &self.message.account_keys[0..num_signers];
        signed_keys.iter().position(|x| *x == target_address)
    }

    fn add_signature(
        &mut self,
        pubkey: &str,
        signature_bytes: &[u8],
    ) -> Result<(), TokenStudioError> {
        // Validate signature length (Ed25519 signature is 64 bytes)
        if signature_bytes.len() != 64 {
            return Err(TokenStudioError::Wallet(format!(
                "invalid signature length: expected 64 bytes, got {}",
                signature_bytes.len()
            )));
        }

        let signer_idx = self
            .signer_index(pubkey)
            .ok_or_else(|| TokenStudioError::Wallet(format!("unknown signer: {}", pubkey)))?;

        let signature = Signature::from(<[u8; 64]>::try_from(signature_bytes).unwrap());

        // Ensure signatures array is properly sized (same as Solana's internal pattern)
        let num_signers = self.message.header.num_required_signatures as usize;
        if self.signatures.len() < num_signers {
            self.signatures.resize(num_signers, Signature::default());
        }

        self.signatures[signer_idx] = signature;

        Ok(())
    }

    fn is_fully_signed(&self) -> bool {
        let num_signers = self.message.header.num_required_signatures as usize;
        self.signatures.len() >= num_signers
            && self.signatures[..num_signers]
                .iter()
                .all(|s| *s != Signature::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;
    use solana_system_interface::instruction as system_ix;

    const FEE_PAYER: &str = "DgT9qyYwYKBRDyDw3EfR12LHQCQjtNrKu2qMsXHuosmB";
    const BLOCKHASH: &str = "GWaQEymC3Z9SHM2gkh8u12xL1zJPMHPCSVR3pSDpEXE4";

    // Test transaction from @solana/web3.js - a simple SOL transfer
    const TEST_TX_BASE64: &str = "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABAAEDFVMqpim7tqEi2XL8R6KKkP0DYJvY3eiRXLlL1P9EjYgXKQC+k0FKnqyC4AZGJR7OhJXfpPP3NHOhS8t/6G7bLAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA/1c7Oaj3RbyLIjU0/ZPpsmVfVUWAzc8g36fK5g6A0JoBAgIAAQwCAAAAoIYBAAAAAAA=";

    fn simple_transfer() -> Transaction {
        let from: Pubkey = FEE_PAYER.parse().unwrap();
        let to: Pubkey = "FKjSjCqByQRwSzZoMXA7bKnDbJe41YgJTHFFzBeC42bH"
            .parse()
            .unwrap();
        let ix = system_ix::transfer(&from, &to, 1_000_000);
        assemble_unsigned(&[ix], FEE_PAYER, BLOCKHASH).unwrap()
    }

    #[test]
    fn test_assemble_unsigned() {
        let tx = simple_transfer();
        assert_eq!(tx.num_instructions(), 1);
        assert_eq!(tx.message.recent_blockhash.to_string(), BLOCKHASH);
        assert_eq!(
            tx.message.account_keys[0].to_string(),
            FEE_PAYER,
            "fee payer must be the first account key"
        );
        assert!(!tx.is_fully_signed());
    }

    #[test]
    fn test_assemble_rejects_bad_inputs() {
        let ix: Vec<Instruction> = vec![];
        assert!(assemble_unsigned(&ix, "garbage", BLOCKHASH).is_err());
        assert!(assemble_unsigned(&ix, FEE_PAYER, "garbage").is_err());
    }

    #[test]
    fn test_wire_roundtrip() {
        let tx = simple_transfer();
        let bytes = tx.to_bytes().unwrap();
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(tx.num_signatures(), tx2.num_signatures());
        assert_eq!(tx.num_instructions(), tx2.num_instructions());
        assert_eq!(tx.message, tx2.message);
    }

    #[test]
    fn test_deserialize_web3js_transaction() {
        let bytes = BASE64_STANDARD.decode(TEST_TX_BASE64).unwrap();
        let tx = Transaction::from_bytes(&bytes).unwrap();
        assert!(tx.num_signatures() > 0);
        assert!(tx.num_instructions() > 0);
    }

    #[test]
    fn test_invalid_transaction_bytes() {
        assert!(Transaction::from_bytes(&[0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_signer_index() {
        let tx = simple_transfer();
        assert_eq!(tx.signer_index(FEE_PAYER), Some(0));
        // Non-signer accounts have no signer index.
        assert_eq!(tx.signer_index("11111111111111111111111111111111"), None);
    }

    #[test]
    fn test_add_signature() {
        let mut tx = simple_transfer();
        let signature = [42u8; 64];

        tx.add_signature(FEE_PAYER, &signature).unwrap();
        assert_eq!(tx.signatures[0].as_ref(), &signature);
        assert!(tx.is_fully_signed());
    }

    #[test]
    fn test_add_signature_invalid_length() {
        let mut tx = simple_transfer();
        assert!(tx.add_signature(FEE_PAYER, &[0u8; 32]).is_err());
    }

    #[test]
    fn test_add_signature_unknown_signer() {
        let mut tx = simple_transfer();
        let result = tx.add_signature("11111111111111111111111111111111", &[0u8; 64]);
        assert!(result.is_err());
    }

    #[test]
    fn test_signable_payload_matches_message() {
        let tx = simple_transfer();
        assert_eq!(tx.signable_payload(), tx.message.serialize());
    }
}
