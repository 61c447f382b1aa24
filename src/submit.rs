//! Transaction submission.
//!
//! One call, one on-chain transaction: attach a recent blockhash and the
//! fee payer, sign with any locally generated keypairs, hand the result to
//! the wallet for the user's signature, broadcast, and wait for the
//! cluster's verdict. Nothing here retries; a failed broadcast or
//! confirmation surfaces to the caller as-is.

use crate::error::TokenStudioError;
use crate::intent::{GeneratedKeypair, IntentPlan};
use crate::keypair::{Keypair, KeypairExt};
use crate::rpc::RpcApi;
use crate::transaction::{assemble_unsigned, TransactionExt};
use crate::wallet::WalletApi;

use solana_signer::Signer;

/// Sign, broadcast, and confirm an intent plan. Returns the transaction
/// signature on success.
pub async fn submit<R: RpcApi, W: WalletApi>(
    rpc: &R,
    wallet: &W,
    fee_payer: &str,
    plan: &IntentPlan,
) -> Result<String, TokenStudioError> {
    let blockhash = rpc.get_latest_blockhash().await?;
    let mut tx = assemble_unsigned(&plan.instructions, fee_payer, &blockhash)?;

    // Generated keypairs (the mint account) sign before the wallet does:
    // the wallet round-trips wire bytes and hands back the same signature
    // slots with its own filled in.
    for generated in &plan.generated_keypairs {
        sign_with_generated(&mut tx, generated)?;
    }

    let tx = wallet.sign_transaction(tx).await?;
    if !tx.is_fully_signed() {
        return Err(TokenStudioError::Wallet(
            "wallet returned a transaction with unsigned slots".into(),
        ));
    }

    let tx_bytes = tx.to_bytes()?;
    let signature = rpc.send_transaction(&tx_bytes).await?;
    rpc.confirm_transaction(&signature).await?;
    log::debug!("transaction {} confirmed", signature);

    Ok(signature)
}

fn sign_with_generated(
    tx: &mut crate::transaction::Transaction,
    generated: &GeneratedKeypair,
) -> Result<(), TokenStudioError> {
    let secret_bytes: Vec<u8> = solana_sdk::bs58::decode(&generated.secret_key)
        .into_vec()
        .map_err(|e| TokenStudioError::Wallet(format!("failed to decode secret key: {}", e)))?;
    let keypair = Keypair::from_secret_key_bytes(&secret_bytes)?;

    let address = keypair.address();
    if tx.signer_index(&address).is_some() {
        let msg_bytes = tx.signable_payload();
        let sig = keypair.sign_message(&msg_bytes);
        tx.add_signature(&address, sig.as_ref())?;
    }
    Ok(())
}
