//! Wallet extension boundary.
//!
//! The browser extension (Phantom, Solflare, ...) holds the user's key and
//! performs every user-facing signature. This trait is the fixed interface
//! the rest of the crate programs against; `wasm::boundaries::JsWallet`
//! adapts the injected extension object, and tests use an in-memory signer.

use crate::error::TokenStudioError;
use crate::transaction::Transaction;

/// The exact operation set the session needs from a wallet extension.
///
/// All methods are asynchronous: signing suspends until the user acts in
/// the extension UI and may fail with a rejection.
#[allow(async_fn_in_trait)]
pub trait WalletApi {
    /// Hand-shake with the extension. With `only_if_trusted`, succeeds only
    /// when the site was previously authorized (silent auto-reconnect).
    /// Returns the wallet address (base58).
    async fn connect(&self, only_if_trusted: bool) -> Result<String, TokenStudioError>;

    async fn disconnect(&self) -> Result<(), TokenStudioError>;

    /// Ask the user to sign. The returned transaction carries the wallet's
    /// signature in its slot; locally added signatures are preserved.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, TokenStudioError>;

    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, TokenStudioError>;
}
