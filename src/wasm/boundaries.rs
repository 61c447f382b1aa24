//! JS-backed implementations of the three external boundaries.
//!
//! The page injects three plain objects at startup:
//!
//! - a **wallet** facade over the browser extension:
//!   `connect({onlyIfTrusted})`, `disconnect()`,
//!   `signTransaction(Uint8Array) -> Promise<Uint8Array>`,
//!   `signAllTransactions(Uint8Array[]) -> Promise<Uint8Array[]>`
//!   (the page adapts Phantom/Solflare's web3.js types to wire bytes)
//! - an **rpc** facade over the page's connection:
//!   `getBalance`, `accountExists`, `getMinimumBalanceForRentExemption`,
//!   `getLatestBlockhash`, `sendRawTransaction`, `confirmTransaction`,
//!   `getTokenAccountsByOwner`, `getMintSummary`,
//!   `getSignaturesForAddress`, `requestAirdrop`
//! - a **storage** object with the `localStorage` shape:
//!   `getItem`, `setItem`, `removeItem` (usually `window.localStorage` itself)

use js_sys::{Array, Function, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::TokenStudioError;
use crate::rpc::{MintSummary, RpcApi, SignatureSummary, TokenAccountSummary};
use crate::storage::StorageApi;
use crate::transaction::{Transaction, TransactionExt};
use crate::wallet::WalletApi;

/// Human-readable message out of an arbitrary JS throw value.
fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn get_method(target: &JsValue, name: &str) -> Result<Function, String> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
        .ok_or_else(|| format!("injected object has no {} method", name))
}

/// Call `target[name](...args)` and await the result if it is a Promise.
async fn call_async(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, String> {
    let method = get_method(target, name)?;
    let arg_array = Array::new();
    for arg in args {
        arg_array.push(arg);
    }
    let returned = Reflect::apply(&method, target, &arg_array)
        .map_err(|e| format!("{} threw: {}", name, js_error_message(&e)))?;
    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(|e| format!("{} rejected: {}", name, js_error_message(&e)))
}

/// Convert a JS value to its string form, following a `toString` method if
/// it is not already a string (Phantom's `publicKey` is an object).
fn stringify(value: &JsValue) -> Option<String> {
    if let Some(s) = value.as_string() {
        return Some(s);
    }
    let method = Reflect::get(value, &JsValue::from_str("toString"))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    method.call0(value).ok()?.as_string()
}

// =============================================================================
// Wallet
// =============================================================================

/// Wallet extension adapter. Any injected object with the Phantom operation
/// shape (Phantom and Solflare both have it) satisfies the contract.
pub struct JsWallet {
    inner: JsValue,
}

impl JsWallet {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }
}

impl WalletApi for JsWallet {
    async fn connect(&self, only_if_trusted: bool) -> Result<String, TokenStudioError> {
        let options = js_sys::Object::new();
        Reflect::set(
            &options,
            &JsValue::from_str("onlyIfTrusted"),
            &JsValue::from_bool(only_if_trusted),
        )
        .map_err(|_| TokenStudioError::Wallet("failed to build connect options".into()))?;

        let result = call_async(&self.inner, "connect", &[options.into()])
            .await
            .map_err(TokenStudioError::Wallet)?;

        // Either `{ publicKey }` (extension shape) or a bare address string.
        let address = match Reflect::get(&result, &JsValue::from_str("publicKey")) {
            Ok(pk) if !pk.is_undefined() && !pk.is_null() => stringify(&pk),
            _ => stringify(&result),
        };
        address.ok_or_else(|| {
            TokenStudioError::Wallet("connect returned no public key".into())
        })
    }

    async fn disconnect(&self) -> Result<(), TokenStudioError> {
        call_async(&self.inner, "disconnect", &[])
            .await
            .map(|_| ())
            .map_err(TokenStudioError::Wallet)
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, TokenStudioError> {
        let bytes = tx.to_bytes()?;
        let arg = Uint8Array::from(bytes.as_slice());
        let signed = call_async(&self.inner, "signTransaction", &[arg.into()])
            .await
            .map_err(TokenStudioError::Wallet)?;
        let signed_bytes = signed
            .dyn_into::<Uint8Array>()
            .map_err(|_| TokenStudioError::Wallet("signTransaction did not return bytes".into()))?
            .to_vec();
        Transaction::from_bytes(&signed_bytes)
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, TokenStudioError> {
        let array = Array::new();
        for tx in &txs {
            let bytes = tx.to_bytes()?;
            array.push(&Uint8Array::from(bytes.as_slice()));
        }
        let signed = call_async(&self.inner, "signAllTransactions", &[array.into()])
            .await
            .map_err(TokenStudioError::Wallet)?;
        let signed = signed.dyn_into::<Array>().map_err(|_| {
            TokenStudioError::Wallet("signAllTransactions did not return an array".into())
        })?;

        let mut result = Vec::with_capacity(signed.length() as usize);
        for item in signed.iter() {
            let bytes = item
                .dyn_into::<Uint8Array>()
                .map_err(|_| {
                    TokenStudioError::Wallet("signAllTransactions item is not bytes".into())
                })?
                .to_vec();
            result.push(Transaction::from_bytes(&bytes)?);
        }
        Ok(result)
    }
}

// =============================================================================
// RPC
// =============================================================================

/// RPC connection adapter. Transport (HTTP, commitment levels, retries at
/// the SDK layer) stays in the page's facade.
pub struct JsRpc {
    inner: JsValue,
}

impl JsRpc {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }

    async fn call(&self, name: &str, args: &[JsValue]) -> Result<JsValue, TokenStudioError> {
        call_async(&self.inner, name, args)
            .await
            .map_err(TokenStudioError::Network)
    }
}

fn as_u64(value: &JsValue, context: &str) -> Result<u64, TokenStudioError> {
    value
        .as_f64()
        .map(|v| v as u64)
        .ok_or_else(|| TokenStudioError::Network(format!("{} returned a non-number", context)))
}

fn as_string(value: &JsValue, context: &str) -> Result<String, TokenStudioError> {
    value
        .as_string()
        .ok_or_else(|| TokenStudioError::Network(format!("{} returned a non-string", context)))
}

impl RpcApi for JsRpc {
    async fn get_balance(&self, address: &str) -> Result<u64, TokenStudioError> {
        let result = self
            .call("getBalance", &[JsValue::from_str(address)])
            .await?;
        as_u64(&result, "getBalance")
    }

    async fn get_account_exists(&self, address: &str) -> Result<bool, TokenStudioError> {
        let result = self
            .call("accountExists", &[JsValue::from_str(address)])
            .await?;
        Ok(result.is_truthy())
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        space: u64,
    ) -> Result<u64, TokenStudioError> {
        let result = self
            .call(
                "getMinimumBalanceForRentExemption",
                &[JsValue::from_f64(space as f64)],
            )
            .await?;
        as_u64(&result, "getMinimumBalanceForRentExemption")
    }

    async fn get_latest_blockhash(&self) -> Result<String, TokenStudioError> {
        let result = self.call("getLatestBlockhash", &[]).await?;
        as_string(&result, "getLatestBlockhash")
    }

    async fn send_transaction(&self, tx_bytes: &[u8]) -> Result<String, TokenStudioError> {
        let arg = Uint8Array::from(tx_bytes);
        let result = self.call("sendRawTransaction", &[arg.into()]).await?;
        as_string(&result, "sendRawTransaction")
    }

    async fn confirm_transaction(&self, signature: &str) -> Result<(), TokenStudioError> {
        let result = self
            .call("confirmTransaction", &[JsValue::from_str(signature)])
            .await?;
        // The facade resolves with `{ err }` mirroring the cluster's
        // confirmation result; a truthy err means the transaction landed
        // but failed on-chain.
        if let Ok(err) = Reflect::get(&result, &JsValue::from_str("err")) {
            if err.is_truthy() {
                return Err(TokenStudioError::Chain(format!(
                    "transaction {} failed: {}",
                    signature,
                    js_error_message(&err)
                )));
            }
        }
        Ok(())
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<TokenAccountSummary>, TokenStudioError> {
        let result = self
            .call("getTokenAccountsByOwner", &[JsValue::from_str(owner)])
            .await?;
        serde_wasm_bindgen::from_value(result).map_err(|e| {
            TokenStudioError::Network(format!("getTokenAccountsByOwner shape mismatch: {}", e))
        })
    }

    async fn get_mint_summary(&self, mint: &str) -> Result<MintSummary, TokenStudioError> {
        let result = self
            .call("getMintSummary", &[JsValue::from_str(mint)])
            .await?;
        serde_wasm_bindgen::from_value(result)
            .map_err(|e| TokenStudioError::Network(format!("getMintSummary shape mismatch: {}", e)))
    }

    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureSummary>, TokenStudioError> {
        let result = self
            .call(
                "getSignaturesForAddress",
                &[
                    JsValue::from_str(address),
                    JsValue::from_f64(limit as f64),
                ],
            )
            .await?;
        serde_wasm_bindgen::from_value(result).map_err(|e| {
            TokenStudioError::Network(format!("getSignaturesForAddress shape mismatch: {}", e))
        })
    }

    async fn request_airdrop(
        &self,
        address: &str,
        lamports: u64,
    ) -> Result<String, TokenStudioError> {
        let result = self
            .call(
                "requestAirdrop",
                &[
                    JsValue::from_str(address),
                    JsValue::from_f64(lamports as f64),
                ],
            )
            .await?;
        as_string(&result, "requestAirdrop")
    }
}

// =============================================================================
// Storage
// =============================================================================

/// `localStorage`-shaped storage adapter. Calls go through `Reflect` so the
/// injected object keeps its own `this` binding.
pub struct JsStorage {
    inner: JsValue,
}

impl JsStorage {
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }

    fn call1(&self, name: &str, arg: &str) -> Option<JsValue> {
        let method = get_method(&self.inner, name).ok()?;
        method.call1(&self.inner, &JsValue::from_str(arg)).ok()
    }
}

impl StorageApi for JsStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.call1("getItem", key).and_then(|v| v.as_string())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(method) = get_method(&self.inner, "setItem") {
            if method
                .call2(
                    &self.inner,
                    &JsValue::from_str(key),
                    &JsValue::from_str(value),
                )
                .is_err()
            {
                log::warn!("storage setItem failed for key {}", key);
            }
        }
    }

    fn remove(&self, key: &str) {
        if self.call1("removeItem", key).is_none() {
            log::warn!("storage removeItem failed for key {}", key);
        }
    }
}
