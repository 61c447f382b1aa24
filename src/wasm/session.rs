//! WASM bindings for the session controller.
//!
//! Methods return `js_sys::Promise` built from a cloned handle rather than
//! borrowing `self` across the await, so operations triggered from distinct
//! UI actions run concurrently — a hung confirmation wait never blocks the
//! next click.

use std::rc::Rc;

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::intent::{CreateTokenIntent, MintTokensIntent, TransferTokensIntent};
use crate::session::SessionController;

use super::boundaries::{JsRpc, JsStorage, JsWallet};

type Controller = SessionController<JsWallet, JsRpc, JsStorage>;

/// The application core handed to the page.
///
/// # Example
///
/// ```javascript
/// const studio = new TokenStudio(walletFacade, rpcFacade, window.localStorage);
/// await studio.try_reconnect();
/// render(await studio.connect());
/// render(await studio.create_token({ name: 'Test', symbol: 'tst', decimals: 2, supply: '100' }));
/// ```
#[wasm_bindgen]
pub struct TokenStudio {
    inner: Rc<Controller>,
}

fn snapshot_js(controller: &Controller) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&controller.snapshot())
        .map_err(|e| js_sys::Error::new(&format!("failed to serialize snapshot: {}", e)).into())
}

impl TokenStudio {
    /// Run an operation on a cloned handle and resolve with the resulting
    /// snapshot.
    fn run<F, Fut>(&self, op: F) -> Promise
    where
        F: FnOnce(Rc<Controller>) -> Fut + 'static,
        Fut: std::future::Future<Output = ()> + 'static,
    {
        let inner = self.inner.clone();
        future_to_promise(async move {
            op(inner.clone()).await;
            snapshot_js(&inner)
        })
    }
}

#[wasm_bindgen]
impl TokenStudio {
    /// Wire the core to the page's wallet facade, RPC facade, and storage
    /// (see `wasm::boundaries` for the expected object shapes).
    #[wasm_bindgen(constructor)]
    pub fn new(wallet: JsValue, rpc: JsValue, storage: JsValue) -> TokenStudio {
        TokenStudio {
            inner: Rc::new(SessionController::new(
                JsWallet::new(wallet),
                JsRpc::new(rpc),
                JsStorage::new(storage),
            )),
        }
    }

    /// Current session state as a plain object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        snapshot_js(&self.inner)
    }

    /// Explicit connect request. Resolves with the post-connect snapshot;
    /// failures land in the snapshot's `error` field.
    pub fn connect(&self) -> Promise {
        self.run(|inner| async move { inner.connect().await })
    }

    /// Silent startup reconnect, gated on the previous session's flag.
    pub fn try_reconnect(&self) -> Promise {
        self.run(|inner| async move { inner.try_reconnect().await })
    }

    pub fn disconnect(&self) -> Promise {
        self.run(|inner| async move { inner.disconnect().await })
    }

    /// Re-derive balance, token list, and recent activity from the chain.
    pub fn refresh(&self) -> Promise {
        self.run(|inner| async move { inner.refresh().await })
    }

    /// Create a token from `{ name, symbol, decimals, supply }`.
    pub fn create_token(&self, form: JsValue) -> Promise {
        let form: CreateTokenIntent = match serde_wasm_bindgen::from_value(form) {
            Ok(form) => form,
            Err(e) => return reject_bad_form("create", &e),
        };
        self.run(|inner| async move { inner.create_token(form).await })
    }

    /// Mint supply from `{ tokenMint, amount }`.
    pub fn mint_tokens(&self, form: JsValue) -> Promise {
        let form: MintTokensIntent = match serde_wasm_bindgen::from_value(form) {
            Ok(form) => form,
            Err(e) => return reject_bad_form("mint", &e),
        };
        self.run(|inner| async move { inner.mint_tokens(form).await })
    }

    /// Transfer from `{ tokenMint, recipient, amount }`.
    pub fn transfer_tokens(&self, form: JsValue) -> Promise {
        let form: TransferTokensIntent = match serde_wasm_bindgen::from_value(form) {
            Ok(form) => form,
            Err(e) => return reject_bad_form("transfer", &e),
        };
        self.run(|inner| async move { inner.transfer_tokens(form).await })
    }

    /// Request 1 SOL from the devnet faucet.
    pub fn request_airdrop(&self) -> Promise {
        self.run(|inner| async move { inner.request_airdrop().await })
    }

    /// Dismiss the transient success/error banners.
    pub fn clear_messages(&self) {
        self.inner.clear_messages();
    }
}

fn reject_bad_form(operation: &str, error: &serde_wasm_bindgen::Error) -> Promise {
    Promise::reject(
        &js_sys::Error::new(&format!("malformed {} form: {}", operation, error)).into(),
    )
}
