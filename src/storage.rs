//! Persistent key-value storage boundary.
//!
//! The browser build is backed by `window.localStorage` (see
//! `wasm::boundaries`); tests use [`MemoryStorage`]. Storage is synchronous
//! and best-effort: a failed write is logged and dropped, because both
//! persisted lists are advisory caches of chain state, never the source of
//! truth.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Key under which the previous-session connect flag is stored. Gates
/// auto-reconnect only.
pub const WALLET_CONNECTED_KEY: &str = "walletConnected";

/// Storage key for the token list of one wallet address.
pub fn tokens_key(address: &str) -> String {
    format!("tokens_{}", address)
}

/// Storage key for the transaction list of one wallet address.
pub fn transactions_key(address: &str) -> String {
    format!("transactions_{}", address)
}

/// Minimal synchronous key-value store, the shape of `localStorage`.
pub trait StorageApi {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage for native tests. Clones share the same map so a
/// controller and a test can observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageApi for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}
