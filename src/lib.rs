//! wasm-token-studio: the WASM core of a browser SPL-token studio.
//!
//! This crate owns everything between a submitted form and a confirmed
//! transaction on the test network: input validation, intent-to-instruction
//! assembly, signing and broadcast through the injected wallet extension and
//! RPC facade, the wallet connection lifecycle, and a localStorage-backed
//! mirror of tokens and transaction history. The JavaScript page owns only
//! rendering.
//!
//! # Architecture
//!
//! The crate follows a two-layer architecture:
//!
//! 1. **Core modules** (`validate`, `intent`, `submit`, `ledger`, `session`,
//!    ...) - pure/portable Rust against the `WalletApi`/`RpcApi`/`StorageApi`
//!    boundary traits, unit-tested natively
//! 2. **WASM bindings** (`wasm/`) - thin wrappers that expose the core to
//!    JavaScript and adapt the page's injected wallet/RPC/storage objects
//!
//! # Usage from Rust
//!
//! ```rust,ignore
//! use wasm_token_studio::{SessionController, CreateTokenIntent};
//!
//! let session = SessionController::new(wallet, rpc, storage);
//! session.connect().await;
//! session.create_token(CreateTokenIntent {
//!     name: "Test".into(),
//!     symbol: "tst".into(),
//!     decimals: 2,
//!     supply: "100".into(),
//! }).await;
//! ```

mod error;
pub mod intent;
pub mod keypair;
pub mod ledger;
pub mod pubkey;
pub mod rpc;
pub mod session;
pub mod storage;
pub mod submit;
mod time;
pub mod transaction;
pub mod validate;
pub mod wallet;
pub mod wasm;

// Re-export core types at crate root
pub use error::TokenStudioError;
pub use intent::{
    BuildParams, CreateTokenIntent, GeneratedKeypair, IntentPlan, MintTokensIntent, TokenIntent,
    TransferTokensIntent,
};
pub use keypair::{Keypair, KeypairExt};
pub use ledger::{LedgerMirror, TokenRecord, TransactionRecord, TxKind, TxStatus};
pub use pubkey::{Pubkey, PubkeyExt};
pub use rpc::RpcApi;
pub use session::{SessionController, SessionPhase, SessionSnapshot};
pub use storage::StorageApi;
pub use transaction::{Transaction, TransactionExt};
pub use wallet::WalletApi;

// Re-export WASM types
pub use wasm::{JsRpc, JsStorage, JsWallet, TokenStudio};
