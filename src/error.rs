use thiserror::Error;
use wasm_bindgen::prelude::*;

/// Errors surfaced by token-studio operations.
///
/// Every operation boundary (create/mint/transfer/connect/airdrop) catches
/// these and turns them into a user-facing message; nothing is retried and
/// nothing is fatal to the session.
#[derive(Debug, Clone, Error)]
pub enum TokenStudioError {
    /// Malformed form input, rejected before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation references a mint that is not in the session's token list.
    #[error("unknown token: {0}")]
    UnknownToken(String),

    /// Recipient (or other address field) failed base58 decoding.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Extension absent, connection rejected, or signing rejected.
    #[error("wallet error: {0}")]
    Wallet(String),

    /// RPC call failed or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// Transaction rejected or failed on-chain.
    #[error("chain error: {0}")]
    Chain(String),

    /// Another operation on the same mint is still awaiting confirmation.
    #[error("operation already in flight for token {0}")]
    TokenBusy(String),
}

impl TokenStudioError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TokenStudioError::Validation(msg.into())
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        TokenStudioError::InvalidAddress(msg.into())
    }
}

// Required for wasm_bindgen to convert errors to JavaScript exceptions
// Uses js_sys::Error to create a proper JavaScript Error with stack trace
impl From<TokenStudioError> for JsValue {
    fn from(err: TokenStudioError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
