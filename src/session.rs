//! Session controller: wallet connectivity and the token operations.
//!
//! Owns the single application state. Every mutation funnels through the
//! operations here; consumers (the page) only ever see value snapshots.
//! Errors from any operation become a transient user-facing message and
//! never take the session down.
//!
//! The controller is single-threaded (browser event loop). State lives in
//! `RefCell`s; borrows are scoped so they never span an await point, which
//! lets operations triggered from distinct UI actions interleave. Two
//! operations on the *same* mint are refused rather than interleaved: the
//! second fails fast with `TokenBusy` while the first is awaiting
//! confirmation, so the mirrored balance cannot drift.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde::Serialize;

use crate::error::TokenStudioError;
use crate::intent::{
    self, BuildParams, CreateTokenIntent, MintTokensIntent, TransferTokensIntent,
    MINT_ACCOUNT_SPACE,
};
use crate::ledger::{LedgerMirror, TokenRecord, TransactionRecord, TxKind, TxStatus};
use crate::rpc::RpcApi;
use crate::storage::{StorageApi, WALLET_CONNECTED_KEY};
use crate::submit::submit;
use crate::time::now_ms;
use crate::validate;
use crate::wallet::WalletApi;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const SOL_DECIMALS: u8 = 9;

/// Below this SOL balance, a create operation tops the wallet up from the
/// devnet faucet first.
const LOW_BALANCE_LAMPORTS: u64 = LAMPORTS_PER_SOL / 10;
const AIRDROP_LAMPORTS: u64 = LAMPORTS_PER_SOL;
const SIGNATURE_SCAN_LIMIT: usize = 20;

// Indicative flat fees stamped on transaction records.
const CREATE_FEE_LAMPORTS: u64 = 2_000_000;
const MINT_FEE_LAMPORTS: u64 = 1_000_000;
const TRANSFER_FEE_LAMPORTS: u64 = 1_000_000;
const HISTORY_FEE_LAMPORTS: u64 = 5_000;

/// Wallet connectivity phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
    /// Connected, with a state refresh in progress.
    Refreshing,
}

impl SessionPhase {
    pub fn is_connected(self) -> bool {
        matches!(self, SessionPhase::Connected | SessionPhase::Refreshing)
    }
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    wallet_address: Option<String>,
    lamports: u64,
    busy: bool,
    error: String,
    success: String,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Disconnected,
            wallet_address: None,
            lamports: 0,
            busy: false,
            error: String::new(),
            success: String::new(),
        }
    }
}

/// Read-only copy of the session for the page to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub connected: bool,
    pub wallet_address: Option<String>,
    pub lamports: u64,
    /// SOL balance as a display string, e.g. `"1.500000000"`.
    pub sol_balance: String,
    pub tokens: Vec<TokenRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub busy: bool,
    pub error: String,
    pub success: String,
}

/// Removes its mint from the in-flight set when the operation ends,
/// however it ends.
struct TokenOpGuard {
    in_flight: Rc<RefCell<HashSet<String>>>,
    mint: String,
}

impl TokenOpGuard {
    fn acquire(
        in_flight: &Rc<RefCell<HashSet<String>>>,
        mint: &str,
    ) -> Result<Self, TokenStudioError> {
        if !in_flight.borrow_mut().insert(mint.to_string()) {
            return Err(TokenStudioError::TokenBusy(mint.to_string()));
        }
        Ok(Self {
            in_flight: in_flight.clone(),
            mint: mint.to_string(),
        })
    }
}

impl Drop for TokenOpGuard {
    fn drop(&mut self) {
        self.in_flight.borrow_mut().remove(&self.mint);
    }
}

/// The session controller. Generic over the three external boundaries so
/// the browser build wires JS-backed implementations and tests wire mocks.
pub struct SessionController<W: WalletApi, R: RpcApi, S: StorageApi> {
    wallet: W,
    rpc: R,
    storage: S,
    state: RefCell<SessionState>,
    ledger: RefCell<LedgerMirror>,
    in_flight: Rc<RefCell<HashSet<String>>>,
}

impl<W: WalletApi, R: RpcApi, S: StorageApi> SessionController<W, R, S> {
    pub fn new(wallet: W, rpc: R, storage: S) -> Self {
        Self {
            wallet,
            rpc,
            storage,
            state: RefCell::new(SessionState::new()),
            ledger: RefCell::new(LedgerMirror::new()),
            in_flight: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.borrow();
        let ledger = self.ledger.borrow();
        SessionSnapshot {
            phase: state.phase,
            connected: state.phase.is_connected(),
            wallet_address: state.wallet_address.clone(),
            lamports: state.lamports,
            sol_balance: validate::format_base_units(state.lamports, SOL_DECIMALS),
            tokens: ledger.tokens().to_vec(),
            transactions: ledger.transactions().to_vec(),
            busy: state.busy,
            error: state.error.clone(),
            success: state.success.clone(),
        }
    }

    pub fn clear_messages(&self) {
        let mut state = self.state.borrow_mut();
        state.error.clear();
        state.success.clear();
    }

    // ---------------------------------------------------------------------
    // Connection lifecycle
    // ---------------------------------------------------------------------

    /// Explicit connect request from the page.
    pub async fn connect(&self) {
        self.begin_op();
        self.state.borrow_mut().phase = SessionPhase::Connecting;

        let result = self.connect_inner(false).await;
        match &result {
            Ok(address) => log::info!("wallet connected: {}", address),
            Err(e) => log::warn!("wallet connect failed: {}", e),
        }
        self.finish_op(result.map(|_| "Wallet connected successfully!".to_string()));
    }

    /// Startup auto-reconnect: silent, and only attempted when the previous
    /// session left the connected flag behind and the extension still
    /// trusts this site.
    pub async fn try_reconnect(&self) {
        if self.storage.get(WALLET_CONNECTED_KEY).as_deref() != Some("true") {
            return;
        }
        self.state.borrow_mut().phase = SessionPhase::Connecting;
        match self.connect_inner(true).await {
            Ok(address) => log::info!("wallet auto-reconnected: {}", address),
            // Silent fail: no error banner on page load.
            Err(e) => log::debug!("auto-reconnect skipped: {}", e),
        }
    }

    async fn connect_inner(&self, only_if_trusted: bool) -> Result<String, TokenStudioError> {
        let address = match self.wallet.connect(only_if_trusted).await {
            Ok(address) => address,
            Err(e) => {
                self.state.borrow_mut().phase = SessionPhase::Disconnected;
                return Err(e);
            }
        };

        self.storage.set(WALLET_CONNECTED_KEY, "true");
        {
            let mut state = self.state.borrow_mut();
            state.phase = SessionPhase::Connected;
            state.wallet_address = Some(address.clone());
        }
        *self.ledger.borrow_mut() = LedgerMirror::load(&self.storage, &address);

        // Populate fresh chain state; cached lists already cover a failure.
        if let Err(e) = self.refresh_inner(&address).await {
            log::warn!("initial refresh failed: {}", e);
        }

        Ok(address)
    }

    /// Explicit disconnect. In-memory state is dropped; the persisted
    /// caches stay on disk keyed by address for the next reconnect.
    pub async fn disconnect(&self) {
        if !self.state.borrow().phase.is_connected() {
            return;
        }
        let result = self.wallet.disconnect().await;

        {
            let mut state = self.state.borrow_mut();
            state.phase = SessionPhase::Disconnected;
            state.wallet_address = None;
            state.lamports = 0;
        }
        self.ledger.borrow_mut().clear();
        self.storage.remove(WALLET_CONNECTED_KEY);

        let mut state = self.state.borrow_mut();
        match result {
            Ok(()) => state.success = "Wallet disconnected successfully!".to_string(),
            Err(e) => {
                log::warn!("extension disconnect failed: {}", e);
                state.error = "Failed to disconnect wallet".to_string();
            }
        }
    }

    /// Manual refresh of balance, token list, and recent activity.
    pub async fn refresh(&self) {
        let Some(address) = self.require_connected().ok() else {
            return;
        };
        self.state.borrow_mut().phase = SessionPhase::Refreshing;
        if let Err(e) = self.refresh_inner(&address).await {
            log::warn!("refresh failed: {}", e);
            self.state.borrow_mut().error = e.to_string();
        }
        self.state.borrow_mut().phase = SessionPhase::Connected;
    }

    /// Re-derive session state from the chain: SOL balance, a token-account
    /// scan under the token program, and the recent signature history.
    async fn refresh_inner(&self, address: &str) -> Result<(), TokenStudioError> {
        let lamports = self.rpc.get_balance(address).await?;
        self.state.borrow_mut().lamports = lamports;

        let accounts = self.rpc.get_token_accounts_by_owner(address).await?;
        let mut tokens: Vec<TokenRecord> = Vec::new();
        for account in accounts.iter().filter(|a| a.balance_base_units > 0) {
            let known = self.ledger.borrow().token(&account.mint).cloned();
            let summary = match self.rpc.get_mint_summary(&account.mint).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    log::warn!("mint info fetch failed for {}: {}", account.mint, e);
                    None
                }
            };
            if summary.is_none() && known.is_none() {
                continue;
            }

            // Mints created here keep their user-supplied symbol and name;
            // unknown mints get placeholder labels.
            let (symbol, name) = match &known {
                Some(token) => (token.symbol.clone(), token.name.clone()),
                None => (
                    format!("TOKEN{}", tokens.len() + 1),
                    format!("Custom Token {}", tokens.len() + 1),
                ),
            };
            tokens.push(TokenRecord {
                mint: account.mint.clone(),
                symbol,
                name,
                decimals: account.decimals,
                balance_base_units: account.balance_base_units,
                supply_base_units: summary
                    .as_ref()
                    .map(|s| s.supply_base_units)
                    .or(known.as_ref().and_then(|t| t.supply_base_units)),
                owner: address.to_string(),
                mint_authority: summary
                    .as_ref()
                    .and_then(|s| s.mint_authority.clone())
                    .or(known.as_ref().and_then(|t| t.mint_authority.clone())),
                freeze_authority: summary
                    .as_ref()
                    .and_then(|s| s.freeze_authority.clone())
                    .or(known.as_ref().and_then(|t| t.freeze_authority.clone())),
                is_initialized: summary
                    .as_ref()
                    .map(|s| s.is_initialized)
                    .or(known.as_ref().map(|t| t.is_initialized))
                    .unwrap_or(true),
            });
        }
        // Tokens the mirror knows but the scan no longer shows (balance
        // spent to zero) stay listed at zero rather than vanishing.
        {
            let ledger = self.ledger.borrow();
            for token in ledger.tokens() {
                if !tokens.iter().any(|t| t.mint == token.mint) {
                    let mut token = token.clone();
                    token.balance_base_units = 0;
                    tokens.push(token);
                }
            }
        }
        self.ledger
            .borrow_mut()
            .set_tokens(&self.storage, address, tokens);

        let history = self
            .rpc
            .get_signatures_for_address(address, SIGNATURE_SCAN_LIMIT)
            .await?;
        let mut ledger = self.ledger.borrow_mut();
        for entry in &history {
            let status = if entry.err {
                TxStatus::Failed
            } else {
                TxStatus::Confirmed
            };
            if ledger.transaction(&entry.signature).is_some() {
                ledger.update_transaction_status(&self.storage, address, &entry.signature, status);
            } else {
                ledger.append_transaction(
                    &self.storage,
                    address,
                    TransactionRecord {
                        signature: entry.signature.clone(),
                        kind: TxKind::Transfer,
                        status,
                        timestamp_ms: entry
                            .block_time
                            .map(|t| t as u64 * 1000)
                            .unwrap_or_else(now_ms),
                        amount_base_units: None,
                        token: None,
                        recipient: None,
                        fee_lamports: Some(HISTORY_FEE_LAMPORTS),
                        block_time: entry.block_time,
                    },
                );
            }
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Token operations
    // ---------------------------------------------------------------------

    /// Create a new token and mint its initial supply.
    pub async fn create_token(&self, form: CreateTokenIntent) {
        self.begin_op();
        let result = self.create_token_inner(form).await;
        self.finish_op(result);
    }

    async fn create_token_inner(
        &self,
        form: CreateTokenIntent,
    ) -> Result<String, TokenStudioError> {
        let address = self.require_connected()?;

        let name = validate::validate_name(&form.name)?;
        let symbol = validate::normalize_symbol(&form.symbol)?;
        let decimals = validate::validate_decimals(form.decimals)?;
        let supply_base_units = validate::parse_amount(form.supply.as_str(), decimals)?;

        // Test-network convenience: top up from the faucet when the wallet
        // cannot cover rent + fees.
        if self.state.borrow().lamports < LOW_BALANCE_LAMPORTS {
            log::info!("balance below {} lamports, requesting airdrop", LOW_BALANCE_LAMPORTS);
            let signature = self.rpc.request_airdrop(&address, AIRDROP_LAMPORTS).await?;
            self.rpc.confirm_transaction(&signature).await?;
            let lamports = self.rpc.get_balance(&address).await?;
            self.state.borrow_mut().lamports = lamports;
        }

        let mint_rent_lamports = self
            .rpc
            .get_minimum_balance_for_rent_exemption(MINT_ACCOUNT_SPACE)
            .await?;
        let params = BuildParams {
            fee_payer: address.clone(),
            mint_rent_lamports,
            recipient_account_exists: false,
        };
        let plan = intent::build_create_token(&form, &params)?;
        let mint_address = plan.generated_keypairs[0].address.clone();

        let signature = submit(&self.rpc, &self.wallet, &address, &plan).await?;

        let mut ledger = self.ledger.borrow_mut();
        ledger.record_token(
            &self.storage,
            &address,
            TokenRecord {
                mint: mint_address,
                symbol: symbol.clone(),
                name,
                decimals,
                balance_base_units: supply_base_units,
                supply_base_units: Some(supply_base_units),
                owner: address.clone(),
                mint_authority: Some(address.clone()),
                freeze_authority: Some(address.clone()),
                is_initialized: true,
            },
        );
        ledger.record_transaction(
            &self.storage,
            &address,
            TransactionRecord {
                signature,
                kind: TxKind::Create,
                status: TxStatus::Confirmed,
                timestamp_ms: now_ms(),
                amount_base_units: Some(supply_base_units),
                token: Some(symbol.clone()),
                recipient: None,
                fee_lamports: Some(CREATE_FEE_LAMPORTS),
                block_time: None,
            },
        );

        Ok(format!("Token \"{}\" created successfully!", symbol))
    }

    /// Mint additional supply of a known token.
    pub async fn mint_tokens(&self, form: MintTokensIntent) {
        self.begin_op();
        let result = self.mint_tokens_inner(form).await;
        self.finish_op(result);
    }

    async fn mint_tokens_inner(&self, form: MintTokensIntent) -> Result<String, TokenStudioError> {
        let address = self.require_connected()?;
        let _guard = TokenOpGuard::acquire(&self.in_flight, &form.token_mint)?;

        let token = self
            .ledger
            .borrow()
            .token(&form.token_mint)
            .cloned()
            .ok_or_else(|| TokenStudioError::UnknownToken(form.token_mint.clone()))?;
        let amount_base_units =
            validate::parse_positive_amount(form.amount.as_str(), token.decimals)?;

        let params = BuildParams {
            fee_payer: address.clone(),
            mint_rent_lamports: 0,
            recipient_account_exists: false,
        };
        let tokens = self.ledger.borrow().tokens().to_vec();
        let plan = intent::build_mint_tokens(&form, &tokens, &params)?;

        let signature = submit(&self.rpc, &self.wallet, &address, &plan).await?;

        // Apply the delta to the mirror's current record, not the snapshot
        // read before submission.
        let mut ledger = self.ledger.borrow_mut();
        ledger.credit(&self.storage, &address, &form.token_mint, amount_base_units);
        ledger.record_transaction(
            &self.storage,
            &address,
            TransactionRecord {
                signature,
                kind: TxKind::Mint,
                status: TxStatus::Confirmed,
                timestamp_ms: now_ms(),
                amount_base_units: Some(amount_base_units),
                token: Some(token.symbol.clone()),
                recipient: None,
                fee_lamports: Some(MINT_FEE_LAMPORTS),
                block_time: None,
            },
        );

        Ok(format!(
            "Successfully minted {} {}!",
            validate::format_base_units(amount_base_units, token.decimals),
            token.symbol
        ))
    }

    /// Transfer tokens to another wallet.
    pub async fn transfer_tokens(&self, form: TransferTokensIntent) {
        self.begin_op();
        let result = self.transfer_tokens_inner(form).await;
        self.finish_op(result);
    }

    async fn transfer_tokens_inner(
        &self,
        form: TransferTokensIntent,
    ) -> Result<String, TokenStudioError> {
        let address = self.require_connected()?;

        // Reject a bad recipient before any instruction is built or any
        // chain fact fetched.
        validate::validate_address(&form.recipient)?;

        let _guard = TokenOpGuard::acquire(&self.in_flight, &form.token_mint)?;

        let token = self
            .ledger
            .borrow()
            .token(&form.token_mint)
            .cloned()
            .ok_or_else(|| TokenStudioError::UnknownToken(form.token_mint.clone()))?;
        let amount_base_units =
            validate::parse_positive_amount(form.amount.as_str(), token.decimals)?;

        let mint_pubkey: solana_sdk::pubkey::Pubkey = form
            .token_mint
            .parse()
            .map_err(|_| TokenStudioError::invalid_address(form.token_mint.clone()))?;
        let recipient: solana_sdk::pubkey::Pubkey = form
            .recipient
            .trim()
            .parse()
            .map_err(|_| TokenStudioError::invalid_address(form.recipient.clone()))?;
        let recipient_account = intent::derive_holding_account(&recipient, &mint_pubkey);
        let recipient_account_exists = self
            .rpc
            .get_account_exists(&recipient_account.to_string())
            .await?;

        let params = BuildParams {
            fee_payer: address.clone(),
            mint_rent_lamports: 0,
            recipient_account_exists,
        };
        let tokens = self.ledger.borrow().tokens().to_vec();
        let plan = intent::build_transfer_tokens(&form, &tokens, &params)?;

        let signature = submit(&self.rpc, &self.wallet, &address, &plan).await?;

        let mut ledger = self.ledger.borrow_mut();
        ledger.debit(&self.storage, &address, &form.token_mint, amount_base_units);
        ledger.record_transaction(
            &self.storage,
            &address,
            TransactionRecord {
                signature,
                kind: TxKind::Transfer,
                status: TxStatus::Confirmed,
                timestamp_ms: now_ms(),
                amount_base_units: Some(amount_base_units),
                token: Some(token.symbol.clone()),
                recipient: Some(form.recipient.clone()),
                fee_lamports: Some(TRANSFER_FEE_LAMPORTS),
                block_time: None,
            },
        );

        Ok(format!(
            "Successfully transferred {} {}!",
            validate::format_base_units(amount_base_units, token.decimals),
            token.symbol
        ))
    }

    /// Request 1 SOL from the devnet faucet.
    pub async fn request_airdrop(&self) {
        self.begin_op();
        let result = self.request_airdrop_inner().await;
        self.finish_op(result);
    }

    async fn request_airdrop_inner(&self) -> Result<String, TokenStudioError> {
        let address = self.require_connected()?;

        let signature = self
            .rpc
            .request_airdrop(&address, AIRDROP_LAMPORTS)
            .await
            .map_err(|e| {
                log::warn!("airdrop failed: {}", e);
                TokenStudioError::Network("Airdrop failed. Please try again later.".into())
            })?;
        self.rpc.confirm_transaction(&signature).await?;

        let lamports = self.rpc.get_balance(&address).await?;
        self.state.borrow_mut().lamports = lamports;

        self.ledger.borrow_mut().record_transaction(
            &self.storage,
            &address,
            TransactionRecord {
                signature,
                kind: TxKind::Airdrop,
                status: TxStatus::Confirmed,
                timestamp_ms: now_ms(),
                amount_base_units: Some(AIRDROP_LAMPORTS),
                token: None,
                recipient: None,
                fee_lamports: Some(0),
                block_time: None,
            },
        );

        Ok("Received 1 SOL airdrop!".to_string())
    }

    // ---------------------------------------------------------------------
    // Operation boundary plumbing
    // ---------------------------------------------------------------------

    fn require_connected(&self) -> Result<String, TokenStudioError> {
        self.state
            .borrow()
            .wallet_address
            .clone()
            .ok_or_else(|| TokenStudioError::Wallet("Please connect your wallet first".into()))
    }

    fn begin_op(&self) {
        let mut state = self.state.borrow_mut();
        state.busy = true;
        state.error.clear();
        state.success.clear();
    }

    fn finish_op(&self, result: Result<String, TokenStudioError>) {
        let mut state = self.state.borrow_mut();
        state.busy = false;
        match result {
            Ok(message) => state.success = message,
            Err(e) => {
                log::warn!("operation failed: {}", e);
                state.error = e.to_string();
            }
        }
    }

    #[cfg(test)]
    fn acquire_token_guard(&self, mint: &str) -> Result<TokenOpGuard, TokenStudioError> {
        TokenOpGuard::acquire(&self.in_flight, mint)
    }
}
