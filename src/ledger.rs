//! Local mirror of tokens and transaction history.
//!
//! The mirror is a per-wallet cache written through to persistent storage
//! after every change and reloaded on reconnect. It is advisory: the chain
//! is authoritative, and the two lists are not written transactionally
//! (a crash between the token write and the transaction write leaves them
//! out of step, which the next refresh repairs).
//!
//! All balances are u64 base units; display conversion happens at the edge
//! via [`crate::validate::format_base_units`].

use serde::{Deserialize, Serialize};

use crate::storage::{tokens_key, transactions_key, StorageApi};
use crate::validate::format_base_units;

/// A fungible-token holding known to this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    /// Mint address; unique within the session's token list.
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Current holding in base units. Never negative after a committed
    /// operation (debits clamp at zero).
    pub balance_base_units: u64,
    /// Informational total supply in base units, when known.
    #[serde(default)]
    pub supply_base_units: Option<u64>,
    pub owner: String,
    #[serde(default)]
    pub mint_authority: Option<String>,
    #[serde(default)]
    pub freeze_authority: Option<String>,
    pub is_initialized: bool,
}

impl TokenRecord {
    /// Display balance, e.g. `"100.00"` for 10_000 base units at 2 decimals.
    pub fn ui_balance(&self) -> String {
        format_base_units(self.balance_base_units, self.decimals)
    }
}

/// What a transaction record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Create,
    Mint,
    Transfer,
    Airdrop,
}

/// Lifecycle of a submitted or discovered transaction. Transitions only
/// pending -> confirmed or pending -> failed, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One submitted or discovered on-chain action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// On-chain signature; unique within the list.
    pub signature: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
    pub status: TxStatus,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    #[serde(default)]
    pub amount_base_units: Option<u64>,
    /// Symbol of the token involved, if any.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub fee_lamports: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

/// The per-wallet cache of tokens and transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerMirror {
    tokens: Vec<TokenRecord>,
    transactions: Vec<TransactionRecord>,
}

impl LedgerMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore both lists for `address`, or empty lists if nothing (or
    /// nothing parseable) is stored. Read-only: never writes back, so two
    /// consecutive loads return identical lists.
    pub fn load<S: StorageApi>(storage: &S, address: &str) -> Self {
        let tokens = storage
            .get(&tokens_key(address))
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(list) => Some(list),
                Err(e) => {
                    log::warn!("discarding unparseable token cache for {}: {}", address, e);
                    None
                }
            })
            .unwrap_or_default();
        let transactions = storage
            .get(&transactions_key(address))
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(list) => Some(list),
                Err(e) => {
                    log::warn!(
                        "discarding unparseable transaction cache for {}: {}",
                        address,
                        e
                    );
                    None
                }
            })
            .unwrap_or_default();
        Self {
            tokens,
            transactions,
        }
    }

    pub fn tokens(&self) -> &[TokenRecord] {
        &self.tokens
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn token(&self, mint: &str) -> Option<&TokenRecord> {
        self.tokens.iter().find(|t| t.mint == mint)
    }

    pub fn transaction(&self, signature: &str) -> Option<&TransactionRecord> {
        self.transactions.iter().find(|t| t.signature == signature)
    }

    /// Drop the in-memory lists. Persisted copies stay on disk keyed by
    /// address for the next reconnect.
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.transactions.clear();
    }

    /// Append or update a token entry keyed by mint (replace-on-match,
    /// else append) and persist the full token list.
    pub fn record_token<S: StorageApi>(&mut self, storage: &S, address: &str, record: TokenRecord) {
        match self.tokens.iter_mut().find(|t| t.mint == record.mint) {
            Some(existing) => *existing = record,
            None => self.tokens.push(record),
        }
        self.persist_tokens(storage, address);
    }

    /// Replace the token list wholesale (session refresh) and persist.
    pub fn set_tokens<S: StorageApi>(
        &mut self,
        storage: &S,
        address: &str,
        tokens: Vec<TokenRecord>,
    ) {
        self.tokens = tokens;
        self.persist_tokens(storage, address);
    }

    /// Prepend a transaction record (most-recent-first) and persist.
    pub fn record_transaction<S: StorageApi>(
        &mut self,
        storage: &S,
        address: &str,
        record: TransactionRecord,
    ) {
        self.transactions.insert(0, record);
        self.persist_transactions(storage, address);
    }

    /// Append a transaction discovered from chain history. History entries
    /// are older than anything submitted this session, so they go at the
    /// end instead of the front.
    pub fn append_transaction<S: StorageApi>(
        &mut self,
        storage: &S,
        address: &str,
        record: TransactionRecord,
    ) {
        self.transactions.push(record);
        self.persist_transactions(storage, address);
    }

    /// Advance a record's status. Only pending records move; confirmed and
    /// failed are terminal.
    pub fn update_transaction_status<S: StorageApi>(
        &mut self,
        storage: &S,
        address: &str,
        signature: &str,
        status: TxStatus,
    ) {
        let Some(record) = self
            .transactions
            .iter_mut()
            .find(|t| t.signature == signature)
        else {
            return;
        };
        if record.status != TxStatus::Pending || status == TxStatus::Pending {
            return;
        }
        record.status = status;
        self.persist_transactions(storage, address);
    }

    /// Credit a known token's mirrored balance after a confirmed mint.
    pub fn credit<S: StorageApi>(
        &mut self,
        storage: &S,
        address: &str,
        mint: &str,
        base_units: u64,
    ) -> Option<u64> {
        let token = self.tokens.iter_mut().find(|t| t.mint == mint)?;
        token.balance_base_units = token.balance_base_units.saturating_add(base_units);
        token.supply_base_units = token
            .supply_base_units
            .map(|s| s.saturating_add(base_units));
        let balance = token.balance_base_units;
        self.persist_tokens(storage, address);
        Some(balance)
    }

    /// Debit a known token's mirrored balance after a confirmed transfer.
    /// Clamps at zero: the mirror is advisory and must never show a
    /// negative holding, even if it was stale at submit time.
    pub fn debit<S: StorageApi>(
        &mut self,
        storage: &S,
        address: &str,
        mint: &str,
        base_units: u64,
    ) -> Option<u64> {
        let token = self.tokens.iter_mut().find(|t| t.mint == mint)?;
        token.balance_base_units = token.balance_base_units.saturating_sub(base_units);
        let balance = token.balance_base_units;
        self.persist_tokens(storage, address);
        Some(balance)
    }

    fn persist_tokens<S: StorageApi>(&self, storage: &S, address: &str) {
        match serde_json::to_string(&self.tokens) {
            Ok(raw) => storage.set(&tokens_key(address), &raw),
            Err(e) => log::warn!("failed to serialize token cache: {}", e),
        }
    }

    fn persist_transactions<S: StorageApi>(&self, storage: &S, address: &str) {
        match serde_json::to_string(&self.transactions) {
            Ok(raw) => storage.set(&transactions_key(address), &raw),
            Err(e) => log::warn!("failed to serialize transaction cache: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    const OWNER: &str = "DgT9qyYwYKBRDyDw3EfR12LHQCQjtNrKu2qMsXHuosmB";

    fn test_token(mint: &str, balance: u64) -> TokenRecord {
        TokenRecord {
            mint: mint.to_string(),
            symbol: "TST".to_string(),
            name: "Test".to_string(),
            decimals: 2,
            balance_base_units: balance,
            supply_base_units: Some(balance),
            owner: OWNER.to_string(),
            mint_authority: Some(OWNER.to_string()),
            freeze_authority: Some(OWNER.to_string()),
            is_initialized: true,
        }
    }

    fn test_tx(signature: &str, status: TxStatus) -> TransactionRecord {
        TransactionRecord {
            signature: signature.to_string(),
            kind: TxKind::Mint,
            status,
            timestamp_ms: 1_700_000_000_000,
            amount_base_units: Some(5_000),
            token: Some("TST".to_string()),
            recipient: None,
            fee_lamports: Some(1_000_000),
            block_time: None,
        }
    }

    #[test]
    fn load_empty_storage_returns_empty_lists() {
        let storage = MemoryStorage::new();
        let ledger = LedgerMirror::load(&storage, OWNER);
        assert!(ledger.tokens().is_empty());
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn record_token_roundtrips_through_storage() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        let token = test_token("MintA", 10_000);
        ledger.record_token(&storage, OWNER, token.clone());

        let restored = LedgerMirror::load(&storage, OWNER);
        assert_eq!(restored.tokens(), &[token]);
    }

    #[test]
    fn load_is_idempotent() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_token(&storage, OWNER, test_token("MintA", 1));
        ledger.record_transaction(&storage, OWNER, test_tx("sig1", TxStatus::Confirmed));

        let first = LedgerMirror::load(&storage, OWNER);
        let second = LedgerMirror::load(&storage, OWNER);
        assert_eq!(first, second);
    }

    #[test]
    fn record_token_replaces_on_mint_match() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_token(&storage, OWNER, test_token("MintA", 100));
        ledger.record_token(&storage, OWNER, test_token("MintB", 200));
        ledger.record_token(&storage, OWNER, test_token("MintA", 999));

        assert_eq!(ledger.tokens().len(), 2);
        assert_eq!(ledger.token("MintA").unwrap().balance_base_units, 999);
        // Replacement keeps position, it does not re-append.
        assert_eq!(ledger.tokens()[0].mint, "MintA");
    }

    #[test]
    fn transactions_prepend_most_recent_first() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_transaction(&storage, OWNER, test_tx("sig1", TxStatus::Confirmed));
        ledger.record_transaction(&storage, OWNER, test_tx("sig2", TxStatus::Confirmed));

        let sigs: Vec<_> = ledger
            .transactions()
            .iter()
            .map(|t| t.signature.as_str())
            .collect();
        assert_eq!(sigs, ["sig2", "sig1"]);
    }

    #[test]
    fn status_only_moves_forward() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_transaction(&storage, OWNER, test_tx("sig1", TxStatus::Pending));

        ledger.update_transaction_status(&storage, OWNER, "sig1", TxStatus::Confirmed);
        assert_eq!(ledger.transactions()[0].status, TxStatus::Confirmed);

        // Confirmed is terminal; a late failure report must not reverse it.
        ledger.update_transaction_status(&storage, OWNER, "sig1", TxStatus::Failed);
        assert_eq!(ledger.transactions()[0].status, TxStatus::Confirmed);
    }

    #[test]
    fn credit_and_debit_track_balance() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_token(&storage, OWNER, test_token("MintA", 10_000));

        assert_eq!(
            ledger.credit(&storage, OWNER, "MintA", 5_000),
            Some(15_000)
        );
        assert_eq!(ledger.debit(&storage, OWNER, "MintA", 3_000), Some(12_000));
        assert_eq!(ledger.credit(&storage, OWNER, "Nope", 1), None);
    }

    #[test]
    fn debit_clamps_at_zero() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_token(&storage, OWNER, test_token("MintA", 100));

        assert_eq!(ledger.debit(&storage, OWNER, "MintA", 5_000), Some(0));
    }

    #[test]
    fn clear_keeps_persisted_copies() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_token(&storage, OWNER, test_token("MintA", 100));
        ledger.clear();

        assert!(ledger.tokens().is_empty());
        let restored = LedgerMirror::load(&storage, OWNER);
        assert_eq!(restored.tokens().len(), 1);
    }

    #[test]
    fn stored_json_uses_the_page_field_names() {
        let storage = MemoryStorage::new();
        let mut ledger = LedgerMirror::new();
        ledger.record_token(&storage, OWNER, test_token("MintA", 100));
        ledger.record_transaction(&storage, OWNER, test_tx("sig1", TxStatus::Confirmed));

        let tokens_raw = storage.get(&tokens_key(OWNER)).unwrap();
        assert!(tokens_raw.contains("\"isInitialized\":true"));
        assert!(tokens_raw.contains("\"balanceBaseUnits\":100"));

        let txs_raw = storage.get(&transactions_key(OWNER)).unwrap();
        assert!(txs_raw.contains("\"type\":\"mint\""));
        assert!(txs_raw.contains("\"status\":\"confirmed\""));
    }

    #[test]
    fn ui_balance_formats_by_decimals() {
        let token = test_token("MintA", 10_000);
        assert_eq!(token.ui_balance(), "100.00");
    }
}
