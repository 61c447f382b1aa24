//! Types for intent-based transaction building.
//!
//! These types mirror the token-studio form payloads and are deserialized
//! from JavaScript.

use serde::{Deserialize, Serialize};

use solana_sdk::instruction::Instruction;

/// A user-supplied display amount, kept as the decimal string the form
/// produced until a mint's decimals are known. Conversion to base units is
/// integer-only (see [`crate::validate::parse_amount`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiAmount(pub String);

impl UiAmount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UiAmount {
    fn from(s: &str) -> Self {
        UiAmount(s.to_string())
    }
}

/// Deserialize an amount from either string or number (for JS form
/// compatibility: inputs arrive as strings, sliders and JSON literals as
/// numbers).
impl<'de> Deserialize<'de> for UiAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = UiAmount;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or number representing an amount")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(UiAmount(v.to_string()))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(UiAmount(v.to_string()))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Shortest-roundtrip formatting; the digits the user typed.
                Ok(UiAmount(v.to_string()))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(UiAmount(v.to_string()))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Create a new mint with the caller as mint and freeze authority.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenIntent {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Initial supply in display units; zero means create only.
    pub supply: UiAmount,
}

/// Mint additional supply of a token already known to the session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintTokensIntent {
    pub token_mint: String,
    pub amount: UiAmount,
}

/// Transfer a token to another wallet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTokensIntent {
    pub token_mint: String,
    pub recipient: String,
    pub amount: UiAmount,
}

/// All intents the studio can build, tagged the way the page sends them.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "intentType", rename_all = "camelCase")]
pub enum TokenIntent {
    CreateToken(CreateTokenIntent),
    MintTokens(MintTokensIntent),
    TransferTokens(TransferTokensIntent),
}

/// Chain facts the builder cannot know on its own. The session controller
/// gathers these (one RPC round trip each) before building; the builder
/// itself stays pure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildParams {
    /// Fee payer and authority address (the connected wallet).
    pub fee_payer: String,
    /// Rent-exempt balance for a mint account, from the current network
    /// rent parameters. Only read by create intents.
    #[serde(default)]
    pub mint_rent_lamports: u64,
    /// Whether the recipient's holding account already exists on-chain.
    /// Only read by transfer intents; when false, an account-creation
    /// instruction is prepended.
    #[serde(default)]
    pub recipient_account_exists: bool,
}

/// Purpose of a keypair generated during building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeypairPurpose {
    /// The new mint account; must co-sign its own creation.
    Mint,
}

/// A keypair generated during transaction building. Lives only until the
/// transaction is signed and broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedKeypair {
    pub purpose: KeypairPurpose,
    /// Public address (base58).
    pub address: String,
    /// Secret key (base58).
    pub secret_key: String,
}

/// Result of building an intent: the ordered instruction sequence plus any
/// generated keypairs that must co-sign alongside the wallet.
#[derive(Debug, Clone)]
pub struct IntentPlan {
    pub instructions: Vec<Instruction>,
    pub generated_keypairs: Vec<GeneratedKeypair>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_amount_from_string_and_number() {
        let from_str: UiAmount = serde_json::from_value(serde_json::json!("100.5")).unwrap();
        assert_eq!(from_str.as_str(), "100.5");

        let from_int: UiAmount = serde_json::from_value(serde_json::json!(100)).unwrap();
        assert_eq!(from_int.as_str(), "100");

        let from_float: UiAmount = serde_json::from_value(serde_json::json!(0.25)).unwrap();
        assert_eq!(from_float.as_str(), "0.25");
    }

    #[test]
    fn intent_tag_dispatch() {
        let intent: TokenIntent = serde_json::from_value(serde_json::json!({
            "intentType": "createToken",
            "name": "Test",
            "symbol": "tst",
            "decimals": 2,
            "supply": "100"
        }))
        .unwrap();
        assert!(matches!(intent, TokenIntent::CreateToken(_)));

        let intent: TokenIntent = serde_json::from_value(serde_json::json!({
            "intentType": "transferTokens",
            "tokenMint": "MintA",
            "recipient": "FKjSjCqByQRwSzZoMXA7bKnDbJe41YgJTHFFzBeC42bH",
            "amount": 30
        }))
        .unwrap();
        assert!(matches!(intent, TokenIntent::TransferTokens(_)));
    }

    #[test]
    fn build_params_defaults() {
        let params: BuildParams =
            serde_json::from_value(serde_json::json!({ "feePayer": "abc" })).unwrap();
        assert_eq!(params.mint_rent_lamports, 0);
        assert!(!params.recipient_account_exists);
    }
}
