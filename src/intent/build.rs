//! Intent-based instruction building implementation.
//!
//! Turns a typed token intent into the ordered instruction sequence the
//! submitter will wrap in a transaction. Building is pure: every chain fact
//! the sequence depends on (rent, recipient account existence) comes in
//! through [`BuildParams`].

use crate::error::TokenStudioError;
use crate::keypair::{Keypair, KeypairExt};
use crate::ledger::TokenRecord;
use crate::validate;

use super::types::*;

// Solana SDK types
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

// Instruction builders from existing crates
use solana_system_interface::instruction as system_ix;
use spl_token::instruction::TokenInstruction;

// Well-known Solana program IDs
// SPL Token Program: https://www.solana-program.com/docs/token
pub(crate) const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
// Associated Token Account Program: https://www.solana-program.com/docs/associated-token-account
pub(crate) const SPL_ATA_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
// System Program
pub(crate) const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
// Rent sysvar, read by InitializeMint
const RENT_SYSVAR_ID: &str = "SysvarRent111111111111111111111111111111111";

/// Size of an SPL mint account in bytes.
pub const MINT_ACCOUNT_SPACE: u64 = 82;

fn token_program() -> Pubkey {
    SPL_TOKEN_PROGRAM_ID.parse().unwrap()
}

fn ata_program() -> Pubkey {
    SPL_ATA_PROGRAM_ID.parse().unwrap()
}

fn system_program() -> Pubkey {
    SYSTEM_PROGRAM_ID.parse().unwrap()
}

fn rent_sysvar() -> Pubkey {
    RENT_SYSVAR_ID.parse().unwrap()
}

/// Derive the associated holding account for a wallet + mint pair.
///
/// ATA PDA derivation: seeds = [wallet, token_program, mint], program = ATA program.
pub fn derive_holding_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let token_program = token_program();
    let seeds = &[owner.as_ref(), token_program.as_ref(), mint.as_ref()];
    let (ata, _bump) = Pubkey::find_program_address(seeds, &ata_program());
    ata
}

/// Build the instruction sequence for a token intent.
///
/// # Arguments
/// * `intent` - The typed intent (create/mint/transfer)
/// * `tokens` - The session's current token list, for decimals lookup
/// * `params` - Chain facts gathered by the caller (feePayer, rent, ATA existence)
///
/// # Returns
/// * `IntentPlan` with ordered instructions and generated co-signer keypairs
pub fn build_from_intent(
    intent: &TokenIntent,
    tokens: &[TokenRecord],
    params: &BuildParams,
) -> Result<IntentPlan, TokenStudioError> {
    match intent {
        TokenIntent::CreateToken(create) => build_create_token(create, params),
        TokenIntent::MintTokens(mint) => build_mint_tokens(mint, tokens, params),
        TokenIntent::TransferTokens(transfer) => build_transfer_tokens(transfer, tokens, params),
    }
}

/// Create a new mint: allocate the mint account, initialize it with the
/// caller as mint and freeze authority, create the caller's holding
/// account, and mint the initial supply when it is non-zero.
///
/// Exactly 3 instructions when supply = 0, 4 when supply > 0, in that order.
pub fn build_create_token(
    intent: &CreateTokenIntent,
    params: &BuildParams,
) -> Result<IntentPlan, TokenStudioError> {
    validate::validate_name(&intent.name)?;
    validate::normalize_symbol(&intent.symbol)?;
    let decimals = validate::validate_decimals(intent.decimals)?;
    let supply_base_units = validate::parse_amount(intent.supply.as_str(), decimals)?;

    let authority = parse_fee_payer(&params.fee_payer)?;

    // The new mint account co-signs its own creation.
    let mint_keypair = Keypair::new();
    let mint_address = mint_keypair.address();
    let mint_pubkey: Pubkey = mint_address
        .parse()
        .map_err(|_| TokenStudioError::Validation("failed to generate mint address".into()))?;

    let holding_account = derive_holding_account(&authority, &mint_pubkey);

    let mut instructions = vec![
        system_ix::create_account(
            &authority,
            &mint_pubkey,
            params.mint_rent_lamports,
            MINT_ACCOUNT_SPACE,
            &token_program(),
        ),
        initialize_mint_instruction(&mint_pubkey, &authority, decimals),
        create_holding_account_instruction(&authority, &holding_account, &authority, &mint_pubkey),
    ];
    if supply_base_units > 0 {
        instructions.push(mint_to_instruction(
            &mint_pubkey,
            &holding_account,
            &authority,
            supply_base_units,
        ));
    }

    let generated = vec![GeneratedKeypair {
        purpose: KeypairPurpose::Mint,
        address: mint_address,
        secret_key: solana_sdk::bs58::encode(mint_keypair.secret_key_bytes()).into_string(),
    }];

    Ok(IntentPlan {
        instructions,
        generated_keypairs: generated,
    })
}

/// Mint additional supply into the caller's holding account. The mint must
/// already be in the session's token list; its record supplies the decimals.
pub fn build_mint_tokens(
    intent: &MintTokensIntent,
    tokens: &[TokenRecord],
    params: &BuildParams,
) -> Result<IntentPlan, TokenStudioError> {
    let token = tokens
        .iter()
        .find(|t| t.mint == intent.token_mint)
        .ok_or_else(|| TokenStudioError::UnknownToken(intent.token_mint.clone()))?;

    let amount = validate::parse_positive_amount(intent.amount.as_str(), token.decimals)?;

    let authority = parse_fee_payer(&params.fee_payer)?;
    let mint_pubkey: Pubkey = intent
        .token_mint
        .parse()
        .map_err(|_| TokenStudioError::invalid_address(intent.token_mint.clone()))?;

    let holding_account = derive_holding_account(&authority, &mint_pubkey);

    let instructions = vec![mint_to_instruction(
        &mint_pubkey,
        &holding_account,
        &authority,
        amount,
    )];

    Ok(IntentPlan {
        instructions,
        generated_keypairs: vec![],
    })
}

/// Transfer tokens to another wallet's holding account, creating that
/// account first when the chain does not have it yet.
pub fn build_transfer_tokens(
    intent: &TransferTokensIntent,
    tokens: &[TokenRecord],
    params: &BuildParams,
) -> Result<IntentPlan, TokenStudioError> {
    // Recipient is validated before anything else is built. The validated
    // key re-enters as a string parse because the validator's pubkey crate
    // and the SDK's cross the 2.x/3.x seam.
    validate::validate_address(&intent.recipient)?;
    let recipient: Pubkey = intent
        .recipient
        .trim()
        .parse()
        .map_err(|_| TokenStudioError::invalid_address(intent.recipient.clone()))?;

    let token = tokens
        .iter()
        .find(|t| t.mint == intent.token_mint)
        .ok_or_else(|| TokenStudioError::UnknownToken(intent.token_mint.clone()))?;

    let amount = validate::parse_positive_amount(intent.amount.as_str(), token.decimals)?;

    let owner = parse_fee_payer(&params.fee_payer)?;
    let mint_pubkey: Pubkey = intent
        .token_mint
        .parse()
        .map_err(|_| TokenStudioError::invalid_address(intent.token_mint.clone()))?;

    let sender_account = derive_holding_account(&owner, &mint_pubkey);
    let recipient_account = derive_holding_account(&recipient, &mint_pubkey);

    let mut instructions = Vec::new();
    if !params.recipient_account_exists {
        instructions.push(create_holding_account_instruction(
            &owner,
            &recipient_account,
            &recipient,
            &mint_pubkey,
        ));
    }
    instructions.push(transfer_instruction(
        &sender_account,
        &recipient_account,
        &owner,
        amount,
    ));

    Ok(IntentPlan {
        instructions,
        generated_keypairs: vec![],
    })
}

fn parse_fee_payer(fee_payer: &str) -> Result<Pubkey, TokenStudioError> {
    fee_payer
        .parse()
        .map_err(|_| TokenStudioError::invalid_address(format!("invalid feePayer: {}", fee_payer)))
}

/// InitializeMint instruction.
/// Data layout: tag (0) + decimals + mint authority + freeze authority COption (flag + key).
fn initialize_mint_instruction(mint: &Pubkey, authority: &Pubkey, decimals: u8) -> Instruction {
    let mut data = Vec::with_capacity(67);
    data.push(0u8);
    data.push(decimals);
    data.extend_from_slice(authority.as_ref());
    data.push(1u8);
    data.extend_from_slice(authority.as_ref());

    Instruction::new_with_bytes(
        token_program(),
        &data,
        vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new_readonly(rent_sysvar(), false),
        ],
    )
}

/// Associated token account creation instruction (empty data = Create).
fn create_holding_account_instruction(
    fee_payer: &Pubkey,
    holding_account: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    Instruction::new_with_bytes(
        ata_program(),
        &[],
        vec![
            AccountMeta::new(*fee_payer, true),
            AccountMeta::new(*holding_account, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(system_program(), false),
            AccountMeta::new_readonly(token_program(), false),
        ],
    )
}

fn mint_to_instruction(
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = TokenInstruction::MintTo { amount }.pack();

    Instruction::new_with_bytes(
        token_program(),
        &data,
        vec![
            AccountMeta::new(*mint, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*authority, true),
        ],
    )
}

fn transfer_instruction(
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = TokenInstruction::Transfer { amount }.pack();

    Instruction::new_with_bytes(
        token_program(),
        &data,
        vec![
            AccountMeta::new(*source, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*owner, true),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE_PAYER: &str = "DgT9qyYwYKBRDyDw3EfR12LHQCQjtNrKu2qMsXHuosmB";
    const RECIPIENT: &str = "FKjSjCqByQRwSzZoMXA7bKnDbJe41YgJTHFFzBeC42bH";

    fn test_params() -> BuildParams {
        BuildParams {
            fee_payer: FEE_PAYER.to_string(),
            mint_rent_lamports: 1_461_600,
            recipient_account_exists: false,
        }
    }

    fn known_token(mint: &str, decimals: u8) -> TokenRecord {
        TokenRecord {
            mint: mint.to_string(),
            symbol: "TST".to_string(),
            name: "Test".to_string(),
            decimals,
            balance_base_units: 10_000,
            supply_base_units: Some(10_000),
            owner: FEE_PAYER.to_string(),
            mint_authority: Some(FEE_PAYER.to_string()),
            freeze_authority: Some(FEE_PAYER.to_string()),
            is_initialized: true,
        }
    }

    fn create_intent(supply: &str) -> CreateTokenIntent {
        CreateTokenIntent {
            name: "Test".to_string(),
            symbol: "tst".to_string(),
            decimals: 2,
            supply: supply.into(),
        }
    }

    #[test]
    fn create_with_supply_has_four_instructions_in_order() {
        let plan = build_create_token(&create_intent("100"), &test_params()).unwrap();

        assert_eq!(plan.instructions.len(), 4);
        let programs: Vec<_> = plan
            .instructions
            .iter()
            .map(|ix| ix.program_id)
            .collect();
        assert_eq!(
            programs,
            [
                system_program(),
                token_program(),
                ata_program(),
                token_program()
            ]
        );

        // CreateAccount discriminant is u32 LE 0.
        assert_eq!(&plan.instructions[0].data[..4], &[0, 0, 0, 0]);
        // InitializeMint: tag 0, then decimals.
        assert_eq!(plan.instructions[1].data[0], 0);
        assert_eq!(plan.instructions[1].data[1], 2);
        // ATA Create has empty data.
        assert!(plan.instructions[2].data.is_empty());
        // MintTo: tag 7, then 100 * 10^2 base units LE.
        assert_eq!(plan.instructions[3].data[0], 7);
        assert_eq!(
            u64::from_le_bytes(plan.instructions[3].data[1..9].try_into().unwrap()),
            10_000
        );
    }

    #[test]
    fn create_with_zero_supply_has_three_instructions() {
        let plan = build_create_token(&create_intent("0"), &test_params()).unwrap();
        assert_eq!(plan.instructions.len(), 3);
    }

    #[test]
    fn create_generates_exactly_the_mint_cosigner() {
        let plan = build_create_token(&create_intent("100"), &test_params()).unwrap();

        assert_eq!(plan.generated_keypairs.len(), 1);
        let generated = &plan.generated_keypairs[0];
        assert_eq!(generated.purpose, KeypairPurpose::Mint);
        // The generated address is the account the first instruction funds.
        let mint_pubkey: Pubkey = generated.address.parse().unwrap();
        assert_eq!(plan.instructions[0].accounts[1].pubkey, mint_pubkey);
        assert!(plan.instructions[0].accounts[1].is_signer);
    }

    #[test]
    fn create_mint_account_is_rent_funded_and_sized() {
        let plan = build_create_token(&create_intent("0"), &test_params()).unwrap();
        let data = &plan.instructions[0].data;
        // CreateAccount data: u32 tag, u64 lamports, u64 space, 32B owner.
        let lamports = u64::from_le_bytes(data[4..12].try_into().unwrap());
        let space = u64::from_le_bytes(data[12..20].try_into().unwrap());
        assert_eq!(lamports, 1_461_600);
        assert_eq!(space, MINT_ACCOUNT_SPACE);
    }

    #[test]
    fn create_validates_before_building() {
        let mut bad_symbol = create_intent("100");
        bad_symbol.symbol = "WAYTOOLONGSYMBOL".to_string();
        assert!(matches!(
            build_create_token(&bad_symbol, &test_params()),
            Err(TokenStudioError::Validation(_))
        ));

        let mut bad_decimals = create_intent("100");
        bad_decimals.decimals = 10;
        assert!(matches!(
            build_create_token(&bad_decimals, &test_params()),
            Err(TokenStudioError::Validation(_))
        ));

        let mut bad_name = create_intent("100");
        bad_name.name = "  ".to_string();
        assert!(build_create_token(&bad_name, &test_params()).is_err());
    }

    #[test]
    fn mint_scales_by_known_decimals() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent = MintTokensIntent {
            token_mint: tokens[0].mint.clone(),
            amount: "50".into(),
        };

        let plan = build_mint_tokens(&intent, &tokens, &test_params()).unwrap();
        assert_eq!(plan.instructions.len(), 1);
        assert!(plan.generated_keypairs.is_empty());
        let data = &plan.instructions[0].data;
        assert_eq!(data[0], 7);
        assert_eq!(u64::from_le_bytes(data[1..9].try_into().unwrap()), 5_000);
    }

    #[test]
    fn mint_unknown_token_is_rejected() {
        let intent = MintTokensIntent {
            token_mint: "So11111111111111111111111111111111111111112".to_string(),
            amount: "50".into(),
        };
        let result = build_mint_tokens(&intent, &[], &test_params());
        assert!(matches!(result, Err(TokenStudioError::UnknownToken(_))));
    }

    #[test]
    fn mint_zero_amount_is_rejected() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent = MintTokensIntent {
            token_mint: tokens[0].mint.clone(),
            amount: "0".into(),
        };
        assert!(matches!(
            build_mint_tokens(&intent, &tokens, &test_params()),
            Err(TokenStudioError::Validation(_))
        ));
    }

    #[test]
    fn transfer_to_fresh_recipient_prepends_account_creation() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent = TransferTokensIntent {
            token_mint: tokens[0].mint.clone(),
            recipient: RECIPIENT.to_string(),
            amount: "30".into(),
        };

        let params = BuildParams {
            recipient_account_exists: false,
            ..test_params()
        };
        let plan = build_transfer_tokens(&intent, &tokens, &params).unwrap();

        assert_eq!(plan.instructions.len(), 2);
        assert_eq!(plan.instructions[0].program_id, ata_program());
        assert_eq!(plan.instructions[1].program_id, token_program());
        // Transfer: tag 3, then 30 * 10^2 base units LE.
        let data = &plan.instructions[1].data;
        assert_eq!(data[0], 3);
        assert_eq!(u64::from_le_bytes(data[1..9].try_into().unwrap()), 3_000);
    }

    #[test]
    fn transfer_to_existing_recipient_is_a_single_instruction() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent = TransferTokensIntent {
            token_mint: tokens[0].mint.clone(),
            recipient: RECIPIENT.to_string(),
            amount: "30".into(),
        };

        let params = BuildParams {
            recipient_account_exists: true,
            ..test_params()
        };
        let plan = build_transfer_tokens(&intent, &tokens, &params).unwrap();
        assert_eq!(plan.instructions.len(), 1);
        assert_eq!(plan.instructions[0].program_id, token_program());
    }

    #[test]
    fn transfer_rejects_bad_recipient_before_building() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent = TransferTokensIntent {
            token_mint: tokens[0].mint.clone(),
            recipient: "not-an-address".to_string(),
            amount: "30".into(),
        };

        let result = build_transfer_tokens(&intent, &tokens, &test_params());
        assert!(matches!(result, Err(TokenStudioError::InvalidAddress(_))));
    }

    #[test]
    fn transfer_source_and_destination_are_the_derived_holding_accounts() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent = TransferTokensIntent {
            token_mint: tokens[0].mint.clone(),
            recipient: RECIPIENT.to_string(),
            amount: "1".into(),
        };
        let params = BuildParams {
            recipient_account_exists: true,
            ..test_params()
        };

        let plan = build_transfer_tokens(&intent, &tokens, &params).unwrap();

        let owner: Pubkey = FEE_PAYER.parse().unwrap();
        let recipient: Pubkey = RECIPIENT.parse().unwrap();
        let mint: Pubkey = tokens[0].mint.parse().unwrap();
        let transfer = &plan.instructions[0];
        assert_eq!(
            transfer.accounts[0].pubkey,
            derive_holding_account(&owner, &mint)
        );
        assert_eq!(
            transfer.accounts[1].pubkey,
            derive_holding_account(&recipient, &mint)
        );
        assert!(transfer.accounts[2].is_signer);
    }

    #[test]
    fn dispatch_routes_by_intent_type() {
        let tokens = [known_token("So11111111111111111111111111111111111111112", 2)];
        let intent: TokenIntent = serde_json::from_value(serde_json::json!({
            "intentType": "mintTokens",
            "tokenMint": tokens[0].mint,
            "amount": "50"
        }))
        .unwrap();

        let plan = build_from_intent(&intent, &tokens, &test_params()).unwrap();
        assert_eq!(plan.instructions.len(), 1);
    }

    #[test]
    fn holding_account_derivation_is_deterministic_and_off_curve() {
        let owner: Pubkey = FEE_PAYER.parse().unwrap();
        let mint: Pubkey = "So11111111111111111111111111111111111111112".parse().unwrap();

        let a = derive_holding_account(&owner, &mint);
        let b = derive_holding_account(&owner, &mint);
        assert_eq!(a, b);

        let other: Pubkey = RECIPIENT.parse().unwrap();
        assert_ne!(a, derive_holding_account(&other, &mint));
    }
}
