//! Intent-based instruction building.
//!
//! A form submission becomes a typed intent; an intent becomes an ordered
//! instruction sequence plus the keypairs that must co-sign it. The
//! submitter (`crate::submit`) turns that into exactly one transaction.

mod build;
mod types;

pub use build::{
    build_create_token, build_from_intent, build_mint_tokens, build_transfer_tokens,
    derive_holding_account, MINT_ACCOUNT_SPACE,
};
pub(crate) use build::{SPL_ATA_PROGRAM_ID, SPL_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID};
pub use types::*;
