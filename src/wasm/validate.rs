//! WASM bindings for form validation.
//!
//! Lets the page validate inputs as the user types, without round-tripping
//! through an operation.

use wasm_bindgen::prelude::*;

use crate::error::TokenStudioError;
use crate::validate;

/// Whether a candidate address decodes under the network's encoding.
#[wasm_bindgen]
pub fn is_valid_address(address: &str) -> bool {
    validate::is_valid_address(address)
}

/// Validate and upper-normalize a token symbol.
#[wasm_bindgen]
pub fn normalize_symbol(symbol: &str) -> Result<String, TokenStudioError> {
    validate::normalize_symbol(symbol)
}

/// Convert a display amount string to base units (BigInt on the JS side).
#[wasm_bindgen]
pub fn parse_amount(amount: &str, decimals: u8) -> Result<u64, TokenStudioError> {
    validate::parse_amount(amount, decimals)
}

/// Render base units back into a display amount string.
#[wasm_bindgen]
pub fn format_base_units(base_units: u64, decimals: u8) -> String {
    validate::format_base_units(base_units, decimals)
}
