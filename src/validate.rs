//! Form-input validation and fixed-point amount handling.
//!
//! Everything here is pure and synchronous; operations call these before
//! touching the wallet or the network, so malformed input never costs a
//! round trip.
//!
//! Base-unit conversion is done with scaled-integer arithmetic on the
//! decimal string the form produced. `amount * 10^decimals` through an f64
//! silently loses precision for large amounts, so floats are banned from
//! the money path.

use crate::error::TokenStudioError;
use crate::pubkey::{Pubkey, PubkeyExt};

/// Maximum symbol length accepted by the create form.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Maximum decimal places a mint can be created with.
pub const MAX_DECIMALS: u8 = 9;

/// Validate a candidate wallet/mint address.
///
/// Valid iff it decodes to a 32-byte ed25519-sized key under base58.
/// Total over arbitrary input: never panics, only rejects.
pub fn validate_address(address: &str) -> Result<Pubkey, TokenStudioError> {
    Pubkey::from_base58(address.trim())
}

/// Boolean form of [`validate_address`] for callers that only gate UI state.
pub fn is_valid_address(address: &str) -> bool {
    validate_address(address).is_ok()
}

/// Parse a decimal amount string into base units (`amount * 10^decimals`)
/// using integer arithmetic only.
///
/// Accepts plain decimal notation (`"100"`, `"0.25"`, `".5"`). Rejects
/// signs, exponents, more fractional digits than the mint carries, and
/// anything that overflows u64.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<u64, TokenStudioError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(TokenStudioError::validation("amount is empty"));
    }
    if decimals > MAX_DECIMALS {
        return Err(TokenStudioError::validation(format!(
            "unsupported decimals: {}",
            decimals
        )));
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(TokenStudioError::validation("amount is not a number"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(TokenStudioError::validation(format!(
            "amount is not a plain decimal number: {}",
            amount
        )));
    }
    if frac_part.len() > decimals as usize {
        return Err(TokenStudioError::validation(format!(
            "amount has {} fractional digits but the token has {} decimals",
            frac_part.len(),
            decimals
        )));
    }

    let scale = 10u64.pow(decimals as u32);
    let whole: u64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| TokenStudioError::validation(format!("amount too large: {}", amount)))?
    };

    // Right-pad the fractional digits to the mint's full precision.
    let frac: u64 = if frac_part.is_empty() {
        0
    } else {
        let parsed: u64 = frac_part
            .parse()
            .map_err(|_| TokenStudioError::validation(format!("amount too large: {}", amount)))?;
        parsed * 10u64.pow((decimals as usize - frac_part.len()) as u32)
    };

    whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(|| TokenStudioError::validation(format!("amount too large: {}", amount)))
}

/// Parse an amount that must be strictly positive (mint and transfer).
pub fn parse_positive_amount(amount: &str, decimals: u8) -> Result<u64, TokenStudioError> {
    let base_units = parse_amount(amount, decimals)?;
    if base_units == 0 {
        return Err(TokenStudioError::validation("amount must be greater than 0"));
    }
    Ok(base_units)
}

/// Format base units back into a display amount string.
///
/// Trailing fractional zeros are kept so `100` at 2 decimals renders as
/// `100.00`, matching what the forms show.
pub fn format_base_units(base_units: u64, decimals: u8) -> String {
    if decimals == 0 {
        return base_units.to_string();
    }
    let scale = 10u64.pow(decimals as u32);
    format!(
        "{}.{:0width$}",
        base_units / scale,
        base_units % scale,
        width = decimals as usize
    )
}

/// Validate and normalize a token symbol: non-empty, at most
/// [`MAX_SYMBOL_LEN`] characters, upper-cased.
pub fn normalize_symbol(symbol: &str) -> Result<String, TokenStudioError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(TokenStudioError::validation("token symbol is required"));
    }
    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(TokenStudioError::validation(format!(
            "token symbol must be at most {} characters",
            MAX_SYMBOL_LEN
        )));
    }
    Ok(symbol.to_uppercase())
}

/// Validate a token display name.
pub fn validate_name(name: &str) -> Result<String, TokenStudioError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TokenStudioError::validation("token name is required"));
    }
    Ok(name.to_string())
}

/// Validate the decimal-places field of the create form.
pub fn validate_decimals(decimals: u8) -> Result<u8, TokenStudioError> {
    if decimals > MAX_DECIMALS {
        return Err(TokenStudioError::validation(format!(
            "decimals must be between 0 and {}",
            MAX_DECIMALS
        )));
    }
    Ok(decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_address() {
        assert!(is_valid_address("FKjSjCqByQRwSzZoMXA7bKnDbJe41YgJTHFFzBeC42bH"));
        assert!(is_valid_address("11111111111111111111111111111111"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("too-short"));
        assert!(!is_valid_address("0OIl+/=")); // invalid base58 alphabet
        // 31 bytes of payload
        assert!(!is_valid_address("1111111111111111111111111111111"));
    }

    #[test]
    fn validator_is_total() {
        // Arbitrary garbage must reject, never panic.
        for s in ["\u{0}", "🚀🚀🚀", " ", "ゲーム", &"9".repeat(1000)] {
            let _ = is_valid_address(s);
        }
    }

    #[test]
    fn parse_whole_amount() {
        assert_eq!(parse_amount("100", 2).unwrap(), 10_000);
        assert_eq!(parse_amount("0", 9).unwrap(), 0);
        assert_eq!(parse_amount("42", 0).unwrap(), 42);
    }

    #[test]
    fn parse_fractional_amount_is_exact() {
        // 0.1 is inexact in binary floating point; the scaled-integer path
        // must produce exactly 100_000_000 at 9 decimals.
        assert_eq!(parse_amount("0.1", 9).unwrap(), 100_000_000);
        assert_eq!(parse_amount(".5", 2).unwrap(), 50);
        assert_eq!(parse_amount("1.23", 2).unwrap(), 123);
    }

    #[test]
    fn parse_rejects_excess_precision() {
        assert!(parse_amount("1.234", 2).is_err());
        assert!(parse_amount("0.0000000001", 9).is_err());
    }

    #[test]
    fn parse_rejects_non_numbers() {
        for s in ["", ".", "-1", "1e9", "1,5", "abc", "1.2.3", "+4"] {
            assert!(parse_amount(s, 2).is_err(), "should reject {:?}", s);
        }
    }

    #[test]
    fn parse_rejects_overflow() {
        assert!(parse_amount("18446744073709551616", 0).is_err());
        assert!(parse_amount("18446744073709551615", 0).is_ok());
        assert!(parse_amount("99999999999999999999", 9).is_err());
    }

    #[test]
    fn positive_amount_rejects_zero() {
        assert!(parse_positive_amount("0", 2).is_err());
        assert!(parse_positive_amount("0.00", 2).is_err());
        assert_eq!(parse_positive_amount("0.01", 2).unwrap(), 1);
    }

    #[test]
    fn format_roundtrip() {
        assert_eq!(format_base_units(10_000, 2), "100.00");
        assert_eq!(format_base_units(123, 2), "1.23");
        assert_eq!(format_base_units(5, 0), "5");
        assert_eq!(format_base_units(1, 9), "0.000000001");
    }

    #[test]
    fn symbol_normalizes_upper() {
        assert_eq!(normalize_symbol("tst").unwrap(), "TST");
        assert_eq!(normalize_symbol("  sol ").unwrap(), "SOL");
    }

    #[test]
    fn symbol_limits() {
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("ABCDEFGHIJ").is_ok());
        assert!(normalize_symbol("ABCDEFGHIJK").is_err());
    }

    #[test]
    fn name_and_decimals() {
        assert!(validate_name("").is_err());
        assert_eq!(validate_name(" Test ").unwrap(), "Test");
        assert_eq!(validate_decimals(9).unwrap(), 9);
        assert!(validate_decimals(10).is_err());
    }
}
