//! Field validators for token deployment parameters
//!
//! This module provides reusable validation functions for the token
//! deployment form fields, plus an aggregate check over a whole
//! [`TokenParams`] value.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Upper bound for the initial supply. Deployment receipts are consumed by a
/// dashboard that round-trips supplies through a 64-bit float path, so the
/// supply is clamped to the largest integer that survives that conversion.
pub const MAX_SAFE_SUPPLY: i128 = 9_007_199_254_740_991;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

lazy_static! {
    /// Stellar account address: 'G' followed by 55 Base32 characters
    /// (uppercase letters and digits 2-7; 0, 1, 8 and 9 never appear).
    static ref ADMIN_WALLET_REGEX: Regex = Regex::new(r"^G[A-Z2-7]{55}$").unwrap();

    /// Token name charset: letters, digits, spaces, hyphens.
    static ref TOKEN_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9 \-]+$").unwrap();

    /// Token symbol: uppercase letters and digits only.
    static ref TOKEN_SYMBOL_REGEX: Regex = Regex::new(r"^[A-Z0-9]{1,12}$").unwrap();

    /// Optional-sign integer literal, any magnitude.
    static ref INTEGER_REGEX: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
}

/// Token deployment parameters as entered in the form. Built once, validated
/// as a whole, never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub initial_supply: String,
    pub admin_wallet: String,
}

/// Outcome of the aggregate parameter check: `valid` iff no field failed,
/// with the first violated-rule message per failing field.
#[derive(Debug, Clone, Serialize)]
pub struct ParamsValidation {
    pub valid: bool,
    pub errors: BTreeMap<String, String>,
}

/// Validate a Stellar account address for the admin wallet.
/// Purely syntactic; no checksum verification is performed.
pub fn validate_admin_wallet(address: &str) -> Result<(), String> {
    let trimmed = address.trim();

    if trimmed.is_empty() {
        return Err("admin wallet is required".to_string());
    }

    if !ADMIN_WALLET_REGEX.is_match(trimmed) {
        return Err(
            "must be a valid Stellar address (56 characters starting with 'G')".to_string()
        );
    }

    Ok(())
}

/// Validate the token name: 1-32 characters; letters, digits, spaces, hyphens.
pub fn validate_token_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if len == 0 {
        return Err("name is required".to_string());
    }
    if len > 32 {
        return Err("name must be at most 32 characters".to_string());
    }
    if !TOKEN_NAME_REGEX.is_match(name) {
        return Err("name may only contain letters, digits, spaces and hyphens".to_string());
    }
    Ok(())
}

/// Validate the token symbol: 1-12 uppercase letters or digits.
pub fn validate_token_symbol(symbol: &str) -> Result<(), String> {
    if symbol.is_empty() {
        return Err("symbol is required".to_string());
    }
    if !TOKEN_SYMBOL_REGEX.is_match(symbol) {
        return Err("symbol must be 1-12 uppercase letters or digits".to_string());
    }
    Ok(())
}

/// Validate the decimal count: integer in [0, 18].
pub fn validate_decimals(decimals: u32) -> Result<(), String> {
    if decimals > 18 {
        return Err("decimals must be between 0 and 18".to_string());
    }
    Ok(())
}

/// Validate the initial supply string: must parse as an integer, be positive,
/// and stay within [`MAX_SAFE_SUPPLY`].
pub fn validate_initial_supply(supply: &str) -> Result<(), String> {
    let trimmed = supply.trim();

    if trimmed.is_empty() {
        return Err("initial supply is required".to_string());
    }

    let parsed: i128 = match trimmed.parse() {
        Ok(value) => value,
        // An integer too large for i128 is far beyond the clamp either way.
        Err(_) if INTEGER_REGEX.is_match(trimmed) => return Err(supply_range_message()),
        Err(_) => return Err("initial supply must be a whole number".to_string()),
    };

    if parsed <= 0 || parsed > MAX_SAFE_SUPPLY {
        return Err(supply_range_message());
    }

    Ok(())
}

fn supply_range_message() -> String {
    format!(
        "initial supply must be a positive integer no larger than {}",
        MAX_SAFE_SUPPLY
    )
}

/// Validate the token description: at most 500 characters, empty allowed.
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        ));
    }
    Ok(())
}

/// Run every field check independently (no short-circuit) and collect the
/// first violated-rule message per field.
pub fn validate_token_params(params: &TokenParams) -> ParamsValidation {
    let mut errors = BTreeMap::new();

    if let Err(message) = validate_token_name(&params.name) {
        errors.insert("name".to_string(), message);
    }
    if let Err(message) = validate_token_symbol(&params.symbol) {
        errors.insert("symbol".to_string(), message);
    }
    if let Err(message) = validate_decimals(params.decimals) {
        errors.insert("decimals".to_string(), message);
    }
    if let Err(message) = validate_initial_supply(&params.initial_supply) {
        errors.insert("initial_supply".to_string(), message);
    }
    if let Err(message) = validate_admin_wallet(&params.admin_wallet) {
        errors.insert("admin_wallet".to_string(), message);
    }

    ParamsValidation {
        valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_WALLET: &str = "GDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";

    #[test]
    fn test_validate_admin_wallet() {
        assert!(validate_admin_wallet(VALID_WALLET).is_ok());

        // Contract addresses start with C, not G
        let contract_id = "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";
        assert!(validate_admin_wallet(contract_id).is_err());

        // Base32 excludes 0, 1, 8 and 9
        let with_zero = "G0LZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";
        assert!(validate_admin_wallet(with_zero).is_err());

        assert!(validate_admin_wallet("GABC123").is_err());
        assert!(validate_admin_wallet("").is_err());
    }

    #[test]
    fn test_validate_token_name() {
        assert!(validate_token_name("My Token-2").is_ok());
        assert!(validate_token_name("").is_err());
        assert!(validate_token_name(&"a".repeat(33)).is_err());
        assert!(validate_token_name("bad!name").is_err());
        assert!(validate_token_name(&"a".repeat(32)).is_ok());
    }

    #[test]
    fn test_validate_token_symbol() {
        assert!(validate_token_symbol("USDC").is_ok());
        assert!(validate_token_symbol("TOKEN2").is_ok());
        assert!(validate_token_symbol("").is_err());
        assert!(validate_token_symbol("usdc").is_err());
        assert!(validate_token_symbol("TOOLONGSYMBOL").is_err());
    }

    #[test]
    fn test_validate_decimals() {
        assert!(validate_decimals(0).is_ok());
        assert!(validate_decimals(7).is_ok());
        assert!(validate_decimals(18).is_ok());
        assert!(validate_decimals(19).is_err());
    }

    #[test]
    fn test_validate_initial_supply() {
        assert!(validate_initial_supply("1").is_ok());
        assert!(validate_initial_supply("1000000").is_ok());
        assert!(validate_initial_supply("9007199254740991").is_ok());

        assert!(validate_initial_supply("9007199254740992").is_err());
        assert!(validate_initial_supply("0").is_err());
        assert!(validate_initial_supply("-5").is_err());
        assert!(validate_initial_supply("").is_err());
        assert!(validate_initial_supply("1.5").is_err());
        assert!(validate_initial_supply("abc").is_err());
        // Magnitudes past i128 still report the range message, not a parse error
        let huge = "9".repeat(60);
        let err = validate_initial_supply(&huge).unwrap_err();
        assert!(err.contains("9007199254740991"));
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("").is_ok());
        assert!(validate_description("A short description").is_ok());
        assert!(validate_description(&"x".repeat(500)).is_ok());
        assert!(validate_description(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_aggregate_reports_every_failing_field() {
        let params = TokenParams {
            name: "".to_string(),
            symbol: "abc".to_string(),
            decimals: 19,
            initial_supply: "-5".to_string(),
            admin_wallet: "bad".to_string(),
        };

        let report = validate_token_params(&params);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 5);
        for field in ["name", "symbol", "decimals", "initial_supply", "admin_wallet"] {
            assert!(report.errors.contains_key(field), "missing key {}", field);
        }
    }

    #[test]
    fn test_aggregate_accepts_valid_params() {
        let params = TokenParams {
            name: "Lumen Rewards".to_string(),
            symbol: "LMR".to_string(),
            decimals: 7,
            initial_supply: "1000000".to_string(),
            admin_wallet: VALID_WALLET.to_string(),
        };

        let report = validate_token_params(&params);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }
}
