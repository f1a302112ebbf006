//! Input normalization shared by the services and the CLI

use crate::constants::{
    MAX_PROCESSING_DESCRIPTION_CHARS, MIN_TOKEN_LENGTH, NIP_LENGTH, TOKEN_MASK_EDGE,
};
use crate::errors::{KsefError, Result};

/// Strip dashes and spaces from a NIP and require exactly ten digits.
///
/// # Errors
/// `KsefError::Config` when the input is empty or not a ten-digit number.
pub fn normalize_nip(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(KsefError::Config("tax identifier (NIP) is missing".into()));
    }

    let normalized: String = raw.chars().filter(|c| *c != '-' && !c.is_whitespace()).collect();

    if normalized.len() != NIP_LENGTH || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return Err(KsefError::Config(format!(
            "invalid NIP format: {raw}; exactly {NIP_LENGTH} digits required"
        )));
    }

    Ok(normalized)
}

/// Trim an API token and enforce the minimum length.
///
/// # Errors
/// `KsefError::InvalidInput` when the token is shorter than
/// [`MIN_TOKEN_LENGTH`] characters after trimming.
pub fn validate_api_token(raw: &str) -> Result<String> {
    let token = raw.trim();
    let length = token.chars().count();
    if length < MIN_TOKEN_LENGTH {
        return Err(KsefError::InvalidInput(format!(
            "token too short ({length} characters, at least {MIN_TOKEN_LENGTH} required); \
             check that the whole token was copied"
        )));
    }
    Ok(token.to_string())
}

/// `first10...last10` rendering of a secret.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= TOKEN_MASK_EDGE * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..TOKEN_MASK_EDGE].iter().collect();
    let tail: String = chars[chars.len() - TOKEN_MASK_EDGE..].iter().collect();
    format!("{head}...{tail}")
}

/// Cut a remote description to the stored maximum, on a char boundary.
pub fn truncate_description(text: &str) -> String {
    text.chars().take(MAX_PROCESSING_DESCRIPTION_CHARS).collect()
}
