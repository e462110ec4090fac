//! Post reference validation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

/// Accepted post references: `http(s)://[www.](twitter.com|x.com)/<handle>/status/<id>`
///
/// Anchored at the start only; trailing query strings or path segments are allowed.
static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(www\.)?(twitter\.com|x\.com)/[A-Za-z0-9_]+/status/[0-9]+")
        .expect("reference pattern is a valid regex")
});

/// True when `s` is a well-formed reference to a post on X (Twitter)
pub fn is_valid_reference(s: &str) -> bool {
    REFERENCE_PATTERN.is_match(s)
}

/// Trim user input and check it, returning the trimmed reference
pub fn validate_reference(raw: &str) -> Result<&str, ValidationError> {
    let reference = raw.trim();
    if reference.is_empty() {
        return Err(ValidationError::EmptyReference);
    }
    if !is_valid_reference(reference) {
        return Err(ValidationError::InvalidReference);
    }
    Ok(reference)
}
