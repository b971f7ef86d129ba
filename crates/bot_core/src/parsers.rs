//! Shared user-input parsers

use once_cell::sync::Lazy;
use regex::Regex;

static CURRENCY_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{3}$").unwrap());

// up to 12 integer digits and 2 decimal places (numeric(14, 2))
static SUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d{1,12}(\.\d{1,2})?$").unwrap());

/// Parse a 3-letter currency code, normalizing to uppercase.
pub fn parse_currency_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !CURRENCY_CODE_RE.is_match(trimmed) {
        return None;
    }
    Some(trimmed.to_uppercase())
}

/// Parse a monetary amount. Spaces are ignored and a comma is accepted as the
/// decimal separator.
pub fn parse_number(raw: &str) -> Option<f64> {
    let normalized = raw.replace(' ', "").replace(',', ".");
    if !SUM_RE.is_match(&normalized) {
        return None;
    }
    normalized.parse().ok()
}
