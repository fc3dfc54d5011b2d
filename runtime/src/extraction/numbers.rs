//! Numeric token scanning over page text.

use super::ExtractionThresholds;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("digits regex is valid"));

/// Runs of ASCII digits, in order of appearance.
pub fn numeric_tokens(text: &str) -> impl Iterator<Item = &str> {
    DIGITS_RE.find_iter(text).map(|m| m.as_str())
}

/// First token with at least `min_digits` digits.
pub fn first_long_token(text: &str, min_digits: usize) -> Option<&str> {
    numeric_tokens(text).find(|t| t.len() >= min_digits)
}

/// First token whose value clears the plausibility floor. Tokens too large
/// to represent are logged and passed over.
pub fn first_plausible_token<'a>(text: &'a str, thresholds: &ExtractionThresholds) -> Option<&'a str> {
    numeric_tokens(text).find(|t| match t.parse::<u64>() {
        Ok(v) => thresholds.accepts_value(v),
        Err(e) => {
            warn!("ignoring numeric token {t}: {e}");
            false
        }
    })
}
