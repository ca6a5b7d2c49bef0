//! Whitespace-separated tokens.

use super::TermLimits;

/// Splits `input` on Unicode whitespace only; punctuation stays attached to the token.
pub fn tokenize(input: &str, limits: TermLimits) -> impl Iterator<Item = &str> {
    input
        .split_whitespace()
        .filter_map(move |part| limits.apply(part))
}
