//! Token splitting for the [`Analyzer`](super::Analyzer).
//!
//! Both tokenizers yield slices of the input and apply the same [`TermLimits`].

pub mod unicode_word;
pub mod whitespace;

/// Byte length bounds of a token: shorter tokens are dropped, longer ones are cut at the
/// last character boundary within `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermLimits {
    pub min: usize,
    pub max: usize,
}

impl TermLimits {
    pub const DEFAULT: TermLimits = TermLimits { min: 1, max: 128 };

    /// Applies the limits to one token.
    pub fn apply<'a>(&self, token: &'a str) -> Option<&'a str> {
        (token.len() >= self.min).then(|| truncate_str(token, self.max))
    }
}

impl Default for TermLimits {
    fn default() -> Self {
        TermLimits::DEFAULT
    }
}

/// Cuts `input` to at most `max_len` bytes without splitting a character.
pub fn truncate_str(input: &str, max_len: usize) -> &str {
    if input.len() <= max_len {
        return input;
    }
    let boundary = (0..=max_len)
        .rev()
        .find(|&i| input.is_char_boundary(i))
        .unwrap_or(0);
    &input[..boundary]
}
