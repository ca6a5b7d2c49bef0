//! Words delimited by UAX #29 word boundaries.

use unicode_segmentation::UnicodeSegmentation;

use super::TermLimits;

/// Yields the words of `input`, skipping punctuation and whitespace segments.
///
/// Contractions and numbers with separators stay in one piece ("can't", "3.14").
pub fn tokenize(input: &str, limits: TermLimits) -> impl Iterator<Item = &str> {
    input
        .unicode_words()
        .filter_map(move |word| limits.apply(word))
}
