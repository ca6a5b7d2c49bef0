//! Lexical analysis: turns document text into normalized index terms.
//!
//! An [`Analyzer`] splits the text with the tokenizer of its [`AnalyzerKind`], lower-cases
//! every token and, for the stemmed kind, reduces it to its English stem. Analyzers are
//! immutable once constructed and are handed to the indexer explicitly.

pub mod tokenizers;

use rust_stemmers::{Algorithm, Stemmer};
use spimi_common::{Result, error::Error};

use tokenizers::{TermLimits, truncate_str, unicode_word, whitespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    /// Unicode word tokenizer, lower-cased.
    UnicodeWord,
    /// Unicode word tokenizer, lower-cased and stemmed (Porter/English).
    UnicodeWordStemmed,
    /// Whitespace tokenizer, lower-cased.
    Whitespace,
}

impl TryFrom<&str> for AnalyzerKind {
    type Error = Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "unicode-word" => Ok(AnalyzerKind::UnicodeWord),
            "unicode-word-stemmed" => Ok(AnalyzerKind::UnicodeWordStemmed),
            "whitespace" => Ok(AnalyzerKind::Whitespace),
            _ => Err(Error::invalid_arg(
                "analyzer",
                format!("Unrecognized analyzer: {name}"),
            )),
        }
    }
}

impl AnalyzerKind {
    pub const fn name(&self) -> &'static str {
        match self {
            AnalyzerKind::UnicodeWord => "unicode-word",
            AnalyzerKind::UnicodeWordStemmed => "unicode-word-stemmed",
            AnalyzerKind::Whitespace => "whitespace",
        }
    }
}

/// Creates an analyzer by name: `"unicode-word"`, `"unicode-word-stemmed"` or
/// `"whitespace"`.
pub fn create_analyzer(name: &str) -> Result<Analyzer> {
    Ok(Analyzer::new(AnalyzerKind::try_from(name)?))
}

/// Tokenizer plus normalization pipeline.
pub struct Analyzer {
    kind: AnalyzerKind,
    limits: TermLimits,
    stemmer: Option<Stemmer>,
}

impl Analyzer {
    pub fn new(kind: AnalyzerKind) -> Analyzer {
        let stemmer = (kind == AnalyzerKind::UnicodeWordStemmed)
            .then(|| Stemmer::create(Algorithm::English));
        Analyzer {
            kind,
            limits: TermLimits::DEFAULT,
            stemmer,
        }
    }

    pub fn kind(&self) -> AnalyzerKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Returns the normalized terms of `text` in order of occurrence, repetitions included.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        self.tokens(text)
            .filter_map(|token| self.normalize(token))
            .collect()
    }

    /// Calls `f` with every normalized term of `text`, stopping at the first error.
    pub fn for_each_term<F>(&self, text: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        for token in self.tokens(text) {
            if let Some(term) = self.normalize(token) {
                f(&term)?;
            }
        }
        Ok(())
    }

    fn tokens<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.kind {
            AnalyzerKind::UnicodeWord | AnalyzerKind::UnicodeWordStemmed => {
                Box::new(unicode_word::tokenize(text, self.limits))
            }
            AnalyzerKind::Whitespace => Box::new(whitespace::tokenize(text, self.limits)),
        }
    }

    fn normalize(&self, token: &str) -> Option<String> {
        let lowered = token.to_lowercase();
        let mut term = match &self.stemmer {
            Some(stemmer) => stemmer.stem(&lowered).into_owned(),
            None => lowered,
        };
        // Case folding may lengthen the token past the limit.
        let len = truncate_str(&term, self.limits.max).len();
        term.truncate(len);
        (!term.is_empty()).then_some(term)
    }
}
