//! Binary layout of the block, dictionary and postings files.
//!
//! All integers are little-endian.
//!
//! Block file:
//! ```text
//! "SPB1" | record_count: u32 | record*
//! record: term_len: u16 | term: [u8; term_len] | count: u32 | doc_id: u32 * count
//! ```
//! Records are sorted by term (strictly ascending, byte-wise) and every postings list is
//! strictly ascending and non-empty.
//!
//! Dictionary file:
//! ```text
//! "SPD1" | term_count: u32 | entry* | document_count: u32 | document*
//! entry: term_len: u16 | term | doc_freq: u32 | offset: u64
//! document: doc_id: u32 | name_len: u16 | name
//! ```
//!
//! Postings file: concatenated postings lists, `doc_freq` `u32` values starting at the byte
//! `offset` recorded in the dictionary entry.

pub const BLOCK_MAGIC: &[u8; 4] = b"SPB1";
pub const DICTIONARY_MAGIC: &[u8; 4] = b"SPD1";

/// Longest term (and document name) the file formats can represent, in bytes.
pub const MAX_TERM_LENGTH: usize = u16::MAX as usize;

/// Size of one encoded posting in the block and postings files.
pub const POSTING_SIZE: usize = std::mem::size_of::<u32>();

/// Encoded size of a block record with the given term and postings count.
pub fn block_record_size(term_len: usize, postings: usize) -> usize {
    2 + term_len + 4 + postings * POSTING_SIZE
}

/// Dictionary entry of the final index: the term, its document frequency and the byte
/// offset of its postings list in the postings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub term: String,
    pub doc_freq: u32,
    pub offset: u64,
}

impl DictionaryEntry {
    /// Byte range of the postings list within the postings file.
    pub fn postings_range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.doc_freq as u64 * POSTING_SIZE as u64
    }
}
