//! Decoding of block files (for the merge) and of the final dictionary and postings
//! files.

pub mod block_decoder;
pub mod index;
