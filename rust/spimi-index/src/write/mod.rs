//! Index construction: in-memory blocks, their on-disk encoding, and the final index
//! writer fed by the merge.
//!
//! - [`block_builder::BlockBuilder`] accumulates `(term, doc_id)` pairs into a
//!   [`block::Block`] under a memory budget, flushing full blocks to the block store.
//! - [`block_writer::BlockWriter`] encodes one block as a term-sorted record stream.
//! - [`index_writer::IndexWriter`] receives the merged postings through [`PostingsSink`]
//!   and produces the dictionary and postings files.

use spimi_common::Result;

use crate::DocId;

pub mod block;
pub mod block_builder;
pub mod block_writer;
pub mod estimate;
pub mod index_writer;

/// Receiver of merged postings lists, one term at a time.
///
/// For every term, in ascending term order, the producer calls `start_term` once,
/// `push_postings` one or more times with consecutive ascending slices of the term's
/// postings list, and `end_term` once.
pub trait PostingsSink {
    /// Begins a new term. `ordinal` is the zero-based position of the term in the
    /// output dictionary.
    fn start_term(&mut self, ordinal: usize, term: &str) -> Result<()>;

    /// Appends postings to the current term.
    fn push_postings(&mut self, postings: &[DocId]) -> Result<()>;

    /// Completes the current term.
    fn end_term(&mut self) -> Result<()>;
}
