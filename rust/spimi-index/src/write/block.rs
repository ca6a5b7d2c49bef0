use std::collections::HashMap;

use crate::DocId;

/// In-memory partial index: term to strictly ascending, duplicate-free postings.
///
/// A block is owned by the [`BlockBuilder`](super::block_builder::BlockBuilder) and
/// replaced by a fresh one whenever it is flushed.
#[derive(Debug, Default)]
pub struct Block {
    entries: HashMap<String, Vec<DocId>>,
    posting_count: usize,
}

/// Outcome of inserting a `(term, doc_id)` pair into a [`Block`], known before mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The term is not in the block yet.
    NewTerm,
    /// The term exists but does not list the document yet.
    NewPosting,
    /// The pair is already recorded.
    Present,
}

impl Block {
    pub fn new() -> Block {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.entries.len()
    }

    pub fn posting_count(&self) -> usize {
        self.posting_count
    }

    pub fn postings(&self, term: &str) -> Option<&[DocId]> {
        self.entries.get(term).map(|postings| postings.as_slice())
    }

    /// Determines what inserting `(term, doc_id)` would do, without changing the block.
    pub fn placement(&self, term: &str, doc_id: DocId) -> Placement {
        match self.entries.get(term) {
            None => Placement::NewTerm,
            Some(postings) if Self::find(postings, doc_id).is_ok() => Placement::Present,
            Some(_) => Placement::NewPosting,
        }
    }

    /// Records that `doc_id` contains `term`. Returns `false` if the pair was already
    /// present.
    pub fn insert(&mut self, term: &str, doc_id: DocId) -> bool {
        let inserted = match self.entries.get_mut(term) {
            Some(postings) => match Self::find(postings, doc_id) {
                Ok(_) => false,
                Err(pos) => {
                    postings.insert(pos, doc_id);
                    true
                }
            },
            None => {
                self.entries.insert(term.to_string(), vec![doc_id]);
                true
            }
        };
        if inserted {
            self.posting_count += 1;
        }
        inserted
    }

    /// Returns the entries sorted by term.
    pub fn sorted_entries(&self) -> Vec<(&str, &[DocId])> {
        let mut entries = self
            .entries
            .iter()
            .map(|(term, postings)| (term.as_str(), postings.as_slice()))
            .collect::<Vec<_>>();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Binary search with a fast path for the common append-at-end case (documents are
    /// usually processed in ascending order).
    fn find(postings: &[DocId], doc_id: DocId) -> std::result::Result<usize, usize> {
        match postings.last() {
            Some(&last) if last < doc_id => Err(postings.len()),
            Some(&last) if last == doc_id => Ok(postings.len() - 1),
            _ => postings.binary_search(&doc_id),
        }
    }
}
