use std::sync::Arc;

use spimi_budget_tracker::{Allocation, Budget};
use spimi_common::{Result, error::Error, verify_arg};
use spimi_io::{BlockStore, block_store::block_file_name};

use crate::{
    DocId,
    format::MAX_TERM_LENGTH,
    write::{
        block::{Block, Placement},
        block_writer::BlockWriter,
        estimate::MemoryEstimator,
    },
};

/// Counters describing the blocks flushed by a [`BlockBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuilderStats {
    /// Number of blocks written.
    pub blocks: u32,
    /// Blocks holding a single entry whose estimated cost exceeds the block budget.
    pub oversized_blocks: u32,
    /// Postings written across all blocks.
    pub postings: u64,
    /// Encoded bytes written across all blocks.
    pub flushed_bytes: u64,
}

/// Accumulates postings into an in-memory [`Block`] without exceeding a memory budget.
///
/// Every insertion is priced by the [`MemoryEstimator`] and charged against the block
/// budget before the block is touched. When the charge would overrun the budget, the
/// entire block is flushed to the store under the next block number (starting at 1) and
/// replaced by an empty one.
///
/// An entry that does not fit even into an empty block is placed alone into its own block,
/// which is flushed right away.
pub struct BlockBuilder {
    store: Arc<dyn BlockStore>,
    estimator: Box<dyn MemoryEstimator>,
    writer: BlockWriter,
    budget: Budget,
    allocation: Allocation,
    block: Block,
    next_block: u32,
    stats: BuilderStats,
}

impl BlockBuilder {
    pub fn new(
        block_size: u64,
        store: Arc<dyn BlockStore>,
        estimator: Box<dyn MemoryEstimator>,
    ) -> Result<BlockBuilder> {
        verify_arg!(block_size, block_size > 0);
        let budget = Budget::new(block_size);
        let allocation = budget.allocate(0).map_err(|e| {
            Error::from(spimi_common::error::ErrorKind::BudgetExceeded {
                requested: e.requested,
                remaining: e.remaining,
            })
        })?;
        Ok(BlockBuilder {
            store,
            estimator,
            writer: BlockWriter::new(),
            budget,
            allocation,
            block: Block::new(),
            next_block: 1,
            stats: Default::default(),
        })
    }

    pub fn with_writer(mut self, writer: BlockWriter) -> BlockBuilder {
        self.writer = writer;
        self
    }

    /// Records that `doc_id` contains `term`. Repeated calls with the same pair are
    /// no-ops.
    pub fn accumulate(&mut self, term: &str, doc_id: DocId) -> Result<()> {
        if term.is_empty() || term.len() > MAX_TERM_LENGTH {
            return Err(Error::invalid_arg(
                "term",
                format!(
                    "term length {} is outside of 1..={MAX_TERM_LENGTH}",
                    term.len()
                ),
            ));
        }

        match self.block.placement(term, doc_id) {
            Placement::Present => Ok(()),
            Placement::NewPosting => {
                if self.allocation.grow(self.estimator.posting_cost()).is_ok() {
                    self.block.insert(term, doc_id);
                    Ok(())
                } else {
                    self.flush()?;
                    self.insert_entry(term, doc_id)
                }
            }
            Placement::NewTerm => self.insert_entry(term, doc_id),
        }
    }

    /// Flushes the current block unless it is empty.
    pub fn flush_if_nonempty(&mut self) -> Result<()> {
        if self.block.is_empty() {
            Ok(())
        } else {
            self.flush()
        }
    }

    /// The block currently being accumulated.
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Estimated memory charged for the current block.
    pub fn memory_used(&self) -> u64 {
        self.allocation.amount()
    }

    pub fn block_size(&self) -> u64 {
        self.budget.capacity()
    }

    pub fn stats(&self) -> &BuilderStats {
        &self.stats
    }

    fn insert_entry(&mut self, term: &str, doc_id: DocId) -> Result<()> {
        let cost = self.estimator.entry_cost(term);
        if self.allocation.grow(cost).is_err() {
            self.flush_if_nonempty()?;
            if self.allocation.grow(cost).is_err() {
                log::warn!(
                    "Entry for term '{term}' costs {cost} bytes, more than the block budget of {} \
                     bytes; writing it as a single-entry block",
                    self.budget.capacity()
                );
                self.block.insert(term, doc_id);
                self.stats.oversized_blocks += 1;
                return self.flush();
            }
        }
        self.block.insert(term, doc_id);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let block = std::mem::take(&mut self.block);
        let block_number = self.next_block;
        let size = self.writer.write(self.store.as_ref(), block_number, &block)?;
        log::info!(
            "Flushed {}: {} terms, {} postings, {size} bytes (estimated {} bytes in memory)",
            block_file_name(block_number),
            block.term_count(),
            block.posting_count(),
            self.allocation.amount()
        );

        self.next_block += 1;
        self.allocation.release();
        self.stats.blocks += 1;
        self.stats.postings += block.posting_count() as u64;
        self.stats.flushed_bytes += size;
        Ok(())
    }
}
