use crate::DocId;

/// Memory accounting policy of the block builder.
///
/// Costs are estimates in bytes, computed before the block is mutated.
pub trait MemoryEstimator: Send + Sync {
    /// Cost of adding a new term together with its first posting.
    fn entry_cost(&self, term: &str) -> u64;

    /// Cost of appending one posting to an existing term.
    fn posting_cost(&self) -> u64;
}

/// Estimates the heap footprint of a block entry: the term `String`, its postings `Vec`
/// and the hash table slot holding both.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapEstimator;

impl HeapEstimator {
    /// Control byte plus the average unused capacity of a hash table slot.
    const SLOT_OVERHEAD: u64 = 8;
}

impl MemoryEstimator for HeapEstimator {
    fn entry_cost(&self, term: &str) -> u64 {
        let slot = std::mem::size_of::<(String, Vec<DocId>)>() as u64;
        slot + Self::SLOT_OVERHEAD + term.len() as u64 + self.posting_cost()
    }

    fn posting_cost(&self) -> u64 {
        std::mem::size_of::<DocId>() as u64
    }
}

/// Constant costs per entry and per posting, independent of the term.
#[derive(Debug, Clone, Copy)]
pub struct FixedEstimator {
    pub entry: u64,
    pub posting: u64,
}

impl MemoryEstimator for FixedEstimator {
    fn entry_cost(&self, _term: &str) -> u64 {
        self.entry
    }

    fn posting_cost(&self) -> u64 {
        self.posting
    }
}
