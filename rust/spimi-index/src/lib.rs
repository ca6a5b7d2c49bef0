//! Memory-bounded inverted index construction.
//!
//! The index is built in two strictly sequential stages:
//!
//! 1. **Block construction**: documents are analyzed into terms and accumulated by the
//!    [`BlockBuilder`] into an in-memory block (term to sorted postings). Before every
//!    insertion the builder charges the estimated memory cost of the new entry against the
//!    block budget; when the budget would be exceeded, the whole block is written to the
//!    [`BlockStore`](spimi_io::BlockStore) as a term-sorted record stream and replaced by an
//!    empty one.
//! 2. **Merge**: one chunked [`BlockDecoder`] per stored block feeds [`merge_blocks`], a
//!    multi-way merge that unions the postings of equal terms across blocks and streams the
//!    result into an [`IndexWriter`], producing the final dictionary and postings files.
//!
//! [`Indexer`] ties both stages together.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use spimi_index::{DocId, Indexer, IndexerConfig, create_analyzer};
//! use spimi_io::memory::SharedBuffer;
//!
//! # fn main() -> spimi_common::Result<()> {
//! # let store = Arc::new(spimi_io_impl::block_store::memory::InMemoryBlockStore::new(1 << 20));
//! let config = IndexerConfig::default();
//! let analyzer = create_analyzer(&config.analyzer)?;
//! let mut indexer = Indexer::new(config, store, analyzer)?;
//! indexer.add_document(DocId::new(1), "doc1", "the cat sat")?;
//! indexer.add_document(DocId::new(2), "doc2", "the dog sat")?;
//!
//! let stats = indexer.finish(SharedBuffer::new(), SharedBuffer::new())?;
//! assert_eq!(stats.terms, 4);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod doc_id;
pub mod format;
pub mod indexer;
pub mod merge;
pub mod read;
pub mod write;

pub use analysis::{Analyzer, create_analyzer};
pub use config::IndexerConfig;
pub use doc_id::DocId;
pub use format::DictionaryEntry;
pub use indexer::{IndexStats, Indexer};
pub use merge::{MergeStats, merge_blocks, union_postings};
pub use read::{
    block_decoder::{BlockDecoder, BlockRecord},
    index::{Dictionary, PostingsReader},
};
pub use write::{
    PostingsSink,
    block::Block,
    block_builder::{BlockBuilder, BuilderStats},
    block_writer::BlockWriter,
    estimate::{FixedEstimator, HeapEstimator, MemoryEstimator},
    index_writer::{IndexWriter, IndexWriterStats},
};
