use std::{collections::BTreeMap, sync::Arc};

use spimi_common::{Result, error::Error};
use spimi_io::{BlockStore, SealingWrite};

use crate::{
    Analyzer, DocId, IndexerConfig,
    merge::merge_blocks,
    read::block_decoder::BlockDecoder,
    write::{
        block_builder::BlockBuilder,
        block_writer::BlockWriter,
        estimate::{HeapEstimator, MemoryEstimator},
        index_writer::IndexWriter,
    },
};

/// Outcome of an indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: u64,
    pub blocks: u32,
    pub oversized_blocks: u32,
    pub terms: u64,
    pub postings: u64,
}

/// Builds an inverted index from documents: analysis and block construction while the
/// documents are added, merge and output when [`finish`](Indexer::finish) is called.
pub struct Indexer {
    config: IndexerConfig,
    analyzer: Analyzer,
    store: Arc<dyn BlockStore>,
    builder: BlockBuilder,
    documents: BTreeMap<DocId, String>,
}

impl Indexer {
    /// Creates an indexer using the [`HeapEstimator`] for block memory accounting.
    ///
    /// `store` must not hold any blocks.
    pub fn new(
        config: IndexerConfig,
        store: Arc<dyn BlockStore>,
        analyzer: Analyzer,
    ) -> Result<Indexer> {
        Self::with_estimator(config, store, analyzer, Box::new(HeapEstimator))
    }

    pub fn with_estimator(
        config: IndexerConfig,
        store: Arc<dyn BlockStore>,
        analyzer: Analyzer,
        estimator: Box<dyn MemoryEstimator>,
    ) -> Result<Indexer> {
        config.validate()?;
        let existing = store
            .list_blocks()
            .map_err(|e| Error::io("block store", e))?;
        if !existing.is_empty() {
            return Err(Error::invalid_operation(format!(
                "block store already holds {} blocks",
                existing.len()
            )));
        }
        let builder = BlockBuilder::new(config.block_size, store.clone(), estimator)?
            .with_writer(BlockWriter::with_max_retries(config.max_retries));
        Ok(Indexer {
            config,
            analyzer,
            store,
            builder,
            documents: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Analyzes `text` and accumulates its terms under `doc_id`.
    ///
    /// Document ids must be unique within a run.
    pub fn add_document(&mut self, doc_id: DocId, name: &str, text: &str) -> Result<()> {
        if self.documents.contains_key(&doc_id) {
            return Err(Error::invalid_arg(
                "doc_id",
                format!("document id {doc_id} was already added"),
            ));
        }
        self.documents.insert(doc_id, name.to_string());

        let builder = &mut self.builder;
        self.analyzer
            .for_each_term(text, |term| builder.accumulate(term, doc_id))
    }

    /// Flushes the last block, merges all blocks and writes the dictionary and postings
    /// files.
    pub fn finish<D, P>(mut self, dictionary_out: D, postings_out: P) -> Result<IndexStats>
    where
        D: SealingWrite,
        P: SealingWrite,
    {
        self.builder.flush_if_nonempty()?;
        let builder_stats = *self.builder.stats();

        let blocks = self
            .store
            .list_blocks()
            .map_err(|e| Error::io("block store", e))?;
        log::info!(
            "Indexed {} documents into {} blocks, merging",
            self.documents.len(),
            blocks.len()
        );
        let decoders = blocks
            .iter()
            .map(|&block| BlockDecoder::open(self.store.as_ref(), block, self.config.chunk_size))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = IndexWriter::new(dictionary_out, postings_out);
        let merge_stats = merge_blocks(decoders, &mut writer)?;
        let documents = self.documents.into_iter().collect::<Vec<_>>();
        writer.finish(&documents)?;

        Ok(IndexStats {
            documents: documents.len() as u64,
            blocks: builder_stats.blocks,
            oversized_blocks: builder_stats.oversized_blocks,
            terms: merge_stats.terms,
            postings: merge_stats.postings,
        })
    }
}
