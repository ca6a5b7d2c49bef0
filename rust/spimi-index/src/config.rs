use spimi_common::{Result, verify_arg};

use crate::{
    analysis::{self, Analyzer},
    write::block_writer::BlockWriter,
};

/// Tuning knobs of an indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Memory budget of one in-memory block, in estimated bytes.
    pub block_size: u64,
    /// Upper bound on the encoded bytes buffered per block stream during the merge.
    pub chunk_size: usize,
    /// Name of the analyzer, see [`analysis::create_analyzer`].
    pub analyzer: String,
    /// Retries of a block write after a transient I/O failure.
    pub max_retries: u32,
}

impl IndexerConfig {
    pub const DEFAULT_BLOCK_SIZE: u64 = 5_000_000;
    pub const DEFAULT_CHUNK_SIZE: usize = 500_000;
    pub const DEFAULT_ANALYZER: &'static str = "unicode-word-stemmed";

    pub fn validate(&self) -> Result<()> {
        verify_arg!(block_size, self.block_size > 0);
        verify_arg!(chunk_size, self.chunk_size > 0);
        analysis::AnalyzerKind::try_from(self.analyzer.as_str())?;
        Ok(())
    }

    /// Creates the analyzer named by this configuration.
    pub fn create_analyzer(&self) -> Result<Analyzer> {
        analysis::create_analyzer(&self.analyzer)
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            analyzer: Self::DEFAULT_ANALYZER.to_string(),
            max_retries: BlockWriter::DEFAULT_MAX_RETRIES,
        }
    }
}
