use byteorder::{LittleEndian, WriteBytesExt};
use spimi_common::{Result, error::Error};
use spimi_io::{BlockStore, SealingWrite, block_store::block_file_name};

use crate::{
    DocId,
    format::{BLOCK_MAGIC, MAX_TERM_LENGTH},
    write::block::Block,
};

/// Persists in-memory blocks into a [`BlockStore`].
///
/// Transient I/O failures (interrupted or timed-out calls) are retried a bounded number of
/// times, removing the partially written block before every new attempt. Any other failure
/// is returned to the caller.
#[derive(Debug, Clone)]
pub struct BlockWriter {
    max_retries: u32,
}

impl BlockWriter {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    const WRITE_BUFFER_SIZE: usize = 64 * 1024;

    pub fn new() -> BlockWriter {
        BlockWriter::with_max_retries(Self::DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: u32) -> BlockWriter {
        BlockWriter { max_retries }
    }

    /// Writes `block` as block number `block_number` and seals it.
    ///
    /// Returns the number of bytes written.
    pub fn write(&self, store: &dyn BlockStore, block_number: u32, block: &Block) -> Result<u64> {
        let mut retries = 0;
        loop {
            match Self::write_once(store, block_number, block) {
                Ok(size) => return Ok(size),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    log::warn!(
                        "Transient failure writing {}, retry {retries} of {}: {e}",
                        block_file_name(block_number),
                        self.max_retries
                    );
                    store
                        .remove_block(block_number)
                        .map_err(|e| Error::io(block_file_name(block_number), e))?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn write_once(store: &dyn BlockStore, block_number: u32, block: &Block) -> Result<u64> {
        let name = block_file_name(block_number);
        let mut writer = store
            .create_block(block_number)
            .map_err(|e| Error::io(name.as_str(), e))?;
        encode_block(block, writer.as_mut(), &name)
    }
}

impl Default for BlockWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes `block` into `writer` (see [`crate::format`]) and seals it.
///
/// `name` is used as the context of the returned errors. Returns the number of bytes
/// written.
pub fn encode_block(block: &Block, writer: &mut dyn SealingWrite, name: &str) -> Result<u64> {
    let entries = block.sorted_entries();
    let record_count = u32::try_from(entries.len())
        .map_err(|_| Error::invalid_arg("block", "too many terms in a block"))?;

    let mut buf = Vec::with_capacity(BlockWriter::WRITE_BUFFER_SIZE);
    let mut written = 0u64;
    buf.extend_from_slice(BLOCK_MAGIC);
    buf.write_u32::<LittleEndian>(record_count)?;

    for (term, postings) in entries {
        encode_record(&mut buf, term, postings)?;
        if buf.len() >= BlockWriter::WRITE_BUFFER_SIZE {
            writer.write_all(&buf).map_err(|e| Error::io(name, e))?;
            written += buf.len() as u64;
            buf.clear();
        }
    }

    writer.write_all(&buf).map_err(|e| Error::io(name, e))?;
    written += buf.len() as u64;
    writer.seal().map_err(|e| Error::io(name, e))?;
    Ok(written)
}

fn encode_record(buf: &mut Vec<u8>, term: &str, postings: &[DocId]) -> Result<()> {
    if term.len() > MAX_TERM_LENGTH {
        return Err(Error::invalid_arg(
            "term",
            format!("term of {} bytes exceeds {MAX_TERM_LENGTH}", term.len()),
        ));
    }
    let count = u32::try_from(postings.len())
        .map_err(|_| Error::invalid_arg("postings", "too many postings for a term"))?;
    debug_assert!(count > 0);
    debug_assert!(postings.windows(2).all(|w| w[0] < w[1]));

    buf.write_u16::<LittleEndian>(term.len() as u16)?;
    buf.extend_from_slice(term.as_bytes());
    buf.write_u32::<LittleEndian>(count)?;
    for doc_id in postings {
        buf.write_u32::<LittleEndian>(doc_id.as_u32())?;
    }
    Ok(())
}
