use std::io::Read;

use crate::SealingWrite;

/// Storage for the numbered blocks produced during index construction.
///
/// Blocks are write-once: a block is created, written through the returned
/// [`SealingWrite`], sealed, and afterwards only read, enumerated or removed.
/// Block numbers are assigned by the caller and start at 1.
pub trait BlockStore: Send + Sync + 'static {
    /// Creates a new, empty block.
    ///
    /// Fails with [`std::io::ErrorKind::AlreadyExists`] if the block was already created
    /// and has not been removed since. The block becomes visible to
    /// [`list_blocks`](BlockStore::list_blocks) and [`open_block`](BlockStore::open_block)
    /// once the writer is sealed; dropping the writer unsealed discards it.
    fn create_block(&self, block: u32) -> std::io::Result<Box<dyn SealingWrite>>;

    /// Opens a sealed block for sequential reading from its beginning.
    fn open_block(&self, block: u32) -> std::io::Result<Box<dyn Read + Send>>;

    /// Returns the numbers of all sealed blocks in ascending order.
    fn list_blocks(&self) -> std::io::Result<Vec<u32>>;

    /// Removes a block, sealed or partially written. Removing a missing block is not
    /// an error.
    fn remove_block(&self, block: u32) -> std::io::Result<()>;

    /// Removes all blocks, leaving the store empty.
    fn reset(&self) -> std::io::Result<()>;
}

/// Name of the file (or entry) holding the given block.
pub fn block_file_name(block: u32) -> String {
    format!("block_{block}")
}

/// Parses a block number back from a name produced by [`block_file_name`].
pub fn parse_block_file_name(name: &str) -> Option<u32> {
    let number = name.strip_prefix("block_")?;
    if number.starts_with('+') {
        return None;
    }
    number.parse().ok()
}
