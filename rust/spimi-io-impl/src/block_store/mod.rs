//! Local-directory and in-memory implementations of the `BlockStore`.

use std::{path::Path, sync::Arc};

use spimi_io::BlockStore;

pub mod fs;
pub mod memory;
#[cfg(test)]
mod tests;

/// Opens a block store over `dir`, deleting whatever the directory held before.
pub fn create_local(dir: &Path) -> std::io::Result<Arc<dyn BlockStore>> {
    Ok(Arc::new(fs::LocalBlockStore::open_clean(dir)?))
}

/// Creates an in-memory block store holding at most `capacity` bytes of block data.
pub fn create_in_memory(capacity: u64) -> std::io::Result<Arc<dyn BlockStore>> {
    Ok(Arc::new(memory::InMemoryBlockStore::new(capacity)))
}
