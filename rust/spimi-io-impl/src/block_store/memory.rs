use std::{
    collections::BTreeMap,
    io::{self, Cursor, Read},
    sync::{Arc, Mutex, MutexGuard},
};

use spimi_budget_tracker::{Allocation, Budget};
use spimi_io::{BlockStore, SealingWrite};

/// Block store keeping the blocks in memory, charging their bytes against a budget.
///
/// Behaves like the local directory store (write-once blocks, partially written blocks
/// visible to `remove_block` but not to `list_blocks`) and is used as a fast fake in tests.
pub struct InMemoryBlockStore {
    budget: Budget,
    blocks: Arc<Mutex<BTreeMap<u32, Slot>>>,
}

enum Slot {
    Writing,
    Sealed {
        data: Arc<[u8]>,
        _allocation: Allocation,
    },
}

impl InMemoryBlockStore {
    pub fn new(capacity: u64) -> InMemoryBlockStore {
        InMemoryBlockStore {
            budget: Budget::new(capacity),
            blocks: Default::default(),
        }
    }

    pub fn available_space(&self) -> u64 {
        self.budget.remaining()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u32, Slot>> {
        lock_blocks(&self.blocks)
    }
}

fn lock_blocks(blocks: &Mutex<BTreeMap<u32, Slot>>) -> MutexGuard<'_, BTreeMap<u32, Slot>> {
    blocks.lock().unwrap_or_else(|e| e.into_inner())
}

impl BlockStore for InMemoryBlockStore {
    fn create_block(&self, block: u32) -> io::Result<Box<dyn SealingWrite>> {
        let allocation = self.budget.allocate(0)?;
        let mut blocks = self.lock();
        if blocks.contains_key(&block) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("block {block} already exists"),
            ));
        }
        blocks.insert(block, Slot::Writing);
        Ok(Box::new(InMemoryBlockWriter {
            blocks: self.blocks.clone(),
            block,
            data: Vec::new(),
            allocation: Some(allocation),
        }))
    }

    fn open_block(&self, block: u32) -> io::Result<Box<dyn Read + Send>> {
        match self.lock().get(&block) {
            Some(Slot::Sealed { data, .. }) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(Slot::Writing) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block {block} is not sealed"),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("block {block} not found"),
            )),
        }
    }

    fn list_blocks(&self) -> io::Result<Vec<u32>> {
        Ok(self
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Sealed { .. }))
            .map(|(&block, _)| block)
            .collect())
    }

    fn remove_block(&self, block: u32) -> io::Result<()> {
        self.lock().remove(&block);
        Ok(())
    }

    fn reset(&self) -> io::Result<()> {
        self.lock().clear();
        Ok(())
    }
}

struct InMemoryBlockWriter {
    blocks: Arc<Mutex<BTreeMap<u32, Slot>>>,
    block: u32,
    data: Vec<u8>,
    allocation: Option<Allocation>,
}

impl SealingWrite for InMemoryBlockWriter {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let allocation = self
            .allocation
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        allocation.grow(buf.len() as u64)?;
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> io::Result<()> {
        let allocation = self
            .allocation
            .take()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let data: Arc<[u8]> = std::mem::take(&mut self.data).into();
        let mut blocks = lock_blocks(&self.blocks);
        match blocks.get_mut(&self.block) {
            Some(slot) if matches!(slot, Slot::Writing) => {
                *slot = Slot::Sealed {
                    data,
                    _allocation: allocation,
                };
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("block {} was removed while being written", self.block),
            )),
        }
    }
}

impl Drop for InMemoryBlockWriter {
    fn drop(&mut self) {
        if self.allocation.is_some() {
            let mut blocks = lock_blocks(&self.blocks);
            if matches!(blocks.get(&self.block), Some(Slot::Writing)) {
                blocks.remove(&self.block);
            }
        }
    }
}
