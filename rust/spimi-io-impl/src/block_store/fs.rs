use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use spimi_io::{
    BlockStore, SealingWrite,
    block_store::{block_file_name, parse_block_file_name},
    file::{FileWriter, staging_path},
};

/// Block store keeping every block as a `block_{n}` file in a dedicated working
/// directory.
///
/// A block is written as `block_{n}.tmp` and renamed to `block_{n}` when sealed, so
/// only sealed blocks carry a block file name.
pub struct LocalBlockStore {
    dir: PathBuf,
}

impl LocalBlockStore {
    /// Deletes `dir` if it exists and recreates it empty.
    ///
    /// Anything else found in the directory is lost, so `dir` must be reserved for the
    /// block files.
    pub fn open_clean(dir: impl AsRef<Path>) -> io::Result<LocalBlockStore> {
        let store = LocalBlockStore {
            dir: dir.as_ref().to_path_buf(),
        };
        store.reset()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn block_path(&self, block: u32) -> PathBuf {
        self.dir.join(block_file_name(block))
    }
}

impl BlockStore for LocalBlockStore {
    fn create_block(&self, block: u32) -> io::Result<Box<dyn SealingWrite>> {
        let path = self.block_path(block);
        if path.try_exists()? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        Ok(Box::new(FileWriter::create_staged(path)?))
    }

    fn open_block(&self, block: u32) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(self.block_path(block))?;
        Ok(Box::new(file))
    }

    fn list_blocks(&self) -> io::Result<Vec<u32>> {
        let mut blocks = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(block) = entry.file_name().to_str().and_then(parse_block_file_name) {
                blocks.push(block);
            }
        }
        blocks.sort_unstable();
        Ok(blocks)
    }

    fn remove_block(&self, block: u32) -> io::Result<()> {
        let path = self.block_path(block);
        remove_if_exists(&staging_path(&path))?;
        remove_if_exists(&path)
    }

    fn reset(&self) -> io::Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => (),
            Err(e) if e.kind() == io::ErrorKind::NotFound => (),
            Err(e) => return Err(e),
        }
        std::fs::create_dir_all(&self.dir)?;
        log::debug!("Block directory {} is ready", self.dir.display());
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        res => res,
    }
}
