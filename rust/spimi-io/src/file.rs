use std::{
    ffi::OsString,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::SealingWrite;

/// Buffered file writer; sealing flushes the buffer and syncs the file to disk.
///
/// A staged writer (see [`create_staged`](FileWriter::create_staged)) writes to a sibling
/// `.tmp` file and only renames it onto the target when sealed. Dropping it unsealed
/// deletes the staging file and leaves the target untouched.
pub struct FileWriter {
    file: Option<BufWriter<File>>,
    staged: Option<Staged>,
}

struct Staged {
    staging: PathBuf,
    target: PathBuf,
}

impl FileWriter {
    const BUFFER_SIZE: usize = 64 * 1024;

    pub fn new(file: File) -> FileWriter {
        FileWriter {
            file: Some(BufWriter::with_capacity(Self::BUFFER_SIZE, file)),
            staged: None,
        }
    }

    /// Creates a writer whose data replaces `path` only once sealed.
    ///
    /// Fails with [`std::io::ErrorKind::AlreadyExists`] if the staging file exists, that
    /// is, another staged writer for `path` is still open.
    pub fn create_staged<P: AsRef<Path>>(path: P) -> std::io::Result<FileWriter> {
        let target = path.as_ref().to_path_buf();
        let staging = staging_path(&target);
        let mut writer = FileWriter::new(File::create_new(&staging)?);
        writer.staged = Some(Staged { staging, target });
        Ok(writer)
    }
}

/// The sibling `<name>.tmp` path a staged writer of `path` writes to.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl SealingWrite for FileWriter {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?
            .write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        let file = file.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);
        if let Some(staged) = &self.staged {
            std::fs::rename(&staged.staging, &staged.target)?;
            self.staged = None;
        }
        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let Some(staged) = self.staged.take() {
            drop(self.file.take());
            let _ = std::fs::remove_file(&staged.staging);
        }
    }
}
