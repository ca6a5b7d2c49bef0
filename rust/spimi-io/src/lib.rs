//! I/O abstractions:
//! - `SealingWrite`: sequential writer with a `seal()` operation, committing the write activity.
//! - `BlockStore`: write-once numbered blocks holding the partial indexes spilled by the
//!   block builder.
//!
//! Provides a couple of simple `SealingWrite` implementations: memory-based and file-based.

pub mod block_store;
pub mod file;
pub mod memory;

pub use block_store::BlockStore;

/// A trait for sequential writing with explicit sealing semantics.
///
/// Unlike [`std::io::Write`], the data is not considered complete until
/// [`seal`](SealingWrite::seal) returns successfully: file-backed writers flush and sync,
/// store-backed writers publish the block to readers.
///
/// Implementations must be [`Send`]; the trait does not require [`Sync`] as writers
/// require exclusive access through `&mut self`.
pub trait SealingWrite: Send {
    /// Writes the entire buffer to the underlying storage, appending it to any
    /// previously written data.
    ///
    /// # Errors
    ///
    /// Fails if the underlying storage encounters an I/O error, the writer has already
    /// been sealed, or the storage has no space left.
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Seals the writer, flushing any buffered data and committing it to the
    /// underlying storage.
    ///
    /// Once sealed, the writer does not accept further writes.
    fn seal(&mut self) -> std::io::Result<()>;
}

impl<W: SealingWrite + ?Sized> SealingWrite for &mut W {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        (**self).seal()
    }
}

impl<W: SealingWrite + ?Sized> SealingWrite for Box<W> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        (**self).write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        (**self).seal()
    }
}
