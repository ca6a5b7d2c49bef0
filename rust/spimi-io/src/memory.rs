use std::sync::{Arc, Mutex};

use crate::SealingWrite;

impl SealingWrite for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A cloneable in-memory writer: every clone appends to the same buffer, so the
/// content stays observable after the writer itself has been handed away.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<SharedBufferState>>,
}

#[derive(Default)]
struct SharedBufferState {
    data: Vec<u8>,
    sealed: bool,
}

impl SharedBuffer {
    pub fn new() -> SharedBuffer {
        Default::default()
    }

    /// Returns a copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().data.clone()
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SharedBufferState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SealingWrite for SharedBuffer {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let mut state = self.lock();
        if state.sealed {
            return Err(std::io::Error::other("buffer is sealed"));
        }
        state.data.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        self.lock().sealed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_buffer() {
        let buffer = SharedBuffer::new();
        let mut writer: Box<dyn SealingWrite> = Box::new(buffer.clone());
        writer.write_all(b"dict").unwrap();
        assert!(!buffer.is_sealed());
        writer.seal().unwrap();
        assert!(buffer.is_sealed());
        assert_eq!(buffer.contents(), b"dict");
        assert!(writer.write_all(b"more").is_err());
    }

    #[test]
    fn test_vec_through_mut_ref() {
        let mut data = Vec::new();
        {
            let mut writer = &mut data;
            SealingWrite::write_all(&mut writer, b"postings").unwrap();
            writer.seal().unwrap();
        }
        assert_eq!(data, b"postings");
    }
}
