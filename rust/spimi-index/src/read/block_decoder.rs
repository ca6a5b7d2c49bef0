use std::{
    collections::VecDeque,
    io::{BufReader, Read},
};

use byteorder::{LittleEndian, ReadBytesExt};
use spimi_common::{Result, error::Error, try_or_ret_some_err, verify_arg};
use spimi_io::{BlockStore, block_store::block_file_name};

use crate::{
    DocId,
    format::{BLOCK_MAGIC, block_record_size},
};

/// One record of a block file: a term and its postings within that block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub term: String,
    pub postings: Vec<DocId>,
}

/// Streams the records of one block file in chunks of bounded size.
///
/// Decoded records are buffered in a queue holding at most `chunk_size` encoded bytes, or a
/// single record when that record alone is larger. When the queue runs empty and the block
/// has more records, the next chunk is read synchronously.
///
/// The decoder validates the block as it goes: header magic, strictly ascending terms,
/// non-empty strictly ascending postings, and the absence of truncated or trailing data.
/// Violations are reported as `InvalidFormat` errors naming the block file.
pub struct BlockDecoder {
    name: String,
    reader: BufReader<Box<dyn Read + Send>>,
    chunk_size: usize,
    /// Records not yet read from the stream.
    remaining: u32,
    buffer: VecDeque<BlockRecord>,
    buffered_bytes: usize,
    /// Term and postings count of a record whose postings did not fit into the previous
    /// chunk.
    pending: Option<(String, u32)>,
    last_term: Option<String>,
    refills: u64,
}

impl BlockDecoder {
    const READ_BUFFER_SIZE: usize = 64 * 1024;

    /// Opens block `block` of `store` for decoding.
    pub fn open(store: &dyn BlockStore, block: u32, chunk_size: usize) -> Result<BlockDecoder> {
        let name = block_file_name(block);
        let reader = store
            .open_block(block)
            .map_err(|e| Error::io(name.as_str(), e))?;
        BlockDecoder::new(name, reader, chunk_size)
    }

    /// Creates a decoder over an encoded block and reads its header.
    ///
    /// `name` identifies the block in errors and log messages.
    pub fn new(
        name: impl Into<String>,
        reader: Box<dyn Read + Send>,
        chunk_size: usize,
    ) -> Result<BlockDecoder> {
        verify_arg!(chunk_size, chunk_size > 0);
        let name = name.into();
        let mut reader = BufReader::with_capacity(Self::READ_BUFFER_SIZE.min(chunk_size), reader);

        let mut magic = [0u8; 4];
        read_exact(&mut reader, &mut magic, &name)?;
        if &magic != BLOCK_MAGIC {
            return Err(Error::invalid_format(name, "not a block file (bad magic)"));
        }
        let remaining = read_u32(&mut reader, &name)?;

        Ok(BlockDecoder {
            name,
            reader,
            chunk_size,
            remaining,
            buffer: VecDeque::new(),
            buffered_bytes: 0,
            pending: None,
            last_term: None,
            refills: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoded bytes of the records currently buffered.
    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    pub fn buffered_records(&self) -> usize {
        self.buffer.len()
    }

    /// Number of chunks read so far.
    pub fn refills(&self) -> u64 {
        self.refills
    }

    /// Returns the next record, or `None` once the block is exhausted.
    pub fn next_record(&mut self) -> Result<Option<BlockRecord>> {
        if self.buffer.is_empty() {
            self.refill()?;
        }
        match self.buffer.pop_front() {
            Some(record) => {
                self.buffered_bytes -= block_record_size(record.term.len(), record.postings.len());
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn refill(&mut self) -> Result<()> {
        debug_assert!(self.buffer.is_empty());
        if self.remaining == 0 {
            return Ok(());
        }

        while self.remaining != 0 {
            let (term, count) = match self.pending.take() {
                Some(header) => header,
                None => self.read_record_header()?,
            };
            let size = block_record_size(term.len(), count as usize);
            if !self.buffer.is_empty() && self.buffered_bytes + size > self.chunk_size {
                self.pending = Some((term, count));
                break;
            }
            let postings = self.read_postings(&term, count)?;
            self.buffer.push_back(BlockRecord { term, postings });
            self.buffered_bytes += size;
            self.remaining -= 1;
        }

        if self.remaining == 0 {
            self.verify_end()?;
        }
        self.refills += 1;
        log::debug!(
            "Read chunk {} of {}: {} records, {} bytes",
            self.refills,
            self.name,
            self.buffer.len(),
            self.buffered_bytes
        );
        Ok(())
    }

    fn read_record_header(&mut self) -> Result<(String, u32)> {
        let term_len = read_u16(&mut self.reader, &self.name)? as usize;
        let mut term = vec![0u8; term_len];
        read_exact(&mut self.reader, &mut term, &self.name)?;
        let term = String::from_utf8(term)
            .map_err(|_| Error::invalid_format(self.name.as_str(), "term is not valid UTF-8"))?;
        if term.is_empty() {
            return Err(Error::invalid_format(self.name.as_str(), "empty term"));
        }
        if let Some(last) = &self.last_term {
            if last.as_str() >= term.as_str() {
                return Err(Error::invalid_format(
                    self.name.as_str(),
                    format!("terms are not ascending: '{term}' follows '{last}'"),
                ));
            }
        }
        self.last_term = Some(term.clone());

        let count = read_u32(&mut self.reader, &self.name)?;
        if count == 0 {
            return Err(Error::invalid_format(
                self.name.as_str(),
                format!("term '{term}' has no postings"),
            ));
        }
        Ok((term, count))
    }

    fn read_postings(&mut self, term: &str, count: u32) -> Result<Vec<DocId>> {
        let mut postings = Vec::with_capacity((count as usize).min(4096));
        for _ in 0..count {
            let doc_id = DocId::new(read_u32(&mut self.reader, &self.name)?);
            if postings.last().is_some_and(|&last| last >= doc_id) {
                return Err(Error::invalid_format(
                    self.name.as_str(),
                    format!("postings of '{term}' are not strictly ascending"),
                ));
            }
            postings.push(doc_id);
        }
        Ok(postings)
    }

    fn verify_end(&mut self) -> Result<()> {
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte) {
            Ok(0) => Ok(()),
            Ok(_) => Err(Error::invalid_format(
                self.name.as_str(),
                "trailing data after the last record",
            )),
            Err(e) => Err(Error::io(self.name.as_str(), e)),
        }
    }
}

impl Iterator for BlockDecoder {
    type Item = Result<BlockRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        try_or_ret_some_err!(self.next_record()).map(Ok)
    }
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], name: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| map_read_error(e, name))
}

fn read_u16(reader: &mut impl Read, name: &str) -> Result<u16> {
    reader
        .read_u16::<LittleEndian>()
        .map_err(|e| map_read_error(e, name))
}

fn read_u32(reader: &mut impl Read, name: &str) -> Result<u32> {
    reader
        .read_u32::<LittleEndian>()
        .map_err(|e| map_read_error(e, name))
}

fn map_read_error(e: std::io::Error, name: &str) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::invalid_format(name, "truncated block")
    } else {
        Error::io(name, e)
    }
}
