use byteorder::{LittleEndian, WriteBytesExt};
use spimi_common::{Result, error::Error, verify_arg};
use spimi_io::SealingWrite;

use crate::{
    DocId,
    format::{DICTIONARY_MAGIC, DictionaryEntry, MAX_TERM_LENGTH, POSTING_SIZE},
    write::PostingsSink,
};

/// Summary of the files produced by an [`IndexWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexWriterStats {
    pub terms: u64,
    pub postings: u64,
    pub dictionary_bytes: u64,
    pub postings_bytes: u64,
}

/// Writes the final index: postings are streamed to the postings output as they arrive,
/// dictionary entries are collected and written by [`finish`](IndexWriter::finish).
pub struct IndexWriter<D, P> {
    dictionary_out: D,
    postings_out: P,
    entries: Vec<DictionaryEntry>,
    current: Option<DictionaryEntry>,
    last_doc: Option<DocId>,
    offset: u64,
    buf: Vec<u8>,
}

impl<D: SealingWrite, P: SealingWrite> IndexWriter<D, P> {
    const BUFFER_SIZE: usize = 64 * 1024;

    pub fn new(dictionary_out: D, postings_out: P) -> IndexWriter<D, P> {
        IndexWriter {
            dictionary_out,
            postings_out,
            entries: Vec::new(),
            current: None,
            last_doc: None,
            offset: 0,
            buf: Vec::with_capacity(Self::BUFFER_SIZE),
        }
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    /// Seals the postings output, then writes and seals the dictionary, including the
    /// document table `documents` (sorted by id on output).
    pub fn finish(mut self, documents: &[(DocId, String)]) -> Result<IndexWriterStats> {
        if self.current.is_some() {
            return Err(Error::invalid_operation("finish inside of a term"));
        }
        self.flush_postings()?;
        self.postings_out
            .seal()
            .map_err(|e| Error::io("postings", e))?;

        let mut documents = documents.iter().collect::<Vec<_>>();
        documents.sort_unstable_by_key(|(id, _)| *id);
        verify_arg!(documents, documents.windows(2).all(|w| w[0].0 < w[1].0));

        let dictionary = encode_dictionary(&self.entries, &documents)?;
        self.dictionary_out
            .write_all(&dictionary)
            .map_err(|e| Error::io("dictionary", e))?;
        self.dictionary_out
            .seal()
            .map_err(|e| Error::io("dictionary", e))?;

        let stats = IndexWriterStats {
            terms: self.entries.len() as u64,
            postings: self.offset / POSTING_SIZE as u64,
            dictionary_bytes: dictionary.len() as u64,
            postings_bytes: self.offset,
        };
        log::info!(
            "Wrote index: {} terms, {} postings, dictionary {} bytes, postings {} bytes",
            stats.terms,
            stats.postings,
            stats.dictionary_bytes,
            stats.postings_bytes
        );
        Ok(stats)
    }

    fn flush_postings(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.postings_out
                .write_all(&self.buf)
                .map_err(|e| Error::io("postings", e))?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl<D: SealingWrite, P: SealingWrite> PostingsSink for IndexWriter<D, P> {
    fn start_term(&mut self, ordinal: usize, term: &str) -> Result<()> {
        if self.current.is_some() {
            return Err(Error::invalid_operation("start_term inside of a term"));
        }
        verify_arg!(ordinal, ordinal == self.entries.len());
        verify_arg!(term, !term.is_empty() && term.len() <= MAX_TERM_LENGTH);
        if let Some(last) = self.entries.last() {
            if last.term.as_str() >= term {
                return Err(Error::invalid_arg(
                    "term",
                    format!("'{term}' does not follow '{}'", last.term),
                ));
            }
        }
        self.current = Some(DictionaryEntry {
            term: term.to_string(),
            doc_freq: 0,
            offset: self.offset,
        });
        self.last_doc = None;
        Ok(())
    }

    fn push_postings(&mut self, postings: &[DocId]) -> Result<()> {
        let entry = self
            .current
            .as_mut()
            .ok_or_else(|| Error::invalid_operation("push_postings outside of a term"))?;
        for &doc_id in postings {
            if self.last_doc.is_some_and(|last| last >= doc_id) {
                return Err(Error::invalid_arg(
                    "postings",
                    format!("postings of '{}' are not strictly ascending", entry.term),
                ));
            }
            self.last_doc = Some(doc_id);
            self.buf.write_u32::<LittleEndian>(doc_id.as_u32())?;
        }
        entry.doc_freq = u32::try_from(entry.doc_freq as usize + postings.len())
            .map_err(|_| Error::invalid_arg("postings", "document frequency overflow"))?;
        self.offset += (postings.len() * POSTING_SIZE) as u64;
        if self.buf.len() >= Self::BUFFER_SIZE {
            self.flush_postings()?;
        }
        Ok(())
    }

    fn end_term(&mut self) -> Result<()> {
        let entry = self
            .current
            .take()
            .ok_or_else(|| Error::invalid_operation("end_term outside of a term"))?;
        if entry.doc_freq == 0 {
            return Err(Error::invalid_arg(
                "postings",
                format!("term '{}' has no postings", entry.term),
            ));
        }
        self.entries.push(entry);
        Ok(())
    }
}

fn encode_dictionary(
    entries: &[DictionaryEntry],
    documents: &[&(DocId, String)],
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(DICTIONARY_MAGIC);
    buf.write_u32::<LittleEndian>(count_u32(entries.len(), "terms")?)?;
    for entry in entries {
        buf.write_u16::<LittleEndian>(entry.term.len() as u16)?;
        buf.extend_from_slice(entry.term.as_bytes());
        buf.write_u32::<LittleEndian>(entry.doc_freq)?;
        buf.write_u64::<LittleEndian>(entry.offset)?;
    }

    buf.write_u32::<LittleEndian>(count_u32(documents.len(), "documents")?)?;
    for (doc_id, name) in documents.iter().copied() {
        if name.len() > MAX_TERM_LENGTH {
            return Err(Error::invalid_arg(
                "documents",
                format!("document name of {} bytes is too long", name.len()),
            ));
        }
        buf.write_u32::<LittleEndian>(doc_id.as_u32())?;
        buf.write_u16::<LittleEndian>(name.len() as u16)?;
        buf.extend_from_slice(name.as_bytes());
    }
    Ok(buf)
}

fn count_u32(count: usize, name: &str) -> Result<u32> {
    u32::try_from(count).map_err(|_| Error::invalid_arg(name, "count does not fit into u32"))
}
