use std::io::{BufReader, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use spimi_common::{Result, error::Error, verify_data};

use crate::{
    DocId,
    format::{DICTIONARY_MAGIC, DictionaryEntry, POSTING_SIZE},
};

/// The decoded dictionary file: sorted term entries plus the document table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    documents: Vec<(DocId, String)>,
}

impl Dictionary {
    /// Decodes a dictionary file, validating its layout.
    pub fn read_from<R: Read>(reader: R) -> Result<Dictionary> {
        let mut reader = BufReader::new(reader);
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(map_read_error)?;
        if &magic != DICTIONARY_MAGIC {
            return Err(Error::invalid_format(
                "dictionary",
                "not a dictionary file (bad magic)",
            ));
        }

        let term_count = read_u32(&mut reader)?;
        let mut entries: Vec<DictionaryEntry> =
            Vec::with_capacity((term_count as usize).min(1 << 16));
        for _ in 0..term_count {
            let term = read_string(&mut reader)?;
            let doc_freq = read_u32(&mut reader)?;
            let offset = reader
                .read_u64::<LittleEndian>()
                .map_err(map_read_error)?;
            if let Some(last) = entries.last() {
                if last.term >= term {
                    return Err(Error::invalid_format(
                        "dictionary",
                        format!("terms are not ascending: '{term}' follows '{}'", last.term),
                    ));
                }
            }
            verify_data!(doc_freq, doc_freq > 0);
            entries.push(DictionaryEntry {
                term,
                doc_freq,
                offset,
            });
        }

        let document_count = read_u32(&mut reader)?;
        let mut documents: Vec<(DocId, String)> =
            Vec::with_capacity((document_count as usize).min(1 << 16));
        for _ in 0..document_count {
            let doc_id = DocId::new(read_u32(&mut reader)?);
            let name = read_string(&mut reader)?;
            verify_data!(
                documents,
                documents.last().is_none_or(|(last, _)| *last < doc_id)
            );
            documents.push((doc_id, name));
        }

        let mut byte = [0u8; 1];
        if reader.read(&mut byte).map_err(|e| Error::io("dictionary", e))? != 0 {
            return Err(Error::invalid_format(
                "dictionary",
                "trailing data after the document table",
            ));
        }

        Ok(Dictionary { entries, documents })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a term (exact match).
    pub fn get(&self, term: &str) -> Option<&DictionaryEntry> {
        self.entries
            .binary_search_by(|entry| entry.term.as_str().cmp(term))
            .ok()
            .map(|pos| &self.entries[pos])
    }

    /// Entries in ascending term order.
    pub fn iter(&self) -> std::slice::Iter<'_, DictionaryEntry> {
        self.entries.iter()
    }

    pub fn documents(&self) -> &[(DocId, String)] {
        &self.documents
    }

    pub fn document_name(&self, doc_id: DocId) -> Option<&str> {
        self.documents
            .binary_search_by_key(&doc_id, |(id, _)| *id)
            .ok()
            .map(|pos| self.documents[pos].1.as_str())
    }

    /// Total number of postings referenced by the dictionary.
    pub fn posting_count(&self) -> u64 {
        self.entries.iter().map(|e| e.doc_freq as u64).sum()
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = &'a DictionaryEntry;
    type IntoIter = std::slice::Iter<'a, DictionaryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Random-access reader of the postings file.
pub struct PostingsReader<R> {
    reader: R,
}

impl<R: Read + Seek> PostingsReader<R> {
    pub fn new(reader: R) -> PostingsReader<R> {
        PostingsReader { reader }
    }

    /// Reads the postings list of a dictionary entry.
    pub fn read(&mut self, entry: &DictionaryEntry) -> Result<Vec<DocId>> {
        let context = || format!("postings of '{}'", entry.term);
        self.reader
            .seek(SeekFrom::Start(entry.offset))
            .map_err(|e| Error::io(context(), e))?;

        let mut buf = vec![0u8; entry.doc_freq as usize * POSTING_SIZE];
        self.reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::invalid_format(context(), "postings file is truncated")
            } else {
                Error::io(context(), e)
            }
        })?;

        let mut postings = Vec::with_capacity(entry.doc_freq as usize);
        for chunk in buf.chunks_exact(POSTING_SIZE) {
            let mut bytes = [0u8; POSTING_SIZE];
            bytes.copy_from_slice(chunk);
            postings.push(DocId::new(u32::from_le_bytes(bytes)));
        }
        Ok(postings)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_u32(reader: &mut impl Read) -> Result<u32> {
    reader.read_u32::<LittleEndian>().map_err(map_read_error)
}

fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = reader.read_u16::<LittleEndian>().map_err(map_read_error)? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes).map_err(map_read_error)?;
    String::from_utf8(bytes).map_err(|_| Error::invalid_format("dictionary", "invalid UTF-8"))
}

fn map_read_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::invalid_format("dictionary", "truncated dictionary")
    } else {
        Error::io("dictionary", e)
    }
}
