use std::fmt;

/// Identifier of an indexed document.
///
/// Postings lists hold `DocId`s in strictly ascending order without duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocId(u32);

impl DocId {
    pub const fn new(id: u32) -> DocId {
        DocId(id)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> DocId {
        DocId(id)
    }
}

impl From<DocId> for u32 {
    fn from(id: DocId) -> u32 {
        id.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
