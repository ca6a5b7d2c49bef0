//! Multi-way merge of block files into the final index.

use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, binary_heap::PeekMut},
};

use spimi_common::Result;

use crate::{
    DocId,
    read::block_decoder::{BlockDecoder, BlockRecord},
    write::PostingsSink,
};

/// Counters reported by [`merge_blocks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of merged block streams.
    pub blocks: usize,
    /// Distinct terms emitted.
    pub terms: u64,
    /// Postings emitted, after cross-block deduplication.
    pub postings: u64,
    /// Postings read from the blocks.
    pub input_postings: u64,
}

/// Computes the set union of strictly ascending postings lists.
///
/// The result is strictly ascending: a document listed by several inputs appears once.
pub fn union_postings(lists: &[&[DocId]]) -> Vec<DocId> {
    match lists {
        [] => Vec::new(),
        [single] => single.to_vec(),
        _ => {
            let total = lists.iter().map(|list| list.len()).sum();
            let mut result = Vec::with_capacity(total);
            let mut heap = lists
                .iter()
                .enumerate()
                .filter_map(|(i, list)| list.first().map(|&doc| Reverse((doc, i, 0usize))))
                .collect::<BinaryHeap<_>>();

            while let Some(Reverse((doc, i, pos))) = heap.pop() {
                if result.last() != Some(&doc) {
                    result.push(doc);
                }
                if let Some(&next) = lists[i].get(pos + 1) {
                    heap.push(Reverse((next, i, pos + 1)));
                }
            }
            result
        }
    }
}

/// A block stream positioned at its current record.
struct MergeCursor {
    /// Position of the stream among the merged blocks; breaks ties between equal terms.
    index: usize,
    head: BlockRecord,
    decoder: BlockDecoder,
}

impl PartialEq for MergeCursor {
    fn eq(&self, other: &MergeCursor) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCursor {}

impl Ord for MergeCursor {
    fn cmp(&self, other: &MergeCursor) -> Ordering {
        // `BinaryHeap` is a max-heap: reverse to keep the least term on top.
        (self.head.term.as_str(), self.index)
            .cmp(&(other.head.term.as_str(), other.index))
            .reverse()
    }
}

impl PartialOrd for MergeCursor {
    fn partial_cmp(&self, other: &MergeCursor) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merges block streams into a single term-ordered stream of postings lists.
///
/// The decoders sit in a min-heap keyed by their current term. Every step pops the least
/// term together with all other streams positioned at the same term, emits the union of
/// their postings to `sink` as one term, advances each of those streams by one record, and
/// puts the non-exhausted ones back. A stream whose chunk runs empty refills it on advance.
/// The merge ends when the heap is empty.
///
/// Zero decoders produce an empty output. The mapping from terms to postings does not
/// depend on the order of `decoders`.
pub fn merge_blocks<S>(decoders: Vec<BlockDecoder>, sink: &mut S) -> Result<MergeStats>
where
    S: ?Sized + PostingsSink,
{
    let mut stats = MergeStats {
        blocks: decoders.len(),
        ..Default::default()
    };

    let mut heap = BinaryHeap::with_capacity(decoders.len());
    for (index, mut decoder) in decoders.into_iter().enumerate() {
        if let Some(head) = decoder.next_record()? {
            heap.push(MergeCursor {
                index,
                head,
                decoder,
            });
        } else {
            log::debug!("{} is empty", decoder.name());
        }
    }

    // Cursors positioned at the current term; reused across terms.
    let mut group: Vec<MergeCursor> = Vec::with_capacity(heap.len());
    let mut ordinal = 0;
    while let Some(first) = heap.pop() {
        group.push(first);
        while let Some(top) = heap.peek_mut() {
            if top.head.term != group[0].head.term {
                break;
            }
            group.push(PeekMut::pop(top));
        }

        let lists = group
            .iter()
            .map(|cursor| cursor.head.postings.as_slice())
            .collect::<Vec<_>>();
        let postings = union_postings(&lists);
        stats.input_postings += lists.iter().map(|list| list.len() as u64).sum::<u64>();
        stats.postings += postings.len() as u64;

        sink.start_term(ordinal, &group[0].head.term)?;
        sink.push_postings(&postings)?;
        sink.end_term()?;
        ordinal += 1;
        stats.terms += 1;

        for mut cursor in group.drain(..) {
            if let Some(head) = cursor.decoder.next_record()? {
                cursor.head = head;
                heap.push(cursor);
            }
        }
    }

    log::info!(
        "Merged {} blocks: {} terms, {} postings ({} before deduplication)",
        stats.blocks,
        stats.terms,
        stats.postings,
        stats.input_postings
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::write::{block::Block, block_writer::encode_block};

    fn ids(values: &[u32]) -> Vec<DocId> {
        values.iter().copied().map(DocId::new).collect()
    }

    #[derive(Debug, Default)]
    struct TestSink {
        terms: Vec<(usize, String, Vec<DocId>)>,
        open: bool,
    }

    impl PostingsSink for TestSink {
        fn start_term(&mut self, ordinal: usize, term: &str) -> Result<()> {
            assert!(!self.open);
            self.open = true;
            self.terms.push((ordinal, term.to_string(), Vec::new()));
            Ok(())
        }

        fn push_postings(&mut self, postings: &[DocId]) -> Result<()> {
            assert!(self.open);
            self.terms.last_mut().unwrap().2.extend_from_slice(postings);
            Ok(())
        }

        fn end_term(&mut self) -> Result<()> {
            assert!(self.open);
            self.open = false;
            Ok(())
        }
    }

    fn decoder(entries: &[(&str, &[u32])], chunk_size: usize) -> BlockDecoder {
        let mut block = Block::new();
        for (term, values) in entries {
            for &id in values.iter() {
                block.insert(term, DocId::new(id));
            }
        }
        let mut data = Vec::new();
        encode_block(&block, &mut data, "test").unwrap();
        BlockDecoder::new("test", Box::new(Cursor::new(data)), chunk_size).unwrap()
    }

    fn merge(decoders: Vec<BlockDecoder>) -> TestSink {
        let mut sink = TestSink::default();
        merge_blocks(decoders, &mut sink).unwrap();
        sink
    }

    #[test]
    fn test_union_postings() {
        assert!(union_postings(&[]).is_empty());

        let single = ids(&[1, 5]);
        assert_eq!(union_postings(&[single.as_slice()]), single);

        let (a, b, c, d) = (ids(&[1, 4, 9]), ids(&[2, 4, 10]), ids(&[]), ids(&[9]));
        assert_eq!(
            union_postings(&[a.as_slice(), b.as_slice(), c.as_slice(), d.as_slice()]),
            ids(&[1, 2, 4, 9, 10])
        );

        let same = ids(&[3]);
        assert_eq!(
            union_postings(&[same.as_slice(), same.as_slice(), same.as_slice()]),
            same
        );
    }

    #[test]
    fn test_merge_no_blocks() {
        let mut sink = TestSink::default();
        let stats = merge_blocks(Vec::new(), &mut sink).unwrap();
        assert!(sink.terms.is_empty());
        assert_eq!(stats, MergeStats::default());
    }

    #[test]
    fn test_merge_single_block() {
        let sink = merge(vec![decoder(&[("the", &[1, 2]), ("cat", &[1])], 1024)]);
        assert_eq!(
            sink.terms,
            vec![
                (0, "cat".to_string(), ids(&[1])),
                (1, "the".to_string(), ids(&[1, 2])),
            ]
        );
    }

    #[test]
    fn test_merge_unions_equal_terms() {
        let sink = merge(vec![
            decoder(&[("the", &[1]), ("cat", &[1]), ("sat", &[1])], 8),
            decoder(&[("the", &[2]), ("dog", &[2]), ("sat", &[2])], 8),
            decoder(&[], 8),
        ]);
        assert_eq!(
            sink.terms,
            vec![
                (0, "cat".to_string(), ids(&[1])),
                (1, "dog".to_string(), ids(&[2])),
                (2, "sat".to_string(), ids(&[1, 2])),
                (3, "the".to_string(), ids(&[1, 2])),
            ]
        );
    }

    #[test]
    fn test_merge_cross_block_duplicates() {
        // The same (term, doc) pair flushed into two blocks must appear once.
        let mut sink = TestSink::default();
        let stats = merge_blocks(
            vec![
                decoder(&[("cat", &[1, 2])], 16),
                decoder(&[("cat", &[2, 3])], 16),
            ],
            &mut sink,
        )
        .unwrap();
        assert_eq!(sink.terms, vec![(0, "cat".to_string(), ids(&[1, 2, 3]))]);
        assert_eq!(stats.postings, 3);
        assert_eq!(stats.input_postings, 4);
    }

    #[test]
    fn test_merge_order_independent() {
        let blocks: [&[(&str, &[u32])]; 3] = [
            &[("apple", &[1, 4]), ("banana", &[2])],
            &[("banana", &[5]), ("cherry", &[5, 6])],
            &[("apple", &[7]), ("date", &[8])],
        ];
        let expected = merge(blocks.iter().map(|b| decoder(b, 1)).collect()).terms;
        for order in [[2, 1, 0], [1, 0, 2], [0, 2, 1]] {
            let sink = merge(order.iter().map(|&i| decoder(blocks[i], 1)).collect());
            assert_eq!(sink.terms, expected);
        }
        assert_eq!(expected[0], (0, "apple".to_string(), ids(&[1, 4, 7])));
    }
}
