#![allow(dead_code)]

use std::{collections::BTreeMap, io::Cursor, sync::Arc};

use spimi_index::{
    DocId, Dictionary, IndexStats, Indexer, IndexerConfig, MemoryEstimator, PostingsReader,
};
use spimi_io::{BlockStore, memory::SharedBuffer};
use spimi_io_impl::block_store::memory::InMemoryBlockStore;

/// Term to postings mapping of a finished index.
pub type Postings = BTreeMap<String, Vec<u32>>;

pub struct BuiltIndex {
    pub stats: IndexStats,
    pub dictionary: Dictionary,
    pub postings: Postings,
    pub dictionary_bytes: Vec<u8>,
    pub postings_bytes: Vec<u8>,
}

pub fn config(block_size: u64, chunk_size: usize, analyzer: &str) -> IndexerConfig {
    IndexerConfig {
        block_size,
        chunk_size,
        analyzer: analyzer.to_string(),
        ..Default::default()
    }
}

pub fn memory_store() -> Arc<dyn BlockStore> {
    Arc::new(InMemoryBlockStore::new(256 * 1024 * 1024))
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn build_index(
    config: IndexerConfig,
    store: Arc<dyn BlockStore>,
    estimator: Option<Box<dyn MemoryEstimator>>,
    documents: &[(u32, &str)],
) -> BuiltIndex {
    init_logging();
    let analyzer = config.create_analyzer().unwrap();
    let mut indexer = match estimator {
        Some(estimator) => Indexer::with_estimator(config, store, analyzer, estimator).unwrap(),
        None => Indexer::new(config, store, analyzer).unwrap(),
    };
    for &(id, text) in documents {
        indexer
            .add_document(DocId::new(id), &format!("doc{id}"), text)
            .unwrap();
    }

    let dictionary_out = SharedBuffer::new();
    let postings_out = SharedBuffer::new();
    let stats = indexer
        .finish(dictionary_out.clone(), postings_out.clone())
        .unwrap();
    assert!(dictionary_out.is_sealed());
    assert!(postings_out.is_sealed());

    let dictionary_bytes = dictionary_out.contents();
    let postings_bytes = postings_out.contents();
    let dictionary = Dictionary::read_from(Cursor::new(&dictionary_bytes)).unwrap();
    let postings = read_postings(&dictionary, &postings_bytes);
    BuiltIndex {
        stats,
        dictionary,
        postings,
        dictionary_bytes,
        postings_bytes,
    }
}

pub fn read_postings(dictionary: &Dictionary, postings: &[u8]) -> Postings {
    let mut reader = PostingsReader::new(Cursor::new(postings));
    dictionary
        .iter()
        .map(|entry| {
            let list = reader.read(entry).unwrap();
            assert_eq!(list.len(), entry.doc_freq as usize);
            (
                entry.term.clone(),
                list.into_iter().map(u32::from).collect::<Vec<_>>(),
            )
        })
        .collect()
}

/// Asserts that every postings list is strictly ascending (sorted, duplicate-free).
pub fn assert_postings_sorted(postings: &Postings) {
    for (term, list) in postings {
        assert!(!list.is_empty(), "empty postings for '{term}'");
        assert!(
            list.windows(2).all(|w| w[0] < w[1]),
            "postings of '{term}' are not strictly ascending: {list:?}"
        );
    }
}

pub fn generate_corpus(seed: u64, documents: usize, vocabulary: usize) -> Vec<(u32, String)> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let words = (0..vocabulary)
        .map(|i| format!("w{i}x{}", rng.u32(..1000)))
        .collect::<Vec<_>>();
    let mut ids = (1..=documents as u32).collect::<Vec<_>>();
    rng.shuffle(&mut ids);
    ids.into_iter()
        .map(|id| {
            let len = rng.usize(1..40);
            let text = (0..len)
                .map(|_| {
                    // Skewed toward the head of the vocabulary.
                    let i = rng.usize(..vocabulary).min(rng.usize(..vocabulary));
                    words[i].as_str()
                })
                .collect::<Vec<_>>()
                .join(" ");
            (id, text)
        })
        .collect()
}

/// Computes the expected mapping directly: whitespace-separated, already normalized words.
pub fn expected_postings(corpus: &[(u32, String)]) -> Postings {
    let mut expected = Postings::new();
    for (id, text) in corpus {
        for word in text.split_whitespace() {
            expected.entry(word.to_string()).or_default().push(*id);
        }
    }
    for list in expected.values_mut() {
        list.sort_unstable();
        list.dedup();
    }
    expected
}

pub fn borrow_corpus(corpus: &[(u32, String)]) -> Vec<(u32, &str)> {
    corpus.iter().map(|(id, text)| (*id, text.as_str())).collect()
}
