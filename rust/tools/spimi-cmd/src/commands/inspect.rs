//! Inspect command implementation

use std::{
    fs::File,
    io::{BufReader, Seek},
};

use anyhow::{Context, Result};
use spimi_index::{Dictionary, DictionaryEntry, PostingsReader, create_analyzer};

use crate::utils::format_size;

const TOP_TERMS: usize = 10;

pub fn run(
    dictionary_path: String,
    postings_path: String,
    terms: Vec<String>,
    analyzer: Option<String>,
) -> Result<()> {
    let dictionary = Dictionary::read_from(BufReader::new(
        File::open(&dictionary_path)
            .with_context(|| format!("Failed to open dictionary file {dictionary_path}"))?,
    ))
    .with_context(|| format!("Failed to read dictionary file {dictionary_path}"))?;
    let mut postings = PostingsReader::new(BufReader::new(
        File::open(&postings_path)
            .with_context(|| format!("Failed to open postings file {postings_path}"))?,
    ));

    if terms.is_empty() {
        print_summary(&dictionary, &dictionary_path, &postings_path)
    } else {
        let terms = match analyzer {
            Some(name) => {
                let analyzer = create_analyzer(&name)?;
                terms.iter().flat_map(|t| analyzer.analyze(t)).collect()
            }
            None => terms,
        };
        for term in &terms {
            println!("{}", lookup(&dictionary, &mut postings, term)?);
        }
        Ok(())
    }
}

/// Formats the postings of `term` as `term (df): name name ...`.
fn lookup<R: std::io::Read + Seek>(
    dictionary: &Dictionary,
    postings: &mut PostingsReader<R>,
    term: &str,
) -> Result<String> {
    let Some(entry) = dictionary.get(term) else {
        return Ok(format!("{term}: not found"));
    };
    let docs = postings.read(entry)?;
    let names = docs
        .iter()
        .map(|&doc| match dictionary.document_name(doc) {
            Some(name) => name.to_string(),
            None => doc.to_string(),
        })
        .collect::<Vec<_>>();
    Ok(format!("{term} ({}): {}", entry.doc_freq, names.join(" ")))
}

fn print_summary(
    dictionary: &Dictionary,
    dictionary_path: &str,
    postings_path: &str,
) -> Result<()> {
    println!(
        "Dictionary:       {} ({})",
        dictionary_path,
        format_size(std::fs::metadata(dictionary_path)?.len())
    );
    println!(
        "Postings file:    {} ({})",
        postings_path,
        format_size(std::fs::metadata(postings_path)?.len())
    );
    println!("Documents:        {}", dictionary.documents().len());
    println!("Terms:            {}", dictionary.len());
    println!("Postings:         {}", dictionary.posting_count());

    let top = top_terms(dictionary, TOP_TERMS);
    if !top.is_empty() {
        println!("Most frequent terms:");
        for entry in top {
            println!("  {:<24} {}", entry.term, entry.doc_freq);
        }
    }
    Ok(())
}

/// The `n` entries with the highest document frequency, ties in term order.
fn top_terms(dictionary: &Dictionary, n: usize) -> Vec<&DictionaryEntry> {
    let mut entries = dictionary.iter().collect::<Vec<_>>();
    entries.sort_by(|a, b| b.doc_freq.cmp(&a.doc_freq).then_with(|| a.term.cmp(&b.term)));
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use spimi_index::{DocId, Indexer, IndexerConfig};
    use spimi_io_impl::block_store;

    use super::*;

    fn build() -> (Dictionary, Vec<u8>) {
        let config = IndexerConfig {
            analyzer: "unicode-word".to_string(),
            ..IndexerConfig::default()
        };
        let store = block_store::create_in_memory(1 << 20).unwrap();
        let analyzer = config.create_analyzer().unwrap();
        let mut indexer = Indexer::new(config, store, analyzer).unwrap();
        indexer.add_document(DocId::new(1), "doc1", "the cat sat").unwrap();
        indexer.add_document(DocId::new(2), "doc2", "the dog sat").unwrap();
        indexer.add_document(DocId::new(3), "doc3", "the end").unwrap();

        let mut dictionary = Vec::<u8>::new();
        let mut postings = Vec::<u8>::new();
        indexer.finish(&mut dictionary, &mut postings).unwrap();
        (Dictionary::read_from(dictionary.as_slice()).unwrap(), postings)
    }

    #[test]
    fn test_lookup() {
        let (dictionary, postings) = build();
        let mut reader = PostingsReader::new(Cursor::new(postings));
        assert_eq!(
            lookup(&dictionary, &mut reader, "sat").unwrap(),
            "sat (2): doc1 doc2"
        );
        assert_eq!(
            lookup(&dictionary, &mut reader, "fish").unwrap(),
            "fish: not found"
        );
    }

    #[test]
    fn test_top_terms() {
        let (dictionary, _) = build();
        let top = top_terms(&dictionary, 3)
            .into_iter()
            .map(|e| (e.term.as_str(), e.doc_freq))
            .collect::<Vec<_>>();
        assert_eq!(top, vec![("the", 3), ("sat", 2), ("cat", 1)]);
    }
}
