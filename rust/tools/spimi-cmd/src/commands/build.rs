//! Build command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use spimi_index::{IndexStats, Indexer, IndexerConfig};
use spimi_io::file::FileWriter;
use spimi_io_impl::block_store;

use crate::{
    corpus::enumerate_documents,
    utils::{default_work_dir, format_size, validate_dir_exists},
};

pub struct BuildArgs {
    pub input_dir: String,
    pub dictionary: String,
    pub postings: String,
    pub block_size: u64,
    pub chunk_size: usize,
    pub work_dir: Option<String>,
    pub analyzer: String,
    pub limit: Option<usize>,
    pub max_retries: u32,
}

pub fn run(args: BuildArgs) -> Result<()> {
    let work_dir = match &args.work_dir {
        Some(dir) => PathBuf::from(dir),
        None => default_work_dir()?,
    };
    println!("indexing...");
    let stats = build_index(&args, &work_dir)?;

    println!("Documents:        {}", stats.documents);
    println!(
        "Blocks:           {} ({} oversized)",
        stats.blocks, stats.oversized_blocks
    );
    println!("Terms:            {}", stats.terms);
    println!("Postings:         {}", stats.postings);
    println!(
        "Dictionary:       {} ({})",
        args.dictionary,
        format_size(std::fs::metadata(&args.dictionary)?.len())
    );
    println!(
        "Postings file:    {} ({})",
        args.postings,
        format_size(std::fs::metadata(&args.postings)?.len())
    );
    Ok(())
}

/// Indexes `args.input_dir`, keeping block files under `work_dir`.
pub fn build_index(args: &BuildArgs, work_dir: &Path) -> Result<IndexStats> {
    validate_dir_exists(&args.input_dir)?;

    let config = IndexerConfig {
        block_size: args.block_size,
        chunk_size: args.chunk_size,
        analyzer: args.analyzer.clone(),
        max_retries: args.max_retries,
    };
    config.validate().context("Invalid indexing parameters")?;

    let documents = enumerate_documents(Path::new(&args.input_dir), args.limit)?;
    log::info!(
        "Indexing {} documents from {}, blocks in {}",
        documents.len(),
        args.input_dir,
        work_dir.display()
    );

    let store = block_store::create_local(work_dir)
        .with_context(|| format!("Failed to reset working directory {}", work_dir.display()))?;
    let analyzer = config.create_analyzer()?;
    let mut indexer = Indexer::new(config, store, analyzer)?;

    for document in &documents {
        let text = std::fs::read_to_string(&document.path)
            .with_context(|| format!("Failed to read document {}", document.path.display()))?;
        indexer
            .add_document(document.doc_id, &document.name, &text)
            .with_context(|| format!("Failed to index document {}", document.name))?;
    }

    let stats = write_index(indexer, Path::new(&args.dictionary), Path::new(&args.postings))?;
    log::info!("Index complete: {stats:?}");
    Ok(stats)
}

/// Merges the blocks of `indexer` into the output files.
///
/// Existing outputs are replaced only after the merge succeeded.
fn write_index(indexer: Indexer, dictionary: &Path, postings: &Path) -> Result<IndexStats> {
    let dictionary_out = FileWriter::create_staged(dictionary)
        .with_context(|| format!("Failed to create dictionary file {}", dictionary.display()))?;
    let postings_out = FileWriter::create_staged(postings)
        .with_context(|| format!("Failed to create postings file {}", postings.display()))?;
    Ok(indexer.finish(dictionary_out, postings_out)?)
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use spimi_index::{DocId, Dictionary, PostingsReader};
    use spimi_io::file::staging_path;

    use super::*;

    fn args(dir: &Path, block_size: u64) -> BuildArgs {
        BuildArgs {
            input_dir: dir.join("docs").to_str().unwrap().to_string(),
            dictionary: dir.join("dictionary.bin").to_str().unwrap().to_string(),
            postings: dir.join("postings.bin").to_str().unwrap().to_string(),
            block_size,
            chunk_size: 64,
            work_dir: None,
            analyzer: "unicode-word-stemmed".to_string(),
            limit: None,
            max_retries: 3,
        }
    }

    fn write_corpus(dir: &Path) {
        let docs = dir.join("docs");
        std::fs::create_dir(&docs).unwrap();
        std::fs::write(docs.join("1"), "The cat sat.").unwrap();
        std::fs::write(docs.join("2"), "The dogs sat!").unwrap();
        std::fs::write(docs.join("14"), "A cat and a dog.").unwrap();
    }

    fn lookup(args: &BuildArgs, term: &str) -> Vec<u32> {
        let dictionary = Dictionary::read_from(File::open(&args.dictionary).unwrap()).unwrap();
        let mut postings = PostingsReader::new(File::open(&args.postings).unwrap());
        let entry = dictionary.get(term).unwrap();
        postings
            .read(entry)
            .unwrap()
            .into_iter()
            .map(DocId::as_u32)
            .collect()
    }

    #[test]
    fn test_build_index() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let work_dir = dir.path().join("disk");

        let args = args(dir.path(), 1 << 20);
        let stats = build_index(&args, &work_dir).unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.blocks, 1);
        assert_eq!(lookup(&args, "cat"), vec![1, 14]);
        assert_eq!(lookup(&args, "dog"), vec![2, 14]);
        assert_eq!(lookup(&args, "sat"), vec![1, 2]);
        assert!(work_dir.join("block_1").exists());
    }

    #[test]
    fn test_small_blocks_and_rerun() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let work_dir = dir.path().join("disk");

        let stats = build_index(&args(dir.path(), 1 << 20), &work_dir).unwrap();
        assert_eq!(stats.blocks, 1);
        let single = std::fs::read(dir.path().join("postings.bin")).unwrap();

        // The rerun starts from a clean working directory and overwrites the outputs.
        let args = args(dir.path(), 200);
        let stats = build_index(&args, &work_dir).unwrap();
        assert!(stats.blocks > 1);
        assert_eq!(
            std::fs::read_dir(&work_dir).unwrap().count(),
            stats.blocks as usize
        );
        assert_eq!(std::fs::read(&args.postings).unwrap(), single);
        assert_eq!(lookup(&args, "cat"), vec![1, 14]);
    }

    #[test]
    fn test_limit() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let mut args = args(dir.path(), 1 << 20);
        args.limit = Some(2);
        let stats = build_index(&args, &dir.path().join("disk")).unwrap();
        assert_eq!(stats.documents, 2);
        assert_eq!(lookup(&args, "cat"), vec![1]);
    }

    #[test]
    fn test_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("disk");
        assert!(build_index(&args(dir.path(), 1 << 20), &work_dir).is_err());

        write_corpus(dir.path());
        let mut args = args(dir.path(), 1 << 20);
        args.analyzer = "porter".to_string();
        assert!(build_index(&args, &work_dir).is_err());

        std::fs::write(dir.path().join("docs").join("3"), [0xff, 0xfe, 0x00]).unwrap();
        let args = self::args(dir.path(), 1 << 20);
        assert!(build_index(&args, &work_dir).is_err());
    }

    #[test]
    fn test_failed_merge_keeps_previous_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let dictionary = dir.path().join("dictionary.bin");
        let postings = dir.path().join("postings.bin");
        std::fs::write(&dictionary, b"previous dictionary").unwrap();
        std::fs::write(&postings, b"previous postings").unwrap();

        let config = IndexerConfig::default();
        let store = block_store::create_in_memory(1 << 20).unwrap();
        let analyzer = config.create_analyzer().unwrap();
        let mut indexer = Indexer::new(config, store.clone(), analyzer).unwrap();
        indexer.add_document(DocId::new(1), "doc1", "the cat sat").unwrap();

        // The trailing flush writes block 1; block 7 is merged with it and fails to decode.
        let mut writer = store.create_block(7).unwrap();
        writer.write_all(b"not a block").unwrap();
        writer.seal().unwrap();

        assert!(write_index(indexer, &dictionary, &postings).is_err());
        assert_eq!(std::fs::read(&dictionary).unwrap(), b"previous dictionary");
        assert_eq!(std::fs::read(&postings).unwrap(), b"previous postings");
        assert!(!staging_path(&dictionary).exists());
        assert!(!staging_path(&postings).exists());
    }

    #[test]
    fn test_outputs_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let args = args(dir.path(), 1 << 20);
        std::fs::write(&args.dictionary, b"previous dictionary").unwrap();
        std::fs::write(&args.postings, b"previous postings").unwrap();

        build_index(&args, &dir.path().join("disk")).unwrap();
        assert_eq!(lookup(&args, "sat"), vec![1, 2]);
        assert!(!staging_path(Path::new(&args.dictionary)).exists());
        assert!(!staging_path(Path::new(&args.postings)).exists());
    }
}
