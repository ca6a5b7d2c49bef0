use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod corpus;
mod utils;

#[derive(Parser)]
#[command(name = "spimi-cmd")]
#[command(about = "Builds and inspects memory-bounded inverted indexes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every file of a directory into a dictionary file and a postings file
    Build {
        /// Directory of documents, one document per file
        #[arg(short = 'i', long)]
        input_dir: String,

        /// Output dictionary file
        #[arg(short, long)]
        dictionary: String,

        /// Output postings file
        #[arg(short, long)]
        postings: String,

        /// Memory budget of one in-memory block, in bytes
        #[arg(long, default_value_t = spimi_index::IndexerConfig::DEFAULT_BLOCK_SIZE)]
        block_size: u64,

        /// Bytes buffered per block during the merge
        #[arg(long, default_value_t = spimi_index::IndexerConfig::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Directory for block files (defaults to `disk` next to the executable)
        #[arg(long)]
        work_dir: Option<String>,

        /// Analyzer: unicode-word, unicode-word-stemmed or whitespace
        #[arg(long, default_value = spimi_index::IndexerConfig::DEFAULT_ANALYZER)]
        analyzer: String,

        /// Index at most this many documents
        #[arg(long)]
        limit: Option<usize>,

        /// Retries of a block write after a transient I/O failure
        #[arg(long, default_value_t = spimi_index::BlockWriter::DEFAULT_MAX_RETRIES)]
        max_retries: u32,
    },

    /// Print index statistics, or the postings of the given terms
    Inspect {
        /// Dictionary file
        #[arg(short, long)]
        dictionary: String,

        /// Postings file
        #[arg(short, long)]
        postings: String,

        /// Term to look up (can be specified multiple times)
        #[arg(short, long)]
        term: Vec<String>,

        /// Normalize the looked up terms with this analyzer first
        #[arg(long)]
        analyzer: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input_dir,
            dictionary,
            postings,
            block_size,
            chunk_size,
            work_dir,
            analyzer,
            limit,
            max_retries,
        } => commands::build::run(commands::build::BuildArgs {
            input_dir,
            dictionary,
            postings,
            block_size,
            chunk_size,
            work_dir,
            analyzer,
            limit,
            max_retries,
        }),
        Commands::Inspect {
            dictionary,
            postings,
            term,
            analyzer,
        } => commands::inspect::run(dictionary, postings, term, analyzer),
    }
}
