//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dealdex",
    version,
    about = "Hybrid search over grocery deals and qualifying products",
    long_about = "Dealdex indexes a deals snapshot and its qualifying products, then serves \
                  free-text queries through keyword, fuzzy, and semantic scoring fused into \
                  one ranked list of deals."
)]
pub struct Cli {
    /// Config file path (defaults to ./dealdex.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the snapshots and build or refresh the embedding cache
    Build {
        /// Recompute embeddings even when the cache matches
        #[arg(long)]
        force: bool,
    },

    /// Search the catalog with a free-text query
    Search {
        /// Search query text
        query: String,

        /// Maximum number of deals to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Emit results as JSON
        #[arg(long)]
        json: bool,

        /// Emit results in score-ordered batches
        #[arg(long)]
        stream: bool,

        /// Pre-expanded terms to merge instead of the raw query
        #[arg(long, value_delimiter = ',', value_name = "TERMS")]
        terms: Vec<String>,
    },

    /// Print catalog and cache statistics
    Info,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
