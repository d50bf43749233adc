use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ragkit_core::types::Filters;

#[derive(Parser, Debug)]
#[command(name = "ragkit", version, about = "Deterministic retrieval and grounded answers over a local corpus")]
pub struct Cli {
    /// Extra TOML file merged over ragkit.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// key=value override, e.g. --set chunk.chunk_size=256 (repeatable)
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk and embed a corpus, writing chunks as JSONL
    Chunk {
        input: String,
        #[arg(long)]
        out: String,
    },
    /// Build an index from a corpus and save it
    Build {
        input: String,
        #[arg(long)]
        index: String,
        /// `bm25` or `bm25:k1=<f>,b=<f>`; defaults to backend.name
        #[arg(long)]
        backend: Option<String>,
    },
    /// Print ranked chunks for a query
    Retrieve(QueryArgs),
    /// Print an extractive answer with citations
    Ask {
        #[command(flatten)]
        query: QueryArgs,
        /// Reorder contexts by embedding similarity (same as --set answer.rerank=true)
        #[arg(long)]
        rerank: bool,
    },
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[arg(long)]
    pub index: String,
    /// Defaults to retrieval.default_top_k
    #[arg(long = "top-k")]
    pub top_k: Option<usize>,
    /// Metadata filter (category, doc_id or title), repeatable
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
    pub query: String,
}

impl QueryArgs {
    /// Later filters on the same key win.
    pub fn filter_map(&self) -> Filters { self.filters.iter().cloned().collect() }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("filter '{raw}' must look like key=value")),
    }
}
