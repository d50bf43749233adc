use std::path::Path;

use crate::error::Result;
use crate::plan::Plan;
use crate::types::{Chunk, ChunkWithoutEmbedding, Keyed, RawDoc};

/// Reads a corpus. Each record is reported separately so one bad line does
/// not hide the rest; a missing `path` yields a single `NotFound` entry.
pub trait StorageRead: Send + Sync {
    fn read_docs(&self, path: &Path) -> Vec<Result<RawDoc>>;
}

pub trait StorageWrite: Send + Sync {
    fn write_chunks(&self, path: &Path, chunks: &[Chunk]) -> Result<()>;
}

pub trait EmbedderPort: Send + Sync {
    /// Stable identifier recorded in the index manifest (e.g. `hash:xxh64:d16`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    /// Describe the embedding of a keyed batch. Nothing is computed until the
    /// returned plan is performed; output keys match input keys.
    fn embed_batch<'a>(&'a self, items: Vec<Keyed<ChunkWithoutEmbedding>>) -> Plan<'a, Vec<Keyed<Chunk>>>;
}
