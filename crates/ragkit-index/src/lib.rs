//! ragkit-index
//!
//! Builds the immutable [`Index`] (chunk arena + BM25 statistics + build
//! manifest), persists it to a checksummed binary file and answers ranked
//! retrieval queries over it.
use serde::{Deserialize, Serialize};

use ragkit_core::types::{Chunk, ChunkParams};
use ragkit_core::{Error, Result};
use ragkit_text::{Bm25Params, Bm25Stats, TOKENIZER_ID};

pub mod backend;
pub mod embed_stage;
pub mod index_build;
pub mod reader;
pub mod schema;
pub mod search;
pub mod writer;

pub use backend::Backend;
pub use index_build::{build_index, BuildParams};
pub use reader::load_index;
pub use search::retrieve;
pub use writer::save_index;

/// Field-for-field mirror of [`Index`], decoded before any check has run.
#[derive(Deserialize)]
pub(crate) struct IndexWire {
    manifest: Manifest,
    docs: Vec<DocMeta>,
    chunks: Vec<Chunk>,
    chunk_docs: Vec<u32>,
    stats: Bm25Stats,
}

impl TryFrom<IndexWire> for Index {
    type Error = Error;

    fn try_from(w: IndexWire) -> Result<Self> {
        let index = Index { manifest: w.manifest, docs: w.docs, chunks: w.chunks, chunk_docs: w.chunk_docs, stats: w.stats };
        index.check_integrity()?;
        Ok(index)
    }
}

/// Parameters recorded at build time; enough to reproduce ranking after a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub backend: String,
    pub bm25: Bm25Params,
    pub chunk: ChunkParams,
    pub embedder_id: String,
    pub dim: usize,
    pub tokenizer_id: String,
}

/// Document metadata kept for filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub doc_id: String,
    pub title: String,
    pub categories: String,
}

/// An immutable arena of chunks addressed by position.
///
/// `chunk_docs[i]` is the position in `docs` of the document owning `chunks[i]`;
/// `stats` is computed over the citable text of `chunks` in the same order.
///
/// Deserializing always runs the integrity checks of [`load_index`], so an
/// `Index` obtained from any serde decoder is safe to query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexWire")]
pub struct Index {
    manifest: Manifest,
    docs: Vec<DocMeta>,
    chunks: Vec<Chunk>,
    chunk_docs: Vec<u32>,
    stats: Bm25Stats,
}

impl Index {
    pub fn manifest(&self) -> &Manifest { &self.manifest }

    pub fn docs(&self) -> &[DocMeta] { &self.docs }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    pub fn stats(&self) -> &Bm25Stats { &self.stats }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn doc_of(&self, position: usize) -> &DocMeta { &self.docs[self.chunk_docs[position] as usize] }

    pub fn doc(&self, doc_id: &str) -> Result<&DocMeta> {
        self.docs.iter().find(|d| d.doc_id == doc_id).ok_or_else(|| Error::NotFound(format!("doc_id '{doc_id}'")))
    }

    /// Structural checks run after decoding a persisted index.
    fn check_integrity(&self) -> Result<()> {
        let n = self.chunks.len();
        let ok = self.chunk_docs.len() == n
            && self.chunk_docs.iter().all(|&d| (d as usize) < self.docs.len())
            && self.stats.num_chunks() == n
            && self.stats.is_consistent()
            && self.chunks.iter().all(|c| c.start <= c.end && c.embedding.len() == self.manifest.dim);
        if !ok { return Err(Error::Io("index payload is internally inconsistent".into())); }
        if self.manifest.tokenizer_id != TOKENIZER_ID {
            return Err(Error::Validation(format!(
                "index was built with tokenizer '{}', this build uses '{}'",
                self.manifest.tokenizer_id, TOKENIZER_ID
            )));
        }
        Ok(())
    }
}
