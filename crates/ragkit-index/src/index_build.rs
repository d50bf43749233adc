use std::collections::HashMap;

use tracing::info;

use ragkit_core::chunking::chunk_docs;
use ragkit_core::traits::EmbedderPort;
use ragkit_core::types::{ChunkParams, RawDoc};
use ragkit_core::{Error, Result};
use ragkit_text::{Bm25Stats, Tokenizer};

use crate::embed_stage::embed_chunks;
use crate::{Backend, DocMeta, Index, Manifest};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuildParams {
    pub backend: Backend,
    pub chunk: ChunkParams,
}

impl BuildParams {
    pub fn new(backend: Backend, chunk: ChunkParams) -> Self { Self { backend, chunk } }
}

/// Chunk, embed and compile ranking statistics for `docs`.
///
/// All-or-nothing: invalid parameters are a validation error, and any
/// document or embedding failure is a build error with no index produced.
pub fn build_index(docs: &[RawDoc], params: &BuildParams, embedder: &dyn EmbedderPort) -> Result<Index> {
    params.chunk.validate()?;
    params.backend.bm25_params().validate()?;

    let mut doc_pos: HashMap<&str, u32> = HashMap::with_capacity(docs.len());
    for (i, d) in docs.iter().enumerate() {
        if d.doc_id.trim().is_empty() { return Err(Error::Build(format!("document #{i} has an empty doc_id"))); }
        let i = u32::try_from(i).map_err(|_| Error::Build("too many documents".into()))?;
        if doc_pos.insert(d.doc_id.as_str(), i).is_some() { return Err(Error::Build(format!("duplicate doc_id '{}'", d.doc_id))); }
    }

    let pieces = chunk_docs(docs, &params.chunk).map_err(|e| Error::Build(format!("chunking failed: {}", e.message())))?;
    let owners: Vec<u32> = pieces.iter().map(|c| doc_pos[c.doc_id.as_str()]).collect();
    let chunks = embed_chunks(pieces, embedder)?;

    let tokenizer = Tokenizer::shared();
    let stats = Bm25Stats::build(chunks.iter().map(|c| c.citable_text()), tokenizer)?;
    let manifest = Manifest {
        backend: params.backend.tag().to_string(),
        bm25: params.backend.bm25_params(),
        chunk: params.chunk,
        embedder_id: embedder.embedder_id().to_string(),
        dim: embedder.dim(),
        tokenizer_id: tokenizer.id().to_string(),
    };
    let docs = docs.iter().map(|d| DocMeta { doc_id: d.doc_id.clone(), title: d.title.clone(), categories: d.categories.clone() }).collect();
    let index = Index { manifest, docs, chunks, chunk_docs: owners, stats };
    info!(docs = index.docs.len(), chunks = index.chunks.len(), terms = index.stats.vocab.len(), backend = %params.backend, "built index");
    Ok(index)
}
