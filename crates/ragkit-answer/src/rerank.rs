//! Optional second pass over BM25 candidates: reorder by cosine similarity
//! between the query vector and each chunk's stored embedding.
use ragkit_core::traits::EmbedderPort;
use ragkit_core::types::{Candidate, ChunkWithoutEmbedding, Keyed};
use ragkit_core::{perform, Error, Result};
use ragkit_index::Index;

const QUERY_KEY: &str = "query#0";

/// Embed `query` with the same port that embedded `index`.
///
/// A port whose id or dimension differs from the manifest is a validation
/// error; vectors from different embedders are not comparable.
pub fn embed_query(index: &Index, embedder: &dyn EmbedderPort, query: &str) -> Result<Vec<f32>> {
    let m = index.manifest();
    if embedder.embedder_id() != m.embedder_id || embedder.dim() != m.dim {
        return Err(Error::Validation(format!(
            "index was embedded with '{}' (dim {}), query embedder is '{}' (dim {})",
            m.embedder_id,
            m.dim,
            embedder.embedder_id(),
            embedder.dim()
        )));
    }
    let item = ChunkWithoutEmbedding { doc_id: QUERY_KEY.into(), text: query.to_string(), start: 0, end: query.chars().count() };
    let out = perform(embedder.embed_batch(vec![Keyed::new(QUERY_KEY, item)]))?;
    out.into_iter()
        .find(|k| k.key == QUERY_KEY)
        .map(|k| k.value.embedding)
        .filter(|e| e.len() == m.dim)
        .ok_or_else(|| Error::Build(format!("embedder returned no query vector of dimension {}", m.dim)))
}

/// Accumulated in f64, in element order. Zero vectors have similarity 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na.sqrt() * nb.sqrt()) }
}

/// Most similar first. The sort is stable, so equal similarity keeps the
/// incoming BM25 order; scores are left untouched.
pub fn rerank(candidates: Vec<Candidate>, query_vec: &[f32]) -> Vec<Candidate> {
    let mut scored: Vec<(f64, Candidate)> = candidates.into_iter().map(|c| (cosine(query_vec, &c.chunk.embedding), c)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, c)| c).collect()
}
