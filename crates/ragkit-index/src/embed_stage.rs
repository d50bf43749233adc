//! Keys chunks, embeds them through one plan and reassembles by key.

use std::collections::HashMap;

use ragkit_core::traits::EmbedderPort;
use ragkit_core::types::{Chunk, ChunkWithoutEmbedding, Keyed};
use ragkit_core::{perform, Error, Plan, Result};

/// `"{doc_id}#{ordinal}"`, ordinal counted within the document.
pub fn chunk_keys(chunks: &[ChunkWithoutEmbedding]) -> Vec<String> {
    let mut ordinals: HashMap<&str, usize> = HashMap::new();
    chunks
        .iter()
        .map(|c| {
            let ord = ordinals.entry(c.doc_id.as_str()).or_insert(0);
            let key = format!("{}#{}", c.doc_id, ord);
            *ord += 1;
            key
        })
        .collect()
}

/// Plan embedding of `chunks`; results come back in arena order whatever
/// order the embedder yields them in.
pub fn embed_plan<'a>(chunks: Vec<ChunkWithoutEmbedding>, embedder: &'a dyn EmbedderPort) -> Plan<'a, Result<Vec<Chunk>>> {
    let keys = chunk_keys(&chunks);
    let items: Vec<Keyed<ChunkWithoutEmbedding>> = keys.iter().cloned().zip(chunks.iter().cloned()).map(|(k, c)| Keyed::new(k, c)).collect();
    let dim = embedder.dim();
    embedder.embed_batch(items).map(move |out| reassemble(chunks, &keys, out, dim))
}

fn reassemble(chunks: Vec<ChunkWithoutEmbedding>, keys: &[String], out: Vec<Keyed<Chunk>>, dim: usize) -> Result<Vec<Chunk>> {
    let position: HashMap<&str, usize> = keys.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
    for item in out {
        let Some(&i) = position.get(item.key.as_str()) else {
            return Err(Error::Build(format!("embedder returned unexpected key '{}'", item.key)));
        };
        if slots[i].is_some() { return Err(Error::Build(format!("embedder returned key '{}' twice", item.key))); }
        if item.value.embedding.len() != dim {
            return Err(Error::Build(format!("embedding for '{}' has dimension {}, expected {}", item.key, item.value.embedding.len(), dim)));
        }
        slots[i] = Some(item.value.embedding);
    }
    chunks
        .into_iter()
        .zip(slots)
        .zip(keys)
        .map(|((chunk, slot), key)| slot.map(|e| chunk.with_embedding(e)).ok_or_else(|| Error::Build(format!("no embedding returned for '{key}'"))))
        .collect()
}

/// Perform the embedding plan once; any fault becomes a build error.
pub fn embed_chunks(chunks: Vec<ChunkWithoutEmbedding>, embedder: &dyn EmbedderPort) -> Result<Vec<Chunk>> {
    match perform(embed_plan(chunks, embedder)) {
        Ok(assembled) => assembled,
        Err(e) => Err(Error::Build(format!("embedding failed: {e}"))),
    }
}
