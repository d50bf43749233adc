use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
use twox_hash::XxHash64;

use ragkit_core::traits::EmbedderPort;
use ragkit_core::types::{Chunk, ChunkWithoutEmbedding, Keyed};
use ragkit_core::{delay, Error, Plan, Result};

pub const DEFAULT_DIM: usize = 16;

/// Hashes whitespace tokens into `dim` buckets and L2-normalizes.
/// Same text, same vector; no model files, no randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicEmbedder { dim: usize }

impl Default for DeterministicEmbedder {
    fn default() -> Self { Self { dim: DEFAULT_DIM } }
}

impl DeterministicEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { return Err(Error::Validation("embedding dim must be greater than 0".into())); }
        Ok(Self { dim })
    }

    pub fn dim(&self) -> usize { self.dim }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }

    /// Embeds the citable text only; padding never reaches the vector.
    pub fn embed_chunk(&self, chunk: &ChunkWithoutEmbedding) -> Chunk {
        let embedding = self.embed_text(chunk.citable_text());
        chunk.clone().with_embedding(embedding)
    }
}

/// [`DeterministicEmbedder::embed_chunk`] at [`DEFAULT_DIM`].
pub fn embed_chunk(chunk: &ChunkWithoutEmbedding) -> Chunk { DeterministicEmbedder::default().embed_chunk(chunk) }

type EmbedOne = Arc<dyn Fn(&ChunkWithoutEmbedding) -> anyhow::Result<Chunk> + Send + Sync>;

/// [`EmbedderPort`] over [`DeterministicEmbedder`]; batches run on the rayon pool
/// when the plan is performed.
#[derive(Clone)]
pub struct DeterministicEmbedderPort {
    id: String,
    dim: usize,
    embed_one: EmbedOne,
}

impl DeterministicEmbedderPort {
    pub fn new(dim: usize) -> Result<Self> {
        let embedder = DeterministicEmbedder::new(dim)?;
        Ok(Self { id: format!("hash:xxh64:d{dim}"), dim, embed_one: Arc::new(move |c| Ok(embedder.embed_chunk(c))) })
    }

    /// Replace the per-chunk function, e.g. to observe or fail calls in tests.
    pub fn with_embed_one(mut self, f: impl Fn(&ChunkWithoutEmbedding) -> anyhow::Result<Chunk> + Send + Sync + 'static) -> Self {
        self.embed_one = Arc::new(f);
        self
    }
}

impl Default for DeterministicEmbedderPort {
    fn default() -> Self {
        let embedder = DeterministicEmbedder::default();
        Self { id: format!("hash:xxh64:d{DEFAULT_DIM}"), dim: DEFAULT_DIM, embed_one: Arc::new(move |c| Ok(embedder.embed_chunk(c))) }
    }
}

impl std::fmt::Debug for DeterministicEmbedderPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeterministicEmbedderPort").field("id", &self.id).field("dim", &self.dim).finish()
    }
}

impl EmbedderPort for DeterministicEmbedderPort {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch<'a>(&'a self, items: Vec<Keyed<ChunkWithoutEmbedding>>) -> Plan<'a, Vec<Keyed<Chunk>>> {
        delay(move || {
            debug!(embedder = %self.id, items = items.len(), "embedding batch");
            items
                .into_par_iter()
                .map(|item| -> anyhow::Result<Keyed<Chunk>> {
                    let chunk = (self.embed_one)(&item.value)?;
                    Ok(Keyed::new(item.key, chunk))
                })
                .collect()
        })
    }
}

/// The embedder used when nothing else is configured.
pub fn default_embedder_port(dim: usize) -> Result<Box<dyn EmbedderPort>> { Ok(Box::new(DeterministicEmbedderPort::new(dim)?)) }

/// Profiles with a built-in embedder. Others need one passed explicitly.
pub const BUILTIN_PROFILES: &[&str] = &["ci"];

/// Embedder for a named settings profile; `ci` is the deterministic hash embedder.
pub fn embedder_for_profile(profile: &str, dim: usize) -> Result<Box<dyn EmbedderPort>> {
    match profile {
        "ci" => default_embedder_port(dim),
        other => Err(Error::Validation(format!(
            "profile '{other}' has no built-in embedder (built-in: {}); construct the app with an explicit embedder",
            BUILTIN_PROFILES.join(", ")
        ))),
    }
}
