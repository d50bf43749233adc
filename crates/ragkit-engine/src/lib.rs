//! `RagApp`: the one surface callers use to build, persist, query and answer.
//! Ports, plans and index internals stay behind it.
use std::path::Path;

use tracing::info;

use ragkit_answer::AnswerOptions;
use ragkit_core::chunking::chunk_docs;
use ragkit_core::config::{Config, Settings};
use ragkit_core::traits::{EmbedderPort, StorageRead, StorageWrite};
use ragkit_core::types::{Answer, Candidate, Chunk, ChunkParams, Filters, RawDoc, TailPolicy};
use ragkit_core::{delay, perform, Plan, Result};
use ragkit_embed::{embedder_for_profile, DeterministicEmbedderPort};
use ragkit_index::embed_stage::embed_chunks;
use ragkit_index::{Backend, BuildParams};
use ragkit_text::Bm25Params;

pub use ragkit_answer::verify_grounding;
pub use ragkit_index::{Index, Manifest};

pub struct RagApp {
    settings: Settings,
    embedder: Box<dyn EmbedderPort>,
}

impl RagApp {
    pub fn new(settings: Settings, embedder: Box<dyn EmbedderPort>) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings, embedder })
    }

    /// Embedder chosen by `settings.profile`, sized by `settings.embedding.dim`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = embedder_for_profile(&settings.profile, settings.embedding.dim)?;
        Self::new(settings, embedder)
    }

    pub fn from_config(config: &Config) -> Result<Self> { Self::from_settings(config.settings()?) }

    /// Reproducible defaults: built-in settings and the deterministic embedder.
    pub fn ci() -> Self { Self { settings: Settings::default(), embedder: Box::new(DeterministicEmbedderPort::default()) } }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn embedder(&self) -> &dyn EmbedderPort { self.embedder.as_ref() }

    /// `bm25` uses the configured constants; `bm25:k1=..,b=..` overrides them.
    pub fn backend(&self, spec: &str) -> Result<Backend> {
        Backend::parse_with(spec, Bm25Params { k1: self.settings.backend.k1, b: self.settings.backend.b })
    }

    fn answer_options(&self) -> AnswerOptions {
        AnswerOptions { max_citations: self.settings.answer.max_citations, rerank: self.settings.answer.rerank }
    }

    pub fn build_index(&self, docs: &[RawDoc], backend: &str, chunk_size: usize, overlap: usize, tail_policy: TailPolicy) -> Result<Index> {
        let params = BuildParams::new(self.backend(backend)?, ChunkParams::new(chunk_size, overlap, tail_policy));
        ragkit_index::build_index(docs, &params, self.embedder.as_ref())
    }

    /// Build with the configured backend and chunk parameters.
    pub fn build_index_configured(&self, docs: &[RawDoc]) -> Result<Index> {
        let c = self.settings.chunk;
        self.build_index(docs, &self.settings.backend.name, c.chunk_size, c.overlap, c.tail_policy)
    }

    /// Describe reading a corpus; the first bad record fails the whole read.
    pub fn read_corpus_plan<'a>(&self, storage: &'a dyn StorageRead, path: &'a Path) -> Plan<'a, Result<Vec<RawDoc>>> {
        delay(move || Ok(storage.read_docs(path))).map(|records| records.into_iter().collect::<Result<Vec<_>>>())
    }

    pub fn read_corpus(&self, storage: &dyn StorageRead, path: &Path) -> Result<Vec<RawDoc>> { perform(self.read_corpus_plan(storage, path))? }

    pub fn build_index_from(&self, storage: &dyn StorageRead, path: &Path, backend: &str) -> Result<Index> {
        let docs = self.read_corpus(storage, path)?;
        let c = self.settings.chunk;
        self.build_index(&docs, backend, c.chunk_size, c.overlap, c.tail_policy)
    }

    /// Chunk and embed `docs` with the configured chunk parameters, without indexing.
    pub fn chunk_corpus(&self, docs: &[RawDoc]) -> Result<Vec<Chunk>> {
        let pieces = chunk_docs(docs, &self.settings.chunk)?;
        embed_chunks(pieces, self.embedder.as_ref())
    }

    /// Read `input`, chunk + embed it and write the chunks to `out`. Returns the chunk count.
    pub fn export_chunks(&self, storage: &dyn StorageRead, input: &Path, sink: &dyn StorageWrite, out: &Path) -> Result<usize> {
        let docs = self.read_corpus(storage, input)?;
        let chunks = self.chunk_corpus(&docs)?;
        sink.write_chunks(out, &chunks)?;
        info!(docs = docs.len(), chunks = chunks.len(), out = %out.display(), "exported chunks");
        Ok(chunks.len())
    }

    pub fn save_index(&self, index: &Index, path: &Path) -> Result<()> { ragkit_index::save_index(index, path) }

    pub fn load_index(&self, path: &Path) -> Result<Index> { ragkit_index::load_index(path) }

    pub fn retrieve(&self, index: &Index, query: &str, top_k: usize, filters: &Filters) -> Result<Vec<Candidate>> {
        ragkit_index::retrieve(index, query, top_k, filters)
    }

    pub fn ask(&self, index: &Index, query: &str, top_k: usize, filters: &Filters) -> Result<Answer> {
        ragkit_answer::ask(index, query, top_k, filters, &self.answer_options(), self.embedder.as_ref())
    }
}

impl Default for RagApp {
    fn default() -> Self { Self::ci() }
}
