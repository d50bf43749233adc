//! Domain types shared by the chunking, indexing and answering crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Metadata predicates applied before ranking, e.g. `{"category": "cs.AI"}`.
pub type Filters = BTreeMap<String, String>;

/// A source document as ingested.
///
/// - `doc_id`: unique within one corpus
/// - `body`: the text that is chunked and cited (`abstract` on the wire)
/// - `categories`: whitespace-separated labels, e.g. `"cs.AI cs.LG"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDoc {
    pub doc_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", alias = "body", default)]
    pub body: String,
    #[serde(default)]
    pub categories: String,
}

impl RawDoc {
    pub fn new(doc_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self { doc_id: doc_id.into(), title: String::new(), body: body.into(), categories: String::new() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self { self.title = title.into(); self }

    pub fn with_categories(mut self, categories: impl Into<String>) -> Self { self.categories = categories.into(); self }

    pub fn category_labels(&self) -> impl Iterator<Item = &str> { self.categories.split_whitespace() }
}

/// A window of one document's body.
///
/// `start`/`end` are character offsets into the document body. With the
/// `pad` tail policy `text` may carry trailing filler beyond `end - start`
/// characters; only the first `end - start` characters are citable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkWithoutEmbedding {
    pub doc_id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ChunkWithoutEmbedding {
    pub fn citable_text(&self) -> &str { real_text(&self.text, self.start, self.end) }

    pub fn with_embedding(self, embedding: Vec<f32>) -> Chunk {
        Chunk { doc_id: self.doc_id, text: self.text, start: self.start, end: self.end, embedding }
    }
}

/// A chunk together with its embedding. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn citable_text(&self) -> &str { real_text(&self.text, self.start, self.end) }
}

fn real_text(text: &str, start: usize, end: usize) -> &str {
    let real = end.saturating_sub(start);
    match text.char_indices().nth(real) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// A caller-supplied key paired with a value, so batched results can be
/// matched back without relying on position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyed<T> {
    pub key: String,
    pub value: T,
}

impl<T> Keyed<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self { Self { key: key.into(), value } }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Keyed<U> { Keyed { key: self.key, value: f(self.value) } }
}

/// One ranked chunk returned by `retrieve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub chunk: Chunk,
    pub score: f64,
}

/// The citable evidence returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub doc_id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl From<&Candidate> for Context {
    fn from(c: &Candidate) -> Self {
        Self {
            doc_id: c.chunk.doc_id.clone(),
            text: c.chunk.citable_text().to_string(),
            start: c.chunk.start,
            end: c.chunk.end,
            score: c.score,
        }
    }
}

/// A span inside `contexts[context].text` of the same [`Answer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_id: String,
    pub context: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub contexts: Vec<Context>,
}

/// How a chunking pass treats a remainder shorter than the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    #[default]
    EmitShort,
    Drop,
    Pad,
}

impl TailPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmitShort => "emit_short",
            Self::Drop => "drop",
            Self::Pad => "pad",
        }
    }
}

impl fmt::Display for TailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TailPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "emit_short" => Ok(Self::EmitShort),
            "drop" => Ok(Self::Drop),
            "pad" => Ok(Self::Pad),
            other => Err(Error::Validation(format!("unknown tail_policy '{other}' (expected emit_short, drop or pad)"))),
        }
    }
}

/// Window parameters for the chunking pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub overlap: usize,
    pub tail_policy: TailPolicy,
}

impl Default for ChunkParams {
    fn default() -> Self { Self { chunk_size: 512, overlap: 64, tail_policy: TailPolicy::EmitShort } }
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize, tail_policy: TailPolicy) -> Self { Self { chunk_size, overlap, tail_policy } }

    /// Out-of-range parameters are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Validation("chunk_size must be greater than 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::Validation(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize { self.chunk_size - self.overlap }
}
