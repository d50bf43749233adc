//! ragkit-text
//!
//! Shared tokenizer (a tantivy analyzer chain) plus BM25 statistics and
//! scoring over an in-memory chunk arena. See `index` and `search`.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::Bm25Stats;
pub use search::{Bm25Params, ScoredChunk};
pub use tantivy_utils::{Tokenizer, TOKENIZER_ID};
