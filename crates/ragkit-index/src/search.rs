use tracing::debug;

use ragkit_core::types::{Candidate, Filters};
use ragkit_core::{Error, Result};
use ragkit_text::search::rank;
use ragkit_text::Tokenizer;

use crate::{DocMeta, Index};

pub const FILTER_KEYS: &[&str] = &["category", "doc_id", "title"];

/// Compiled metadata predicates; all must hold.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocFilter {
    category: Option<String>,
    doc_id: Option<String>,
    title: Option<String>,
}

impl DocFilter {
    pub fn compile(filters: &Filters) -> Result<Self> {
        let mut f = Self::default();
        for (key, value) in filters {
            let slot = match key.as_str() {
                "category" => &mut f.category,
                "doc_id" => &mut f.doc_id,
                "title" => &mut f.title,
                other => return Err(Error::Validation(format!("unsupported filter '{other}' (supported: {})", FILTER_KEYS.join(", ")))),
            };
            *slot = Some(value.clone());
        }
        Ok(f)
    }

    pub fn matches(&self, doc: &DocMeta) -> bool {
        self.category.as_deref().map_or(true, |c| doc.categories.split_whitespace().any(|label| label == c))
            && self.doc_id.as_deref().map_or(true, |id| doc.doc_id == id)
            && self.title.as_deref().map_or(true, |t| doc.title == t)
    }
}

/// Rank chunks of `index` against `query`; at most `top_k` results, best first.
///
/// Filters restrict which chunks are eligible and never change scores.
pub fn retrieve(index: &Index, query: &str, top_k: usize, filters: &Filters) -> Result<Vec<Candidate>> {
    if top_k == 0 { return Err(Error::Validation("top_k must be at least 1".into())); }
    let filter = DocFilter::compile(filters)?;
    let terms = Tokenizer::shared().tokenize(query);
    if terms.is_empty() { return Err(Error::Validation(format!("query '{query}' has no searchable terms"))); }

    let eligible: Vec<bool> = index.docs.iter().map(|d| filter.matches(d)).collect();
    let ranked = rank(&index.stats, &index.manifest.bm25, &terms, |pos| eligible[index.chunk_docs[pos] as usize]);
    let candidates: Vec<Candidate> = ranked
        .into_iter()
        .take(top_k)
        .map(|s| Candidate { chunk: index.chunks[s.position].clone(), score: s.score })
        .collect();
    debug!(query, terms = terms.len(), top_k, returned = candidates.len(), "retrieve");
    Ok(candidates)
}
