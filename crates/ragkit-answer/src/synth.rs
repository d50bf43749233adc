use std::collections::BTreeSet;

use tracing::debug;

use ragkit_core::traits::EmbedderPort;
use ragkit_core::types::{Answer, Candidate, Citation, Context, Filters};
use ragkit_core::{Error, Result};
use ragkit_index::{retrieve, Index};
use ragkit_text::Tokenizer;

use crate::guardrails::verify_grounding;
use crate::rerank::{embed_query, rerank};
use crate::sentences::{slice_chars, split_sentences, SentenceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOptions {
    pub max_citations: usize,
    /// Reorder retrieved contexts by embedding similarity before picking sentences.
    pub rerank: bool,
}

impl Default for AnswerOptions {
    fn default() -> Self { Self { max_citations: 3, rerank: false } }
}

/// Retrieve contexts for `query` and answer from them. `embedder` must be the
/// port `index` was built with; it is only called when `opts.rerank` is set.
pub fn ask(index: &Index, query: &str, top_k: usize, filters: &Filters, opts: &AnswerOptions, embedder: &dyn EmbedderPort) -> Result<Answer> {
    let mut candidates = retrieve(index, query, top_k, filters)?;
    if candidates.is_empty() { return Err(Error::Grounding(format!("no context matches query '{query}'"))); }
    if opts.rerank {
        let query_vec = embed_query(index, embedder, query)?;
        candidates = rerank(candidates, &query_vec);
    }
    let terms = Tokenizer::shared().tokenize(query);
    synthesize(&terms, &candidates, opts)
}

/// Pick the best sentence of each context, in rank order, until
/// `max_citations` distinct sentences are selected.
///
/// A sentence scores the number of distinct query terms it contains; the
/// earliest wins ties and a zero score is never selected. The answer is the
/// selected sentences joined by a space, one citation each.
pub fn synthesize(terms: &[String], candidates: &[Candidate], opts: &AnswerOptions) -> Result<Answer> {
    if opts.max_citations == 0 { return Err(Error::Validation("max_citations must be at least 1".into())); }
    let query: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
    let tokenizer = Tokenizer::shared();
    let contexts: Vec<Context> = candidates.iter().map(Context::from).collect();

    let mut picked: Vec<(usize, SentenceSpan, String)> = Vec::new();
    for (ci, ctx) in contexts.iter().enumerate() {
        if picked.len() >= opts.max_citations { break; }
        let mut best: Option<(usize, SentenceSpan, String)> = None;
        for span in split_sentences(&ctx.text) {
            let sentence = slice_chars(&ctx.text, span);
            if picked.iter().any(|(_, _, s)| *s == sentence) { continue; }
            let tokens = tokenizer.tokenize(&sentence);
            let hits = query.iter().filter(|t| tokens.iter().any(|tok| tok == *t)).count();
            if hits > 0 && best.as_ref().map_or(true, |(b, _, _)| hits > *b) { best = Some((hits, span, sentence)); }
        }
        if let Some((_, span, sentence)) = best { picked.push((ci, span, sentence)); }
    }
    if picked.is_empty() { return Err(Error::Grounding("no sentence in the retrieved contexts matches the query".into())); }

    let text = picked.iter().map(|(_, _, s)| s.as_str()).collect::<Vec<_>>().join(" ");
    let citations = picked
        .iter()
        .map(|(ci, span, _)| Citation { doc_id: contexts[*ci].doc_id.clone(), context: *ci, start: span.start, end: span.end })
        .collect();
    let answer = Answer { text, citations, contexts };
    verify_grounding(&answer)?;
    debug!(citations = answer.citations.len(), contexts = answer.contexts.len(), "answer synthesized");
    Ok(answer)
}
