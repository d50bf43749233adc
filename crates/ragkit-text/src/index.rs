use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use ragkit_core::{Error, Result};

use crate::tantivy_utils::Tokenizer;

/// BM25 statistics over an ordered chunk arena.
///
/// Term ids follow sorted term order. `postings[term]` lists
/// `(chunk position, term frequency)` in ascending chunk position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Stats {
	pub vocab: BTreeMap<String, u32>,
	pub df: Vec<u32>,
	pub postings: Vec<Vec<(u32, u32)>>,
	pub chunk_lens: Vec<u32>,
	pub avgdl: f64,
}

fn to_u32(n: usize, what: &str) -> Result<u32> {
	u32::try_from(n).map_err(|_| Error::Build(format!("{what} {n} exceeds the index limit of {}", u32::MAX)))
}

impl Bm25Stats {
	/// Fails with a build error when a count does not fit the `u32` postings.
	pub fn build<'t>(texts: impl IntoIterator<Item = &'t str>, tokenizer: &Tokenizer) -> Result<Self> {
		let mut by_term: BTreeMap<String, Vec<(u32, u32)>> = BTreeMap::new();
		let mut chunk_lens = Vec::new();
		for (pos, text) in texts.into_iter().enumerate() {
			let tokens = tokenizer.tokenize(text);
			chunk_lens.push(to_u32(tokens.len(), "chunk length")?);
			let mut tf: BTreeMap<String, u32> = BTreeMap::new();
			for t in tokens { *tf.entry(t).or_insert(0) += 1; }
			let pos = to_u32(pos, "chunk position")?;
			for (term, count) in tf { by_term.entry(term).or_default().push((pos, count)); }
		}
		let total: u64 = chunk_lens.iter().map(|&l| u64::from(l)).sum();
		#[allow(clippy::cast_precision_loss)]
		let avgdl = if chunk_lens.is_empty() { 0.0 } else { total as f64 / chunk_lens.len() as f64 };
		let mut vocab = BTreeMap::new();
		let mut df = Vec::with_capacity(by_term.len());
		let mut postings = Vec::with_capacity(by_term.len());
		for (id, (term, list)) in by_term.into_iter().enumerate() {
			vocab.insert(term, to_u32(id, "term id")?);
			df.push(to_u32(list.len(), "document frequency")?);
			postings.push(list);
		}
		Ok(Self { vocab, df, postings, chunk_lens, avgdl })
	}

	pub fn num_chunks(&self) -> usize { self.chunk_lens.len() }

	pub fn term_id(&self, term: &str) -> Option<u32> { self.vocab.get(term).copied() }

	/// Frequency of `term` in the chunk at `pos`.
	pub fn tf(&self, term: &str, pos: usize) -> u32 {
		let Some(id) = self.term_id(term) else { return 0 };
		let list = &self.postings[id as usize];
		list.binary_search_by_key(&pos, |&(p, _)| p as usize).map_or(0, |i| list[i].1)
	}

	/// Internal consistency check, used after decoding a persisted index.
	pub fn is_consistent(&self) -> bool {
		let n = self.vocab.len();
		self.df.len() == n
			&& self.postings.len() == n
			&& self.vocab.values().all(|&id| (id as usize) < n)
			&& self.postings.iter().zip(&self.df).all(|(list, &df)| {
				list.len() == df as usize
					&& list.windows(2).all(|w| w[0].0 < w[1].0)
					&& list.iter().all(|&(p, tf)| (p as usize) < self.chunk_lens.len() && tf > 0)
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_beyond_u32_are_build_errors() {
		assert_eq!(to_u32(7, "term id"), Ok(7));
		let err = to_u32(usize::MAX, "chunk position").unwrap_err();
		assert_eq!(err.kind(), ragkit_core::ErrorKind::Build);
		assert!(err.message().contains("chunk position"));
	}
}
