use serde::{Deserialize, Serialize};

use ragkit_core::{Error, Result};

use crate::index::Bm25Stats;

/// Okapi BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
	pub k1: f64,
	pub b: f64,
}

impl Default for Bm25Params {
	fn default() -> Self { Self { k1: 1.2, b: 0.75 } }
}

impl Bm25Params {
	pub fn new(k1: f64, b: f64) -> Result<Self> {
		let p = Self { k1, b };
		p.validate()?;
		Ok(p)
	}

	pub fn validate(&self) -> Result<()> {
		if !self.k1.is_finite() || self.k1 < 0.0 { return Err(Error::Validation(format!("k1 must be a non-negative number, got {}", self.k1))); }
		if !(0.0..=1.0).contains(&self.b) { return Err(Error::Validation(format!("b must be within [0, 1], got {}", self.b))); }
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChunk {
	pub position: usize,
	pub score: f64,
}

/// `ln(1 + (N - df + 0.5) / (df + 0.5))`, always positive.
pub fn idf(num_chunks: usize, df: u32) -> f64 {
	#[allow(clippy::cast_precision_loss)]
	let n = num_chunks as f64;
	let df = f64::from(df);
	(1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// Distinct known query terms as ids, ascending.
pub fn query_term_ids(stats: &Bm25Stats, terms: &[String]) -> Vec<u32> {
	let mut ids: Vec<u32> = terms.iter().filter_map(|t| stats.term_id(t)).collect();
	ids.sort_unstable();
	ids.dedup();
	ids
}

/// Score every eligible chunk containing at least one query term.
///
/// Per-chunk sums run in ascending term id order. Output is sorted by
/// descending score, ties by ascending chunk position; zero scores are
/// never returned.
pub fn rank(stats: &Bm25Stats, params: &Bm25Params, terms: &[String], eligible: impl Fn(usize) -> bool) -> Vec<ScoredChunk> {
	let n = stats.num_chunks();
	let avgdl = if stats.avgdl > 0.0 { stats.avgdl } else { 1.0 };
	let mut scores = vec![0.0f64; n];
	for id in query_term_ids(stats, terms) {
		let id = id as usize;
		let w = idf(n, stats.df[id]);
		for &(pos, tf) in &stats.postings[id] {
			let pos = pos as usize;
			if !eligible(pos) { continue; }
			let tf = f64::from(tf);
			let len = f64::from(stats.chunk_lens[pos]);
			scores[pos] += w * tf * (params.k1 + 1.0) / (tf + params.k1 * (1.0 - params.b + params.b * len / avgdl));
		}
	}
	let mut ranked: Vec<ScoredChunk> = scores
		.into_iter()
		.enumerate()
		.filter(|&(_, s)| s > 0.0)
		.map(|(position, score)| ScoredChunk { position, score })
		.collect();
	ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.position.cmp(&b.position)));
	ranked
}
