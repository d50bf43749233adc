use std::sync::OnceLock;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

/// Recorded in every index; a persisted index is only valid with the same chain.
pub const TOKENIZER_ID: &str = "simple+lower+stop:v1";

pub const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| (*s).to_string())))
		.build()
}

/// Index-time and query-time tokenizer.
#[derive(Clone)]
pub struct Tokenizer { analyzer: TextAnalyzer }

impl Default for Tokenizer {
	fn default() -> Self { Self { analyzer: build_analyzer() } }
}

impl Tokenizer {
	pub fn new() -> Self { Self::default() }

	/// Process-wide instance.
	pub fn shared() -> &'static Tokenizer {
		static SHARED: OnceLock<Tokenizer> = OnceLock::new();
		SHARED.get_or_init(Tokenizer::new)
	}

	pub fn id(&self) -> &'static str { TOKENIZER_ID }

	/// Lowercased, stop-word-free tokens in text order.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut out = Vec::new();
		while stream.advance() { out.push(stream.token().text.clone()); }
		out
	}
}

impl std::fmt::Debug for Tokenizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Tokenizer").field("id", &TOKENIZER_ID).finish() }
}
