//! Extractive answers with citations that are checkable against the
//! contexts returned in the same answer.
pub mod guardrails;
pub mod rerank;
pub mod sentences;
pub mod synth;

pub use guardrails::verify_grounding;
pub use rerank::rerank;
pub use synth::{ask, synthesize, AnswerOptions};
