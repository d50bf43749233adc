//! Fixed-window chunking over character offsets.

use crate::error::{Error, Result};
use crate::types::{ChunkParams, ChunkWithoutEmbedding, RawDoc, TailPolicy};

pub const PAD_CHAR: char = ' ';

/// Replace control characters (other than `\n`, `\r`, `\t`) with spaces.
/// The character count is unchanged, so offsets into the cleaned text are
/// offsets into the original body.
pub fn clean_text(text: &str) -> String {
    text.chars().map(|c| if c.is_control() && !matches!(c, '\n' | '\r' | '\t') { ' ' } else { c }).collect()
}

/// Slide a `chunk_size` window over `text`, advancing by `chunk_size - overlap`.
///
/// A text no longer than the window always yields exactly one chunk, whatever
/// the tail policy; an empty text yields one empty chunk.
pub fn chunk_text(doc_id: &str, text: &str, params: &ChunkParams) -> Result<Vec<ChunkWithoutEmbedding>> {
    params.validate()?;
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let size = params.chunk_size;
    let make = |start: usize, end: usize, padded: bool| {
        let mut t: String = chars[start..end].iter().collect();
        if padded { t.extend(std::iter::repeat(PAD_CHAR).take(size - (end - start))); }
        ChunkWithoutEmbedding { doc_id: doc_id.to_string(), text: t, start, end }
    };
    if n <= size { return Ok(vec![make(0, n, false)]); }

    let mut out = Vec::with_capacity(n / params.step() + 1);
    let mut start = 0usize;
    loop {
        if start + size <= n {
            out.push(make(start, start + size, false));
            if start + size == n { break; }
            start += params.step();
        } else {
            match params.tail_policy {
                TailPolicy::EmitShort => out.push(make(start, n, false)),
                TailPolicy::Drop => {}
                TailPolicy::Pad => out.push(make(start, n, true)),
            }
            break;
        }
    }
    Ok(out)
}

pub fn chunk_doc(doc: &RawDoc, params: &ChunkParams) -> Result<Vec<ChunkWithoutEmbedding>> {
    if doc.doc_id.is_empty() { return Err(Error::Validation("document with empty doc_id".into())); }
    chunk_text(&doc.doc_id, &clean_text(&doc.body), params)
}

/// Chunk a corpus; documents keep ingestion order, chunks keep `start` order.
pub fn chunk_docs(docs: &[RawDoc], params: &ChunkParams) -> Result<Vec<ChunkWithoutEmbedding>> {
    let mut all = Vec::new();
    for doc in docs { all.extend(chunk_doc(doc, params)?); }
    Ok(all)
}
