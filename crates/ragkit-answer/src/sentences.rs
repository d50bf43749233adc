/// Character span `[start, end)` of one trimmed sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}

/// Split on `.`, `!` or `?` followed by whitespace or end of text, and on newlines.
/// Spans are trimmed of surrounding whitespace; empty sentences are skipped.
pub fn split_sentences(text: &str) -> Vec<SentenceSpan> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut out = Vec::new();
    let mut push = |mut s: usize, mut e: usize| {
        while s < e && chars[s].is_whitespace() { s += 1; }
        while e > s && chars[e - 1].is_whitespace() { e -= 1; }
        if s < e { out.push(SentenceSpan { start: s, end: e }); }
    };
    let mut from = 0;
    for i in 0..n {
        let c = chars[i];
        if c == '\n' {
            push(from, i);
            from = i + 1;
        } else if matches!(c, '.' | '!' | '?') && (i + 1 == n || chars[i + 1].is_whitespace()) {
            push(from, i + 1);
            from = i + 1;
        }
    }
    push(from, n);
    out
}

/// The characters of `text` within `span`.
pub fn slice_chars(text: &str, span: SentenceSpan) -> String { text.chars().skip(span.start).take(span.end - span.start).collect() }
