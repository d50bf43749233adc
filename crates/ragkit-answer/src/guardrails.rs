use ragkit_core::types::Answer;
use ragkit_core::{Error, Result};

/// Enforce that an answer is grounded in its own contexts.
///
/// The text must be non-empty and carry at least one citation; each
/// citation must point at an existing context with the same `doc_id`, its
/// span must satisfy `0 <= start <= end <= len(context.text)` in characters,
/// and the cited text must appear in the answer.
pub fn verify_grounding(answer: &Answer) -> Result<()> {
    if answer.text.trim().is_empty() { return Err(Error::Grounding("answer text is empty".into())); }
    if answer.contexts.is_empty() { return Err(Error::Grounding("answer has no contexts".into())); }
    if answer.citations.is_empty() { return Err(Error::Grounding("answer has no citations".into())); }
    for (i, cit) in answer.citations.iter().enumerate() {
        let ctx = answer.contexts.get(cit.context).ok_or_else(|| {
            Error::Grounding(format!("citation {i} points at context {} of {}", cit.context, answer.contexts.len()))
        })?;
        if ctx.doc_id != cit.doc_id {
            return Err(Error::Grounding(format!("citation {i} names doc '{}' but context {} is '{}'", cit.doc_id, cit.context, ctx.doc_id)));
        }
        let len = ctx.text.chars().count();
        if cit.start > cit.end || cit.end > len {
            return Err(Error::Grounding(format!("citation {i} span {}..{} does not fit context of length {len}", cit.start, cit.end)));
        }
        let cited: String = ctx.text.chars().skip(cit.start).take(cit.end - cit.start).collect();
        if !answer.text.contains(&cited) {
            return Err(Error::Grounding(format!("citation {i} text is not part of the answer")));
        }
    }
    Ok(())
}
