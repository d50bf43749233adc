use ragkit_answer::{ask, synthesize, verify_grounding, AnswerOptions};
use ragkit_core::types::{ChunkParams, Filters, RawDoc, TailPolicy};
use ragkit_core::ErrorKind;
use ragkit_embed::DeterministicEmbedderPort;
use ragkit_index::{build_index, retrieve, Backend, BuildParams, Index};

fn port() -> DeterministicEmbedderPort { DeterministicEmbedderPort::default() }

fn index_of(docs: &[RawDoc], chunk: ChunkParams) -> Index {
    build_index(docs, &BuildParams::new(Backend::default(), chunk), &port()).unwrap()
}

fn cell_corpus() -> Vec<RawDoc> {
    vec![
        RawDoc::new("d1", "Mitochondria are the powerhouse of the cell.").with_title("Mito").with_categories("bio"),
        RawDoc::new("d2", "Chloroplasts perform photosynthesis in plants.").with_title("Chloro").with_categories("bio"),
    ]
}

#[test]
fn answers_cite_the_powerhouse_document() {
    let index = index_of(&cell_corpus(), ChunkParams::new(64, 0, TailPolicy::EmitShort));
    let answer = ask(&index, "What is the powerhouse of the cell?", 3, &Filters::new(), &AnswerOptions::default(), &port()).unwrap();
    assert!(!answer.citations.is_empty());
    assert_eq!(answer.citations[0].doc_id, "d1");
    assert_eq!(answer.text, "Mitochondria are the powerhouse of the cell.");
    assert_eq!(answer.contexts[0].doc_id, "d1");
    verify_grounding(&answer).unwrap();
}

#[test]
fn picks_the_best_sentence_of_each_context() {
    let docs = vec![
        RawDoc::new("a", "Plants need light. Roots absorb water and minerals from soil."),
        RawDoc::new("b", "Water moves upward through the stem. Leaves release water vapour."),
    ];
    let index = index_of(&docs, ChunkParams::new(256, 0, TailPolicy::EmitShort));
    let answer = ask(&index, "how do roots absorb water", 5, &Filters::new(), &AnswerOptions::default(), &port()).unwrap();
    assert_eq!(answer.citations.len(), 2);
    assert_eq!(answer.citations[0].doc_id, "a");
    let first = &answer.contexts[answer.citations[0].context];
    let cited: String = first.text.chars().skip(answer.citations[0].start).take(answer.citations[0].end - answer.citations[0].start).collect();
    assert_eq!(cited, "Roots absorb water and minerals from soil.");
    assert!(answer.text.starts_with("Roots absorb water"));
    assert!(answer.text.ends_with("Water moves upward through the stem."), "{}", answer.text);
}

#[test]
fn max_citations_caps_the_answer() {
    let docs: Vec<RawDoc> = (0..6).map(|i| RawDoc::new(format!("d{i}"), format!("Energy note number {i}."))).collect();
    let index = index_of(&docs, ChunkParams::new(64, 0, TailPolicy::EmitShort));
    let answer = ask(&index, "energy", 6, &Filters::new(), &AnswerOptions { max_citations: 2, ..AnswerOptions::default() }, &port()).unwrap();
    assert_eq!(answer.citations.len(), 2);
    assert_eq!(answer.contexts.len(), 6);
    assert!(synthesize(&["energy".to_string()], &[], &AnswerOptions { max_citations: 0, ..AnswerOptions::default() }).is_err());
}

#[test]
fn repeated_sentences_are_cited_once() {
    let docs = vec![RawDoc::new("x", "Sugar fuels cells."), RawDoc::new("y", "Sugar fuels cells.")];
    let index = index_of(&docs, ChunkParams::new(64, 0, TailPolicy::EmitShort));
    let answer = ask(&index, "sugar", 5, &Filters::new(), &AnswerOptions::default(), &port()).unwrap();
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.contexts.len(), 2);
}

#[test]
fn citations_are_relative_to_unpadded_context_text() {
    let docs = vec![RawDoc::new("p", "Cells divide often. Membranes hold cells together tightly")];
    let index = index_of(&docs, ChunkParams::new(20, 0, TailPolicy::Pad));
    let answer = ask(&index, "membranes cells", 5, &Filters::new(), &AnswerOptions::default(), &port()).unwrap();
    for (c, ctx) in answer.citations.iter().map(|c| (c, &answer.contexts[c.context])) {
        assert!(c.start <= c.end && c.end <= ctx.text.chars().count());
        assert_eq!(ctx.text.chars().count(), ctx.end - ctx.start, "padding is not part of a context");
    }
}

#[test]
fn no_match_is_a_grounding_error() {
    let index = index_of(&cell_corpus(), ChunkParams::new(64, 0, TailPolicy::EmitShort));
    let err = ask(&index, "quantum chromodynamics", 3, &Filters::new(), &AnswerOptions::default(), &port()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Grounding);
    let err = ask(&index, "the of", 3, &Filters::new(), &AnswerOptions::default(), &port()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn outputs_are_byte_identical_across_calls() {
    let index = index_of(&cell_corpus(), ChunkParams::new(32, 8, TailPolicy::EmitShort));
    for q in ["powerhouse of the cell", "chloroplasts", "cell plants"] {
        let r1 = serde_json::to_string(&retrieve(&index, q, 5, &Filters::new()).unwrap()).unwrap();
        let r2 = serde_json::to_string(&retrieve(&index, q, 5, &Filters::new()).unwrap()).unwrap();
        assert_eq!(r1, r2);
        let a1 = serde_json::to_string(&ask(&index, q, 5, &Filters::new(), &AnswerOptions::default(), &port()).unwrap()).unwrap();
        let a2 = serde_json::to_string(&ask(&index, q, 5, &Filters::new(), &AnswerOptions::default(), &port()).unwrap()).unwrap();
        assert_eq!(a1, a2);
    }
}

#[test]
fn rerank_is_deterministic_and_keeps_answers_grounded() {
    let index = index_of(&cell_corpus(), ChunkParams::new(32, 8, TailPolicy::EmitShort));
    let opts = AnswerOptions { rerank: true, ..AnswerOptions::default() };
    for q in ["powerhouse of the cell", "cell plants"] {
        let a1 = ask(&index, q, 5, &Filters::new(), &opts, &port()).unwrap();
        let a2 = ask(&index, q, 5, &Filters::new(), &opts, &port()).unwrap();
        assert_eq!(serde_json::to_string(&a1).unwrap(), serde_json::to_string(&a2).unwrap());
        verify_grounding(&a1).unwrap();

        let plain = ask(&index, q, 5, &Filters::new(), &AnswerOptions::default(), &port()).unwrap();
        let ids = |a: &ragkit_core::types::Answer| {
            let mut v: Vec<(String, usize)> = a.contexts.iter().map(|c| (c.doc_id.clone(), c.start)).collect();
            v.sort();
            v
        };
        assert_eq!(ids(&a1), ids(&plain), "rerank reorders contexts, never changes the set");
    }
}

#[test]
fn rerank_rejects_a_different_embedder() {
    let index = index_of(&cell_corpus(), ChunkParams::new(64, 0, TailPolicy::EmitShort));
    let opts = AnswerOptions { rerank: true, ..AnswerOptions::default() };
    let other = DeterministicEmbedderPort::new(8).unwrap();
    let err = ask(&index, "powerhouse of the cell", 3, &Filters::new(), &opts, &other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(ask(&index, "powerhouse of the cell", 3, &Filters::new(), &AnswerOptions::default(), &other).is_ok());
}
