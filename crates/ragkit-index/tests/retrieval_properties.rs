use proptest::prelude::*;

use ragkit_core::types::{ChunkParams, Filters, RawDoc, TailPolicy};
use ragkit_embed::DeterministicEmbedderPort;
use ragkit_index::{build_index, retrieve, Backend, BuildParams};

const WORDS: &[&str] = &["cell", "plant", "energy", "light", "water", "protein", "membrane", "root", "leaf", "sugar"];

fn doc_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::sample::select(WORDS), 1..12).prop_map(|w| w.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn smaller_top_k_is_a_prefix(texts in proptest::collection::vec(doc_text(), 1..8), query in doc_text(), n in 1usize..5, extra in 1usize..10) {
        let docs: Vec<RawDoc> = texts.into_iter().enumerate().map(|(i, t)| RawDoc::new(format!("d{i}"), t)).collect();
        let params = BuildParams::new(Backend::default(), ChunkParams::new(24, 4, TailPolicy::EmitShort));
        let index = build_index(&docs, &params, &DeterministicEmbedderPort::default()).unwrap();
        let small = retrieve(&index, &query, n, &Filters::new()).unwrap();
        let large = retrieve(&index, &query, n + extra, &Filters::new()).unwrap();
        prop_assert!(small.len() <= n);
        prop_assert_eq!(&large[..small.len()], &small[..]);
        prop_assert!(small.iter().all(|c| c.score > 0.0));
    }
}
