use std::fs;
use std::path::Path;
use tempfile::TempDir;

use ragkit_core::config::Settings;
use ragkit_core::storage::{FileStorage, InMemoryStorage};
use ragkit_core::traits::EmbedderPort;
use ragkit_core::types::{Filters, RawDoc, TailPolicy};
use ragkit_core::ErrorKind;
use ragkit_engine::{verify_grounding, Index, RagApp};

fn two_docs() -> Vec<RawDoc> {
    vec![
        RawDoc::new("d1", "Mitochondria are the powerhouse of the cell."),
        RawDoc::new("d2", "Chloroplasts perform photosynthesis in plants."),
    ]
}

#[test]
fn end_to_end_retrieve_and_ask_after_reload() {
    let tmp = TempDir::new().unwrap();
    let app = RagApp::ci();
    let index = app.build_index(&two_docs(), "bm25", 64, 0, TailPolicy::EmitShort).unwrap();
    let path = tmp.path().join("ragkit.idx");
    app.save_index(&index, &path).unwrap();
    let index = app.load_index(&path).unwrap();

    let candidates = app.retrieve(&index, "powerhouse of the cell", 3, &Filters::new()).unwrap();
    assert!(!candidates.is_empty());
    assert_eq!(candidates[0].chunk.doc_id, "d1");

    let answer = app.ask(&index, "What is the powerhouse of the cell?", 3, &Filters::new()).unwrap();
    assert!(!answer.citations.is_empty());
    assert_eq!(answer.citations[0].doc_id, "d1");
    verify_grounding(&answer).unwrap();
}

#[test]
fn outputs_are_byte_identical_across_runs_and_reloads() {
    let tmp = TempDir::new().unwrap();
    let app = RagApp::ci();
    let index = app.build_index(&two_docs(), "bm25", 64, 0, TailPolicy::EmitShort).unwrap();
    let path = tmp.path().join("ragkit.idx");
    app.save_index(&index, &path).unwrap();
    let reloaded = app.load_index(&path).unwrap();

    let run = |idx: &Index| {
        let r = serde_json::to_string(&app.retrieve(idx, "cell plants", 3, &Filters::new()).unwrap()).unwrap();
        let a = serde_json::to_string(&app.ask(idx, "powerhouse of the cell", 3, &Filters::new()).unwrap()).unwrap();
        (r, a)
    };
    assert_eq!(run(&index), run(&index));
    assert_eq!(run(&index), run(&reloaded));
}

#[test]
fn backend_string_selects_bm25_constants() {
    let app = RagApp::ci();
    let tuned = app.build_index(&two_docs(), "bm25:k1=2.0,b=0.3", 64, 0, TailPolicy::EmitShort).unwrap();
    assert_eq!((tuned.manifest().bm25.k1, tuned.manifest().bm25.b), (2.0, 0.3));

    let default = app.build_index(&two_docs(), "bm25", 64, 0, TailPolicy::EmitShort).unwrap();
    assert_eq!((default.manifest().bm25.k1, default.manifest().bm25.b), (1.2, 0.75));

    let err = app.build_index(&two_docs(), "dense", 64, 0, TailPolicy::EmitShort).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn configured_constants_apply_to_plain_backend() {
    let mut settings = Settings::default();
    settings.backend.k1 = 0.9;
    settings.backend.b = 0.4;
    let app = RagApp::from_settings(settings).unwrap();
    let index = app.build_index_configured(&two_docs()).unwrap();
    assert_eq!((index.manifest().bm25.k1, index.manifest().bm25.b), (0.9, 0.4));
}

#[test]
fn invalid_settings_are_rejected() {
    let mut settings = Settings::default();
    settings.answer.max_citations = 0;
    let err = RagApp::from_settings(settings).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn build_from_storage_reads_through_the_port() {
    let app = RagApp::ci();
    let storage = InMemoryStorage::new().with_docs("corpus", two_docs());
    let index = app.build_index_from(&storage, Path::new("corpus"), "bm25").unwrap();
    assert_eq!(index.docs().len(), 2);

    let err = app.build_index_from(&storage, Path::new("elsewhere"), "bm25").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn a_bad_record_fails_the_whole_read() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("docs.jsonl");
    fs::write(&path, "{\"doc_id\":\"d1\",\"abstract\":\"Cells divide.\"}\n{broken\n").unwrap();
    let err = RagApp::ci().build_index_from(&FileStorage::new(), &path, "bm25").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn export_writes_embedded_chunks_as_jsonl() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("docs.jsonl");
    fs::write(
        &input,
        "{\"doc_id\":\"d1\",\"abstract\":\"Mitochondria are the powerhouse of the cell.\"}\n{\"doc_id\":\"d2\",\"abstract\":\"Chloroplasts perform photosynthesis in plants.\"}\n",
    )
    .unwrap();
    let out = tmp.path().join("out/chunks.jsonl");
    let storage = FileStorage::new();
    let app = RagApp::ci();
    let n = app.export_chunks(&storage, &input, &storage, &out).unwrap();
    assert_eq!(n, 2);

    let lines: Vec<serde_json::Value> =
        fs::read_to_string(&out).unwrap().lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["doc_id"], "d1");
    assert_eq!(lines[0]["start"], 0);
    assert_eq!(lines[0]["embedding"].as_array().unwrap().len(), app.embedder().dim());
}

#[test]
fn chunk_corpus_uses_configured_window() {
    let mut settings = Settings::default();
    settings.chunk.chunk_size = 10;
    settings.chunk.overlap = 2;
    settings.chunk.tail_policy = TailPolicy::Drop;
    let app = RagApp::from_settings(settings).unwrap();
    let chunks = app.chunk_corpus(&two_docs()).unwrap();
    assert!(chunks.iter().all(|c| c.end - c.start == 10));
    assert_eq!(chunks[0].start, 0);
    assert_eq!(chunks[1].start, 8);
}

#[test]
fn missing_index_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = RagApp::ci().load_index(&tmp.path().join("nope.idx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn profile_selects_the_embedder() {
    let mut settings = Settings::default();
    settings.embedding.dim = 8;
    let app = RagApp::from_settings(settings.clone()).unwrap();
    assert_eq!(app.embedder().embedder_id(), "hash:xxh64:d8");

    settings.profile = "prod".into();
    let err = RagApp::from_settings(settings).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn reranked_answers_survive_a_reload() {
    let tmp = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.answer.rerank = true;
    settings.chunk.chunk_size = 32;
    settings.chunk.overlap = 8;
    let app = RagApp::from_settings(settings).unwrap();
    let index = app.build_index_configured(&two_docs()).unwrap();
    let path = tmp.path().join("ragkit.idx");
    app.save_index(&index, &path).unwrap();
    let reloaded = app.load_index(&path).unwrap();

    for q in ["What is the powerhouse of the cell?", "cell plants"] {
        let before = serde_json::to_string(&app.ask(&index, q, 3, &Filters::new()).unwrap()).unwrap();
        let again = serde_json::to_string(&app.ask(&index, q, 3, &Filters::new()).unwrap()).unwrap();
        let after = serde_json::to_string(&app.ask(&reloaded, q, 3, &Filters::new()).unwrap()).unwrap();
        assert_eq!(before, again);
        assert_eq!(before, after);
    }
    let answer = app.ask(&reloaded, "What is the powerhouse of the cell?", 3, &Filters::new()).unwrap();
    assert_eq!(answer.citations[0].doc_id, "d1");
    verify_grounding(&answer).unwrap();
}
