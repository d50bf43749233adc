mod args;

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ragkit_core::config::{expand_path, Config};
use ragkit_core::storage::FileStorage;
use ragkit_core::{Error, ErrorKind, Result};
use ragkit_engine::RagApp;

use args::{Cli, Command, QueryArgs};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RAGKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Io => 4,
        ErrorKind::Build => 5,
        ErrorKind::Grounding => 6,
    }
}

fn error_line(e: &Error) -> String { format!("Error [{}]: {}", e.kind().as_str(), e.message()) }

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") { pb.set_style(style); }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| Error::Io(e.to_string()))?;
    writeln!(out)?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).and_then(|value| print_json(&value)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

/// Execute one command and return what it prints on stdout.
fn run(cli: Cli) -> Result<serde_json::Value> {
    let mut overrides = cli.overrides;
    if matches!(cli.command, Command::Ask { rerank: true, .. }) { overrides.push("answer.rerank=true".into()); }
    let config = Config::load_with(cli.config.as_deref(), &overrides).map_err(Error::from_fault)?;
    let app = RagApp::from_config(&config)?;
    debug!(settings = ?app.settings(), "loaded configuration");
    let storage = FileStorage::new();

    match cli.command {
        Command::Chunk { input, out } => {
            let (input, out) = (expand_path(input), expand_path(out));
            let pb = spinner(&format!("Chunking {}", input.display()));
            let written = app.export_chunks(&storage, &input, &storage, &out);
            pb.finish_and_clear();
            Ok(json!({ "chunks": written?, "out": out.display().to_string() }))
        }
        Command::Build { input, index, backend } => {
            let (input, index_path) = (expand_path(input), expand_path(index));
            let backend = backend.unwrap_or_else(|| app.settings().backend.name.clone());
            let pb = spinner(&format!("Indexing {}", input.display()));
            let built = app.build_index_from(&storage, &input, &backend).and_then(|idx| {
                pb.set_message(format!("Saving {}", index_path.display()));
                app.save_index(&idx, &index_path).map(|()| idx)
            });
            pb.finish_and_clear();
            let idx = built?;
            let m = idx.manifest();
            Ok(json!({
                "index": index_path.display().to_string(),
                "docs": idx.docs().len(),
                "chunks": idx.len(),
                "backend": m.backend,
                "k1": m.bm25.k1,
                "b": m.bm25.b,
                "embedder_id": m.embedder_id,
            }))
        }
        Command::Retrieve(q) => {
            let (idx, top_k) = open(&app, &q)?;
            let candidates = app.retrieve(&idx, &q.query, top_k, &q.filter_map())?;
            let hits: Vec<_> = candidates
                .iter()
                .enumerate()
                .map(|(rank, c)| {
                    json!({
                        "rank": rank + 1,
                        "doc_id": c.chunk.doc_id,
                        "score": c.score,
                        "start": c.chunk.start,
                        "end": c.chunk.end,
                        "text": c.chunk.citable_text(),
                    })
                })
                .collect();
            Ok(serde_json::Value::Array(hits))
        }
        Command::Ask { query: q, .. } => {
            let (idx, top_k) = open(&app, &q)?;
            let answer = app.ask(&idx, &q.query, top_k, &q.filter_map())?;
            serde_json::to_value(&answer).map_err(|e| Error::Io(e.to_string()))
        }
    }
}

fn open(app: &RagApp, q: &QueryArgs) -> Result<(ragkit_engine::Index, usize)> {
    let path = expand_path(&q.index);
    let idx = app.load_index(&path)?;
    Ok((idx, q.top_k.unwrap_or(app.settings().retrieval.default_top_k)))
}
