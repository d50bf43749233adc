//! Storage adapters: files on disk and an in-memory double for tests.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::traits::{StorageRead, StorageWrite};
use crate::types::{Chunk, RawDoc};

fn check_record(doc: RawDoc, origin: &str) -> Result<RawDoc> {
    if doc.doc_id.trim().is_empty() { return Err(Error::Validation(format!("{origin}: record has an empty doc_id"))); }
    Ok(doc)
}

/// Reads `*.jsonl`, `*.json` (array) or a directory of `*.txt` files and
/// writes chunks as JSONL.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStorage;

impl FileStorage {
    pub fn new() -> Self { Self }

    fn read_jsonl(path: &Path) -> Vec<Result<RawDoc>> {
        let content = match fs::read_to_string(path) { Ok(c) => c, Err(e) => return vec![Err(e.into())] };
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                let origin = format!("{}:{}", path.display(), i + 1);
                serde_json::from_str::<RawDoc>(line)
                    .map_err(|e| Error::Io(format!("{origin}: {e}")))
                    .and_then(|doc| check_record(doc, &origin))
            })
            .collect()
    }

    fn read_json(path: &Path) -> Vec<Result<RawDoc>> {
        let content = match fs::read_to_string(path) { Ok(c) => c, Err(e) => return vec![Err(e.into())] };
        match serde_json::from_str::<Vec<RawDoc>>(&content) {
            Ok(docs) => docs
                .into_iter()
                .enumerate()
                .map(|(i, doc)| check_record(doc, &format!("{}[{i}]", path.display())))
                .collect(),
            Err(e) => vec![Err(Error::Io(format!("{}: {e}", path.display())))],
        }
    }

    fn read_txt_dir(root: &Path) -> Vec<Result<RawDoc>> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.map_err(|err| warn!(error = %err, "skipping unreadable directory entry")).ok())
            .filter(|e| e.file_type().is_file() && e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
            .map(walkdir::DirEntry::into_path)
            .collect();
        files.sort();
        files.iter().map(|file| Self::read_txt_file(root, file)).collect()
    }

    fn read_txt_file(root: &Path, file: &Path) -> Result<RawDoc> {
        let body = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(file)?).to_string(),
        };
        let relative = file.strip_prefix(root).unwrap_or(file);
        let doc_id = relative.with_extension("").components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        let title = file.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let categories = relative
            .parent()
            .and_then(Path::to_str)
            .filter(|p| !p.is_empty())
            .map_or_else(|| "misc".to_string(), |p| p.replace(std::path::MAIN_SEPARATOR, "/"));
        check_record(RawDoc { doc_id, title, body, categories }, &file.display().to_string())
    }
}

impl StorageRead for FileStorage {
    fn read_docs(&self, path: &Path) -> Vec<Result<RawDoc>> {
        if !path.exists() { return vec![Err(Error::NotFound(format!("corpus {}", path.display())))]; }
        let records = if path.is_dir() {
            Self::read_txt_dir(path)
        } else {
            match path.extension().and_then(|s| s.to_str()) {
                Some("jsonl" | "ndjson") => Self::read_jsonl(path),
                Some("json") => Self::read_json(path),
                _ => vec![Err(Error::Validation(format!("unsupported corpus format: {}", path.display())))],
            }
        };
        debug!(path = %path.display(), records = records.len(), "read corpus");
        records
    }
}

impl StorageWrite for FileStorage {
    /// Writes through a temp file in the destination directory, then renames.
    fn write_chunks(&self, path: &Path, chunks: &[Chunk]) -> Result<()> {
        let dir = match path.parent() { Some(p) if !p.as_os_str().is_empty() => p, _ => Path::new(".") };
        fs::create_dir_all(dir)?;
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            for c in chunks {
                serde_json::to_writer(&mut w, c).map_err(|e| Error::Io(e.to_string()))?;
                w.write_all(b"\n")?;
            }
            w.flush()?;
        }
        tmp.persist(path).map_err(|e| Error::Io(format!("persist {}: {}", path.display(), e.error)))?;
        debug!(path = %path.display(), chunks = chunks.len(), "wrote chunks");
        Ok(())
    }
}

/// Keeps corpora and written chunks in memory, keyed by path.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    docs: Mutex<BTreeMap<PathBuf, Vec<RawDoc>>>,
    chunks: Mutex<BTreeMap<PathBuf, Vec<Chunk>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn preload(&self, path: impl Into<PathBuf>, docs: Vec<RawDoc>) {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner).insert(path.into(), docs);
    }

    pub fn with_docs(self, path: impl Into<PathBuf>, docs: Vec<RawDoc>) -> Self { self.preload(path, docs); self }

    pub fn chunks_at(&self, path: &Path) -> Option<Vec<Chunk>> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner).get(path).cloned()
    }
}

impl StorageRead for InMemoryStorage {
    fn read_docs(&self, path: &Path) -> Vec<Result<RawDoc>> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        match docs.get(path) {
            Some(list) => list
                .iter()
                .enumerate()
                .map(|(i, d)| check_record(d.clone(), &format!("{}[{i}]", path.display())))
                .collect(),
            None => vec![Err(Error::NotFound(format!("corpus {}", path.display())))],
        }
    }
}

impl StorageWrite for InMemoryStorage {
    fn write_chunks(&self, path: &Path, chunks: &[Chunk]) -> Result<()> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner).insert(path.to_path_buf(), chunks.to_vec());
        Ok(())
    }
}
