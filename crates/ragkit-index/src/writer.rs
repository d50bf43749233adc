use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;

use ragkit_core::{Error, Result};

use crate::schema::{encode_header, HEADER_LEN};
use crate::Index;

/// Header followed by the bincode payload; the inverse of [`crate::reader::decode`].
pub fn encode(index: &Index) -> Result<Vec<u8>> {
    let payload = bincode::serialize(index).map_err(|e| Error::Io(format!("encode index: {e}")))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&encode_header(&payload));
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Write `index` atomically: a temp file in the target directory is renamed over `path`.
pub fn save_index(index: &Index, path: &Path) -> Result<()> {
    let bytes = encode(index)?;
    let dir = match path.parent() { Some(p) if !p.as_os_str().is_empty() => p, _ => Path::new(".") };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(format!("persist {}: {}", path.display(), e.error)))?;
    info!(path = %path.display(), chunks = index.len(), bytes = bytes.len(), "saved index");
    Ok(())
}
