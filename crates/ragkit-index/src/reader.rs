use std::fs;
use std::path::Path;

use tracing::info;

use ragkit_core::{Error, Result};

use crate::schema::{DIGEST_LEN, FORMAT_VERSION, HEADER_LEN, MAGIC};
use crate::{Index, IndexWire};

/// Load an index written by [`crate::save_index`].
///
/// A missing file is `NotFound`; a damaged or foreign file is `Io`.
pub fn load_index(path: &Path) -> Result<Index> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(format!("index {}", path.display())),
        _ => Error::Io(format!("read {}: {e}", path.display())),
    })?;
    let index = decode(&bytes).map_err(|e| match e {
        Error::Io(m) => Error::Io(format!("{}: {m}", path.display())),
        other => other,
    })?;
    info!(path = %path.display(), chunks = index.len(), "loaded index");
    Ok(index)
}

pub fn decode(bytes: &[u8]) -> Result<Index> {
    if bytes.len() < HEADER_LEN { return Err(Error::Io("file is too short to be an index".into())); }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..MAGIC.len()] != MAGIC[..] { return Err(Error::Io("not an index file (bad magic)".into())); }
    let version = u16::from_le_bytes([header[MAGIC.len()], header[MAGIC.len() + 1]]);
    if version != FORMAT_VERSION { return Err(Error::Io(format!("unsupported index format version {version}"))); }
    let digest = &header[HEADER_LEN - DIGEST_LEN..];
    if blake3::hash(payload).as_bytes().as_slice() != digest { return Err(Error::Io("checksum mismatch".into())); }
    let wire: IndexWire = bincode::deserialize(payload).map_err(|e| Error::Io(format!("decode index: {e}")))?;
    Index::try_from(wire)
}
