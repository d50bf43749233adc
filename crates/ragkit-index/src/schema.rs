//! On-disk layout: `MAGIC` · version (u16 LE) · blake3(payload) · payload.
//! The payload is the bincode encoding of [`crate::Index`].

pub const MAGIC: &[u8; 8] = b"RAGKIDX\0";
pub const FORMAT_VERSION: u16 = 1;
pub const DIGEST_LEN: usize = 32;
pub const HEADER_LEN: usize = MAGIC.len() + 2 + DIGEST_LEN;

pub fn encode_header(payload: &[u8]) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..MAGIC.len()].copy_from_slice(MAGIC);
    header[MAGIC.len()..MAGIC.len() + 2].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    header[MAGIC.len() + 2..].copy_from_slice(blake3::hash(payload).as_bytes());
    header
}
