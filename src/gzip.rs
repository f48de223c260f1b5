//! Gzip header sniffing.
//!
//! Only the magic and the compression method are checked. Flags, mtime and
//! OS bytes differ between the tools that wrote datatables, so checking them
//! produces false negatives. The same check is the oracle for key discovery.

use crate::types::GZIP_HEADER_LEN;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const METHOD_DEFLATE: u8 = 0x08;

/// Magic + method only; used on a single decrypted block during key trial.
pub fn has_gzip_signature(data: &[u8]) -> bool {
    data.len() >= 3 && data[..2] == GZIP_MAGIC && data[2] == METHOD_DEFLATE
}

/// Whether a whole buffer looks like an unencrypted gzip stream.
pub fn looks_gzipped(data: &[u8]) -> bool {
    data.len() >= GZIP_HEADER_LEN && has_gzip_signature(data)
}
