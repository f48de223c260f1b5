//! Gzip (DEFLATE, window bits 31) compression bounded by the datatable size limit.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::{Compression, Crc, Decompress, FlushDecompress, Status};
use tracing::warn;

use crate::gzip::looks_gzipped;
use crate::types::{CodecError, GZIP_HEADER_LEN, MAX_DATATABLE_SIZE};

/// Input is fed to the encoder in chunks of this size.
pub const CHUNK_SIZE: usize = 0x4000;

const GZIP_TRAILER_LEN: usize = 8;

// Header flag bits (RFC 1952).
const FHCRC: u8 = 0x02;
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;

/// Gzip-compress `input` at the default level.
///
/// # Errors
///
/// * `InputTooLarge` if `input` exceeds [`MAX_DATATABLE_SIZE`].
/// * `CompressionFailed` if the encoder fails, produces nothing, or the
///   output would not fit the same bound.
pub fn compress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    if input.len() > MAX_DATATABLE_SIZE {
        return Err(CodecError::InputTooLarge {
            len: input.len(),
            max: MAX_DATATABLE_SIZE,
        });
    }

    let mut encoder = GzEncoder::new(Vec::with_capacity(CHUNK_SIZE), Compression::default());
    for chunk in input.chunks(CHUNK_SIZE) {
        encoder
            .write_all(chunk)
            .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;
    }
    let out = encoder
        .finish()
        .map_err(|e| CodecError::CompressionFailed(e.to_string()))?;

    if out.is_empty() {
        return Err(CodecError::CompressionFailed("encoder produced no output".into()));
    }
    if out.len() > MAX_DATATABLE_SIZE {
        return Err(CodecError::CompressionFailed(format!(
            "compressed size {} exceeds {MAX_DATATABLE_SIZE} bytes",
            out.len()
        )));
    }
    Ok(out)
}

/// Inflate a gzip stream into at most `max_output` bytes and return the text
/// up to the first NUL.
///
/// Bytes after the end of the gzip member (e.g. cipher padding) are ignored.
/// A member whose DEFLATE data is complete but whose CRC32/ISIZE trailer is
/// missing is accepted: some datatable writers leave it off.
///
/// # Errors
///
/// `DecompressionFailed` for a bad header, corrupt or truncated DEFLATE data,
/// a checksum mismatch, or output past `max_output`. No partial result is
/// returned in any of these cases.
pub fn decompress(input: &[u8], max_output: usize) -> Result<Vec<u8>, CodecError> {
    let body = gzip_body(input)?;
    let (mut out, consumed) = inflate_raw(body, max_output)?;

    match body[consumed..].get(..GZIP_TRAILER_LEN) {
        Some(trailer) => {
            let expected_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
            let expected_len = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
            let mut crc = Crc::new();
            crc.update(&out);
            if crc.sum() != expected_crc || crc.amount() != expected_len {
                return Err(CodecError::DecompressionFailed(
                    "gzip checksum does not match inflated data".into(),
                ));
            }
        }
        None => warn!(
            produced = out.len(),
            "gzip trailer missing; keeping inflated data"
        ),
    }

    if let Some(nul) = out.iter().position(|&b| b == 0) {
        out.truncate(nul);
    }
    Ok(out)
}

/// Skip the gzip member header, returning the raw DEFLATE data after it.
fn gzip_body(data: &[u8]) -> Result<&[u8], CodecError> {
    if !looks_gzipped(data) {
        return Err(CodecError::DecompressionFailed("invalid gzip header".into()));
    }
    let truncated = || CodecError::DecompressionFailed("truncated gzip header".into());

    let flags = data[3];
    let mut pos = GZIP_HEADER_LEN;
    if flags & FEXTRA != 0 {
        let xlen = data.get(pos..pos + 2).ok_or_else(truncated)?;
        pos += 2 + u16::from_le_bytes([xlen[0], xlen[1]]) as usize;
    }
    for field in [FNAME, FCOMMENT] {
        if flags & field != 0 {
            let rest = data.get(pos..).ok_or_else(truncated)?;
            pos += rest.iter().position(|&b| b == 0).ok_or_else(truncated)? + 1;
        }
    }
    if flags & FHCRC != 0 {
        pos += 2;
    }
    data.get(pos..).ok_or_else(truncated)
}

/// Inflate raw DEFLATE data until its final block. Returns the output and the
/// number of input bytes the stream occupied.
fn inflate_raw(body: &[u8], max_output: usize) -> Result<(Vec<u8>, usize), CodecError> {
    let mut inflater = Decompress::new(false);
    let mut out = Vec::with_capacity(max_output.saturating_add(1));

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&body[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CodecError::DecompressionFailed(e.to_string()))?;

        if out.len() > max_output {
            return Err(CodecError::DecompressionFailed(format!(
                "inflated data exceeds {max_output} bytes"
            )));
        }
        if status == Status::StreamEnd {
            return Ok((out, inflater.total_in() as usize));
        }
        if inflater.total_in() as usize == consumed && inflater.total_out() == produced {
            return Err(CodecError::DecompressionFailed(
                "deflate stream ends before its final block".into(),
            ));
        }
    }
}
