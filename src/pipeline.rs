//! Decode (`.bin` -> `.json`) and encode (`.json` -> `.bin`) flows.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::cipher::{decrypt_cbc, encrypt_cbc, pad_for_key};
use crate::compression::{compress, decompress};
use crate::config::KeyConfig;
use crate::gzip::looks_gzipped;
use crate::keys::{KeyStore, NamedKey};
use crate::naming::{bin_path_and_key, has_extension, json_path_for};
use crate::resolve::resolve_key;
use crate::types::{CodecError, IV_LEN, MAX_DATATABLE_SIZE, MIN_ENCRYPTED_LEN};

/// Result of decoding a container in memory.
#[derive(Debug)]
pub struct Decoded<'a> {
    /// JSON text up to the first NUL.
    pub json: Vec<u8>,
    /// Key the container was encrypted with; `None` for plain gzip input.
    pub key: Option<&'a NamedKey>,
}

/// Result of converting a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub output: PathBuf,
    /// Name of the key used, if the container is encrypted.
    pub key: Option<String>,
}

/// Decode a container: plain gzip, or `IV || AES-CBC(gzip)`.
///
/// # Errors
///
/// * `InputTooLarge` above [`MAX_DATATABLE_SIZE`].
/// * `InputTooShort` for non-gzip input shorter than IV plus one block.
/// * `NoMatchingKey` if no key in `store` decrypts to a gzip header.
/// * `DecryptionFailed` / `DecompressionFailed` for corrupt data.
pub fn decode_bytes<'a>(data: &[u8], store: &'a KeyStore) -> Result<Decoded<'a>, CodecError> {
    if data.len() > MAX_DATATABLE_SIZE {
        return Err(CodecError::InputTooLarge {
            len: data.len(),
            max: MAX_DATATABLE_SIZE,
        });
    }

    if looks_gzipped(data) {
        debug!(len = data.len(), "input is unencrypted gzip");
        return Ok(Decoded {
            json: decompress(data, MAX_DATATABLE_SIZE)?,
            key: None,
        });
    }

    if data.len() < MIN_ENCRYPTED_LEN {
        return Err(CodecError::InputTooShort {
            len: data.len(),
            min: MIN_ENCRYPTED_LEN,
        });
    }
    let (iv, body) = data
        .split_first_chunk::<IV_LEN>()
        .ok_or(CodecError::Invalid("container has no IV"))?;

    let key = resolve_key(store, body, iv).ok_or(CodecError::NoMatchingKey)?;
    let plain = decrypt_cbc(key.bytes(), iv, body)?;
    let json = decompress(&plain, MAX_DATATABLE_SIZE)?;

    Ok(Decoded {
        json,
        key: Some(key),
    })
}

/// Encode JSON text into a container.
///
/// Without a key the gzip stream is the container. With a key the stream is
/// padded (see [`pad_for_key`]), encrypted under `iv`, and written as
/// `iv || ciphertext`.
///
/// # Errors
///
/// * `InputTooLarge` if the text plus IV, or the finished container, would
///   exceed [`MAX_DATATABLE_SIZE`].
/// * `CompressionFailed` if compression fails.
pub fn encode_bytes(
    json: &[u8],
    key: Option<&NamedKey>,
    iv: &[u8; IV_LEN],
) -> Result<Vec<u8>, CodecError> {
    if json.len() + IV_LEN > MAX_DATATABLE_SIZE {
        return Err(CodecError::InputTooLarge {
            len: json.len(),
            max: MAX_DATATABLE_SIZE - IV_LEN,
        });
    }

    let mut gz = compress(json)?;
    let Some(key) = key else {
        debug!(len = gz.len(), "writing unencrypted container");
        return Ok(gz);
    };

    pad_for_key(&mut gz, key.bytes());
    if gz.len() + IV_LEN > MAX_DATATABLE_SIZE {
        return Err(CodecError::InputTooLarge {
            len: gz.len() + IV_LEN,
            max: MAX_DATATABLE_SIZE,
        });
    }

    let ct = encrypt_cbc(key.bytes(), iv, &gz)?;
    let mut out = Vec::with_capacity(IV_LEN + ct.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&ct);
    debug!(key = key.name(), len = out.len(), "encrypted container");
    Ok(out)
}

/// Decode `input` and write the JSON next to it, named after the key found
/// (or to `output` when given).
pub fn decode_file(
    input: &Path,
    output: Option<&Path>,
    store: &KeyStore,
) -> Result<Converted, CodecError> {
    let data = fs::read(input)?;
    let decoded = decode_bytes(&data, store)?;

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| json_path_for(input, decoded.key));
    write_all_atomic(&out, &decoded.json)?;
    info!(input = %input.display(), output = %out.display(), "decoded datatable");

    Ok(Converted {
        output: out,
        key: decoded.key.map(|k| k.name().to_owned()),
    })
}

/// Encode `input` into a container. The key comes from the key-name suffix
/// of the input file name; the output defaults to `<stem>.bin`.
pub fn encode_file(
    input: &Path,
    output: Option<&Path>,
    config: &KeyConfig,
) -> Result<Converted, CodecError> {
    let json = fs::read(input)?;
    let (bin_path, key) = bin_path_and_key(input, &config.store);
    let bytes = encode_bytes(&json, key, &config.iv)?;

    let out = output.map(Path::to_path_buf).unwrap_or(bin_path);
    write_all_atomic(&out, &bytes)?;
    info!(input = %input.display(), output = %out.display(), "encoded datatable");

    Ok(Converted {
        output: out,
        key: key.map(|k| k.name().to_owned()),
    })
}

/// Decode a `.bin` or encode a `.json`, chosen by extension.
///
/// # Errors
///
/// `UnknownFileExtension` for any other extension, otherwise as
/// [`decode_file`] / [`encode_file`].
pub fn convert_path(
    input: &Path,
    output: Option<&Path>,
    config: &KeyConfig,
) -> Result<Converted, CodecError> {
    if has_extension(input, "bin") {
        decode_file(input, output, &config.store)
    } else if has_extension(input, "json") {
        encode_file(input, output, config)
    } else {
        Err(CodecError::UnknownFileExtension(input.to_path_buf()))
    }
}

/// Atomically write data to a file using a temporary file in the same
/// directory, so a failed run never leaves a partial target behind.
///
/// # Errors
///
/// Returns `CodecError::WriteFailed` for any I/O failure.
pub fn write_all_atomic(path: &Path, data: &[u8]) -> Result<(), CodecError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(CodecError::WriteFailed)?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(CodecError::WriteFailed)?;
    tmp.write_all(data).map_err(CodecError::WriteFailed)?;
    tmp.flush().map_err(CodecError::WriteFailed)?;
    tmp.as_file_mut().sync_all().map_err(CodecError::WriteFailed)?;
    tmp.persist(path)
        .map_err(|e| CodecError::WriteFailed(e.error))?;
    Ok(())
}
