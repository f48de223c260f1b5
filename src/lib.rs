#![forbid(unsafe_code)]
//! # datatable_codec: convert game datatable containers to JSON and back.
//!
//! A datatable container is a gzip stream, optionally AES-CBC encrypted and
//! prefixed with its 16-byte IV. Decoding finds the right key by decrypting
//! the first block with every known key and looking for a gzip header; the
//! key name is then carried in the JSON file name so the file can be
//! re-encrypted with the same key.
//!
//! ## Features
//! - **Key discovery** over a named, ordered key set (AES-128 and AES-256)
//! - **Unencrypted passthrough** for older plain-gzip datatables
//! - **Filename key binding**: `musicinfo.bin` <-> `musicinfo jp_ver169.json`
//! - **Atomic output** so a failed run never leaves a partial file
//!
//! ## Example: Round-trip a datatable in memory
//! ```no_run
//! use datatable_codec::{KeyStore, NamedKey, TrialOrder, DEFAULT_IV, decode_bytes, encode_bytes};
//!
//! let store = KeyStore::from_keys(
//!     [NamedKey::aes128("jp_ver169", *b"0123456789abcdef")],
//!     TrialOrder::Declared,
//! ).unwrap();
//!
//! let key = store.get("jp_ver169");
//! let bin = encode_bytes(br#"{"items":[]}"#, key, &DEFAULT_IV).unwrap();
//! let decoded = decode_bytes(&bin, &store).unwrap();
//! assert_eq!(decoded.json, br#"{"items":[]}"#);
//! assert_eq!(decoded.key.unwrap().name(), "jp_ver169");
//! ```
//!
//! Safety notes
//! - AES-CBC here is unauthenticated and the re-encryption IV is fixed, as
//!   the game's loader expects. This is a format converter, not a way to
//!   protect data.

mod types;
mod keys;
mod config;
mod gzip;
mod compression;
mod cipher;
mod resolve;
mod naming;
mod pipeline;

// Re-export public API from modules
pub use types::*;
pub use keys::{KeyBytes, KeyStore, NamedKey};
pub use config::{
    DEFAULT_CONFIG_FILE, KEYS_SECTION, KeyConfig, SETTINGS_SECTION, default_config_path,
    load_key_config, parse_key_config, parse_key_hex,
};
pub use gzip::{has_gzip_signature, looks_gzipped};
pub use compression::{CHUNK_SIZE, compress, decompress};
pub use cipher::{decrypt_cbc, encrypt_cbc, pad_for_key, strip_pkcs7};
pub use resolve::resolve_key;
pub use naming::{bin_path_and_key, has_extension, json_path_for};
pub use pipeline::{
    Converted, Decoded, convert_path, decode_bytes, decode_file, encode_bytes, encode_file,
    write_all_atomic,
};
