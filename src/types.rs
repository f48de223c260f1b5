//! Core constants, policies and the error type for datatable_codec.

use std::path::PathBuf;
use thiserror::Error;

/// Hard ceiling on a decompressed datatable (the game's fixed inflate buffer).
pub const MAX_DATATABLE_SIZE: usize = 0x200000;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Length of the IV stored in front of an encrypted container.
pub const IV_LEN: usize = 16;

/// Size of a fixed gzip member header.
pub const GZIP_HEADER_LEN: usize = 10;

/// Smallest encrypted container: IV plus one cipher block.
pub const MIN_ENCRYPTED_LEN: usize = IV_LEN + AES_BLOCK_SIZE;

/// IV written in front of every re-encrypted container.
///
/// The game's loader reads the IV back from the container prefix, so it only
/// has to be stable, not random. Can be overridden from the key file.
pub const DEFAULT_IV: [u8; IV_LEN] = [0u8; IV_LEN];

/// Order in which keys are tried, both when resolving a key from ciphertext
/// and when matching a key-name suffix in a JSON file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialOrder {
    /// Order of declaration in the key file.
    #[default]
    Declared,
    /// Last declared key first.
    Reversed,
}

impl std::str::FromStr for TrialOrder {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "declared" | "forward" => Ok(TrialOrder::Declared),
            "reversed" | "reverse" => Ok(TrialOrder::Reversed),
            other => Err(CodecError::KeyConfig(format!(
                "unknown trial_order '{other}' (expected 'declared' or 'reversed')"
            ))),
        }
    }
}

/// Library error type (no panics for expected failures).
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("input too short ({len} bytes, need at least {min})")]
    InputTooShort { len: usize, min: usize },
    #[error("input too large ({len} bytes, limit is {max})")]
    InputTooLarge { len: usize, max: usize },
    #[error("no matching key found for encrypted input")]
    NoMatchingKey,
    #[error("decryption failure: {0}")]
    DecryptionFailed(&'static str),
    #[error("decompression failure: {0}")]
    DecompressionFailed(String),
    #[error("compression failure: {0}")]
    CompressionFailed(String),
    #[error("failed to write output")]
    WriteFailed(#[source] std::io::Error),
    #[error("unknown file extension: {}", .0.display())]
    UnknownFileExtension(PathBuf),
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("key file: {0}")]
    KeyConfig(String),
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

impl CodecError {
    /// `NoMatchingKey` is expected for older, unencrypted-format files and
    /// is the only outcome a caller may reasonably recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::NoMatchingKey)
    }
}
