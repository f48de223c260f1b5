//! Key file loading.
//!
//! The key file is INI-style:
//!
//! ```ini
//! ; comments start with ';' or '#'
//! [Settings]
//! trial_order = declared
//! iv = 00000000000000000000000000000000
//!
//! [DataTableKeys]
//! jp_ver169 = 00112233445566778899AABBCCDDEEFF
//! cn_ver2   = 00112233445566778899AABBCCDDEEFF00112233445566778899AABBCCDDEEFF
//! ```
//!
//! Keys are kept in declaration order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::keys::{KeyBytes, KeyStore, NamedKey};
use crate::types::{CodecError, DEFAULT_IV, IV_LEN, TrialOrder};

/// File name looked up next to the executable when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "datatable_keys.ini";

/// Section holding `name = hex` key entries.
pub const KEYS_SECTION: &str = "DataTableKeys";

/// Section holding tool settings.
pub const SETTINGS_SECTION: &str = "Settings";

/// Everything read from a key file.
#[derive(Debug, Clone)]
pub struct KeyConfig {
    pub store: KeyStore,
    /// IV prepended to re-encrypted containers.
    pub iv: [u8; IV_LEN],
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            store: KeyStore::default(),
            iv: DEFAULT_IV,
        }
    }
}

/// `datatable_keys.ini` in the directory of the running executable.
pub fn default_config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(DEFAULT_CONFIG_FILE))
}

/// Load a key file. A missing file yields an empty configuration, which
/// still allows converting unencrypted datatables.
///
/// # Errors
///
/// `CodecError::Io` if the file exists but cannot be read, and
/// `CodecError::KeyConfig` for malformed entries.
pub fn load_key_config(path: &Path) -> Result<KeyConfig, CodecError> {
    if !path.exists() {
        warn!(path = %path.display(), "key file not found; only unencrypted files can be converted");
        return Ok(KeyConfig::default());
    }
    let text = Zeroizing::new(fs::read_to_string(path)?);
    let cfg = parse_key_config(&text)?;
    debug!(path = %path.display(), keys = cfg.store.len(), order = ?cfg.store.order(), "loaded key file");
    Ok(cfg)
}

/// Parse key file text.
pub fn parse_key_config(text: &str) -> Result<KeyConfig, CodecError> {
    let mut keys = Vec::new();
    let mut order = TrialOrder::default();
    let mut iv = DEFAULT_IV;

    for_each_entry(text, |section, name, value| {
        if section.eq_ignore_ascii_case(KEYS_SECTION) {
            keys.push(NamedKey::new(name, parse_key_hex(name, value)?));
        } else if section.eq_ignore_ascii_case(SETTINGS_SECTION) {
            match name.to_ascii_lowercase().as_str() {
                "trial_order" => order = value.parse()?,
                "iv" => iv = parse_iv_hex(value)?,
                other => warn!(setting = other, "ignoring unknown setting"),
            }
        } else {
            debug!(section, name, "ignoring entry outside known sections");
        }
        Ok(())
    })?;

    Ok(KeyConfig {
        store: KeyStore::from_keys(keys, order)?,
        iv,
    })
}

/// Decode a hex key. Whitespace between digits is allowed.
///
/// 16 bytes give an AES-128 key. 32 bytes give an AES-256 key, unless the
/// upper 16 bytes are all zero, in which case the lower half is an AES-128
/// key written in a 32-byte slot.
pub fn parse_key_hex(name: &str, value: &str) -> Result<KeyBytes, CodecError> {
    let raw = decode_hex(value)
        .map_err(|e| CodecError::KeyConfig(format!("key '{name}': invalid hex ({e})")))?;

    match raw.len() {
        16 => {
            let mut k = [0u8; 16];
            k.copy_from_slice(&raw);
            Ok(KeyBytes::Aes128(k))
        }
        32 if raw[16..].iter().all(|&b| b == 0) => {
            let mut k = [0u8; 16];
            k.copy_from_slice(&raw[..16]);
            Ok(KeyBytes::Aes128(k))
        }
        32 => {
            let mut k = [0u8; 32];
            k.copy_from_slice(&raw);
            Ok(KeyBytes::Aes256(k))
        }
        n => Err(CodecError::KeyConfig(format!(
            "key '{name}': expected 16 or 32 bytes, got {n}"
        ))),
    }
}

fn parse_iv_hex(value: &str) -> Result<[u8; IV_LEN], CodecError> {
    let raw = decode_hex(value)
        .map_err(|e| CodecError::KeyConfig(format!("iv: invalid hex ({e})")))?;
    <[u8; IV_LEN]>::try_from(raw.as_slice()).map_err(|_| {
        CodecError::KeyConfig(format!("iv: expected {IV_LEN} bytes, got {}", raw.len()))
    })
}

fn decode_hex(value: &str) -> Result<Zeroizing<Vec<u8>>, hex::FromHexError> {
    let digits: Zeroizing<String> =
        Zeroizing::new(value.chars().filter(|c| !c.is_whitespace()).collect());
    hex::decode(digits.as_str()).map(Zeroizing::new)
}

/// Walk `key = value` entries with the section they belong to.
fn for_each_entry<F>(text: &str, mut f: F) -> Result<(), CodecError>
where
    F: FnMut(&str, &str, &str) -> Result<(), CodecError>,
{
    let mut section = "";
    for line in text.trim_start_matches('\u{feff}').lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        f(section, key, value.trim())?;
    }
    Ok(())
}
