//! Mapping between `<stem>.bin` and `<stem> <key name>.json`.
//!
//! The key name in the JSON file name is how the key for re-encryption is
//! recovered. Suffix matching follows the store's trial order, so when one
//! key name is a suffix of another the first one tried wins; list the longer
//! name first if that matters.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::keys::{KeyStore, NamedKey};

/// Case-insensitive check of a path's extension (`ext` without the dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// JSON output path for a decoded container.
///
/// `datatable/musicinfo.bin` with key `jp_ver169` becomes
/// `datatable/musicinfo jp_ver169.json`; without a key (or with an empty
/// key name) it becomes `datatable/musicinfo.json`.
pub fn json_path_for(bin_path: &Path, key: Option<&NamedKey>) -> PathBuf {
    let mut name = bin_path.file_stem().unwrap_or_default().to_os_string();
    if let Some(key) = key.filter(|k| !k.name().is_empty()) {
        name.push(" ");
        name.push(key.name());
    }
    name.push(".json");
    bin_path.with_file_name(name)
}

/// Recover the container path and the key to encrypt with from a JSON path.
///
/// The first key (in trial order) whose name is a case-insensitive suffix of
/// the file stem is chosen; the suffix and any whitespace before it are
/// removed. Without a match, or when a key name makes up the whole stem, the
/// stem is kept and no key is returned, meaning the container is written
/// unencrypted.
pub fn bin_path_and_key<'a>(
    json_path: &Path,
    store: &'a KeyStore,
) -> (PathBuf, Option<&'a NamedKey>) {
    let Some(stem) = json_path.file_stem().and_then(OsStr::to_str) else {
        return (json_path.with_extension("bin"), None);
    };

    // `jp_ver169.json` is a bare key name, not a keyed datatable, even when a
    // shorter key such as `ver169` is tried first.
    if store.get(stem.trim()).is_some() {
        return (json_path.with_file_name(format!("{stem}.bin")), None);
    }

    for key in store.iter() {
        let Some(rest) = strip_suffix_ignore_ascii_case(stem, key.name()) else {
            continue;
        };
        let rest = rest.trim_end();
        if rest.is_empty() {
            return (json_path.with_file_name(format!("{stem}.bin")), None);
        }
        return (json_path.with_file_name(format!("{rest}.bin")), Some(key));
    }

    (json_path.with_file_name(format!("{stem}.bin")), None)
}

fn strip_suffix_ignore_ascii_case<'s>(s: &'s str, suffix: &str) -> Option<&'s str> {
    if suffix.is_empty() || s.len() < suffix.len() {
        return None;
    }
    let split = s.len() - suffix.len();
    if !s.is_char_boundary(split) {
        return None;
    }
    s[split..].eq_ignore_ascii_case(suffix).then(|| &s[..split])
}
