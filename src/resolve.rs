//! Key discovery by trial decryption.
//!
//! Each candidate decrypts only the first cipher block, and the result is
//! checked for the gzip magic and method bytes. Three fixed bytes make a
//! false positive across a few dozen keys very unlikely. This is a linear
//! scan, not meant for large or adversarial key sets.

use tracing::{debug, info, warn};

use crate::cipher::decrypt_cbc;
use crate::gzip::has_gzip_signature;
use crate::keys::{KeyStore, NamedKey};
use crate::types::{AES_BLOCK_SIZE, IV_LEN};

/// Find the key `ciphertext` (IV already split off) was encrypted with.
///
/// Keys are tried in the store's trial order and the first one whose
/// decrypted first block carries a gzip signature wins, even if a later key
/// would match too. A key whose decryption reports an error is treated as
/// a non-match and the scan continues.
///
/// Returns `None` for an empty store, a ciphertext shorter than one block,
/// or when no key matches.
pub fn resolve_key<'a>(
    store: &'a KeyStore,
    ciphertext: &[u8],
    iv: &[u8; IV_LEN],
) -> Option<&'a NamedKey> {
    let first_block = ciphertext.get(..AES_BLOCK_SIZE)?;

    for key in store.iter() {
        let block = match decrypt_cbc(key.bytes(), iv, first_block) {
            Ok(block) => block,
            Err(e) => {
                warn!(key = key.name(), error = %e, "trial decryption failed; skipping key");
                continue;
            }
        };
        if has_gzip_signature(&block) {
            info!(key = key.name(), bits = key.bytes().bits(), "resolved datatable key");
            return Some(key);
        }
        debug!(key = key.name(), "key did not match");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{encrypt_cbc, pad_for_key};
    use crate::compression::compress;
    use crate::types::TrialOrder;

    const IV: [u8; 16] = *b"0123456789abcdef";

    fn encrypted_with(key: &NamedKey) -> Vec<u8> {
        let mut gz = compress(br#"{"k":"v"}"#).unwrap();
        pad_for_key(&mut gz, key.bytes());
        encrypt_cbc(key.bytes(), &IV, &gz).unwrap()
    }

    #[test]
    fn finds_the_right_key_among_decoys() {
        let real = NamedKey::aes256("real", [0x77; 32]);
        let store = KeyStore::from_keys(
            [
                NamedKey::aes128("decoy1", [1; 16]),
                NamedKey::aes256("decoy2", [2; 32]),
                real.clone(),
                NamedKey::aes128("decoy3", [3; 16]),
            ],
            TrialOrder::Declared,
        )
        .unwrap();
        let ct = encrypted_with(&real);
        assert_eq!(resolve_key(&store, &ct, &IV).map(|k| k.name()), Some("real"));
    }

    #[test]
    fn none_when_key_absent_or_store_empty() {
        let real = NamedKey::aes128("real", [0x77; 16]);
        let ct = encrypted_with(&real);

        let decoys = KeyStore::from_keys(
            [NamedKey::aes128("a", [1; 16]), NamedKey::aes128("b", [2; 16])],
            TrialOrder::Declared,
        )
        .unwrap();
        assert!(resolve_key(&decoys, &ct, &IV).is_none());
        assert!(resolve_key(&KeyStore::default(), &ct, &IV).is_none());
    }

    #[test]
    fn first_match_wins_in_trial_order() {
        let bytes = [0x33; 16];
        let keys = [NamedKey::aes128("first", bytes), NamedKey::aes128("second", bytes)];
        let ct = encrypted_with(&keys[0]);

        let fwd = KeyStore::from_keys(keys.clone(), TrialOrder::Declared).unwrap();
        assert_eq!(resolve_key(&fwd, &ct, &IV).unwrap().name(), "first");

        let rev = KeyStore::from_keys(keys, TrialOrder::Reversed).unwrap();
        assert_eq!(resolve_key(&rev, &ct, &IV).unwrap().name(), "second");
    }

    #[test]
    fn short_ciphertext_is_no_match() {
        let store =
            KeyStore::from_keys([NamedKey::aes128("a", [1; 16])], TrialOrder::Declared).unwrap();
        assert!(resolve_key(&store, &[0u8; 15], &IV).is_none());
    }

    #[test]
    fn wrong_iv_is_no_match() {
        let real = NamedKey::aes128("real", [0x77; 16]);
        let store = KeyStore::from_keys([real.clone()], TrialOrder::Declared).unwrap();
        let ct = encrypted_with(&real);
        assert!(resolve_key(&store, &ct, &[0xEE; 16]).is_none());
    }
}
