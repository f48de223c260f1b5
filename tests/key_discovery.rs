//! Key discovery against stores full of decoys.

use datatable_codec::{
    CodecError, DEFAULT_IV, IV_LEN, KeyStore, NamedKey, TrialOrder, decode_bytes, encode_bytes,
    resolve_key,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const JSON: &[u8] = br#"{"items":[{"uniqueId":1,"id":"lv1a","songFileName":"SONG_LV1A"}]}"#;

fn decoys(rng: &mut StdRng, n: usize) -> Vec<NamedKey> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                let mut k = [0u8; 16];
                rng.fill(&mut k);
                NamedKey::aes128(format!("decoy{i}"), k)
            } else {
                let mut k = [0u8; 32];
                rng.fill(&mut k);
                NamedKey::aes256(format!("decoy{i}"), k)
            }
        })
        .collect()
}

#[test]
fn real_key_found_regardless_of_decoy_count() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let real = NamedKey::aes256("jp_ver169", [0xC3; 32]);
    let bin = encode_bytes(JSON, Some(&real), &DEFAULT_IV).unwrap();

    for n in [0usize, 1, 5, 40] {
        let mut keys = decoys(&mut rng, n);
        let pos = rng.random_range(0..=keys.len());
        keys.insert(pos, real.clone());
        let store = KeyStore::from_keys(keys, TrialOrder::Declared).unwrap();

        let iv: &[u8; IV_LEN] = bin[..IV_LEN].try_into().unwrap();
        let found = resolve_key(&store, &bin[IV_LEN..], iv).unwrap();
        assert_eq!(found.name(), "jp_ver169", "decoys={n}");
        assert_eq!(decode_bytes(&bin, &store).unwrap().json, JSON);
    }
}

#[test]
fn no_match_when_real_key_absent() {
    let mut rng = StdRng::seed_from_u64(42);
    let real = NamedKey::aes128("real", [0x10; 16]);
    let bin = encode_bytes(JSON, Some(&real), &DEFAULT_IV).unwrap();

    let store = KeyStore::from_keys(decoys(&mut rng, 32), TrialOrder::Reversed).unwrap();
    let err = decode_bytes(&bin, &store).unwrap_err();
    assert!(matches!(err, CodecError::NoMatchingKey));
}

#[test]
fn identical_keys_resolve_to_first_in_trial_order() {
    let bytes = [0x5A; 16];
    let keys = vec![
        NamedKey::aes128("older", bytes),
        NamedKey::aes128("x", [1; 16]),
        NamedKey::aes128("newer", bytes),
    ];
    let bin = encode_bytes(JSON, Some(&keys[0]), &DEFAULT_IV).unwrap();

    let fwd = KeyStore::from_keys(keys.clone(), TrialOrder::Declared).unwrap();
    assert_eq!(decode_bytes(&bin, &fwd).unwrap().key.unwrap().name(), "older");

    let rev = KeyStore::from_keys(keys, TrialOrder::Reversed).unwrap();
    assert_eq!(decode_bytes(&bin, &rev).unwrap().key.unwrap().name(), "newer");
}

#[test]
fn plain_gzip_never_consults_keys() {
    // An empty store would fail any decryption attempt.
    let bin = encode_bytes(JSON, None, &DEFAULT_IV).unwrap();
    let empty = KeyStore::default();
    let decoded = decode_bytes(&bin, &empty).unwrap();
    assert_eq!(decoded.json, JSON);
    assert!(decoded.key.is_none());
}
