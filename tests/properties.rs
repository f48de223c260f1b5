//! Property tests for round-trips and file name binding.

use std::path::{Path, PathBuf};

use datatable_codec::{
    AES_BLOCK_SIZE, DEFAULT_IV, IV_LEN, KeyStore, NamedKey, TrialOrder, bin_path_and_key,
    compress, decode_bytes, decrypt_cbc, encode_bytes, json_path_for, strip_pkcs7,
};
use proptest::prelude::*;

fn store() -> KeyStore {
    KeyStore::from_keys(
        [
            NamedKey::aes128("jp_ver169", [0x11; 16]),
            NamedKey::aes256("cn_ver2", [0x22; 32]),
        ],
        TrialOrder::Declared,
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn decode_inverts_encode(text in "[ -~]{0,2048}", which in 0usize..3) {
        let store = store();
        let key = match which {
            0 => None,
            1 => store.get("jp_ver169"),
            _ => store.get("cn_ver2"),
        };
        let bin = encode_bytes(text.as_bytes(), key, &DEFAULT_IV).unwrap();
        let decoded = decode_bytes(&bin, &store).unwrap();
        prop_assert_eq!(decoded.json, text.as_bytes());
        prop_assert_eq!(decoded.key.map(|k| k.name()), key.map(|k| k.name()));
    }

    #[test]
    fn aes256_container_is_block_aligned_and_pkcs7(text in "[ -~]{0,1024}") {
        let store = store();
        let key = store.get("cn_ver2").unwrap();
        let bin = encode_bytes(text.as_bytes(), Some(key), &DEFAULT_IV).unwrap();
        prop_assert_eq!(bin.len() % AES_BLOCK_SIZE, 0);

        let plain = decrypt_cbc(key.bytes(), &DEFAULT_IV, &bin[IV_LEN..]).unwrap();
        let gz_len = compress(text.as_bytes()).unwrap().len();
        prop_assert_eq!(strip_pkcs7(&plain).map(<[u8]>::len), Some(gz_len));
    }

    #[test]
    fn file_names_round_trip(stem in "[a-z_]{0,14}[a-z]", which in 0usize..3) {
        let store = store();
        let key = match which {
            0 => None,
            1 => store.get("jp_ver169"),
            _ => store.get("cn_ver2"),
        };
        let bin = PathBuf::from(format!("datatable/{stem}.bin"));
        let json = json_path_for(&bin, key);
        let (back, found) = bin_path_and_key(Path::new(&json), &store);
        prop_assert_eq!(back, bin);
        prop_assert_eq!(found.map(|k| k.name()), key.map(|k| k.name()));
    }
}
