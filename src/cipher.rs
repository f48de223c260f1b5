//! AES-CBC primitives for 128-bit and 256-bit keys.
//!
//! No padding is added or removed here; callers pad with [`pad_for_key`]
//! before encrypting.

use aes::{Aes128, Aes256};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::keys::KeyBytes;
use crate::types::{AES_BLOCK_SIZE, CodecError, IV_LEN};

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Decrypt `ciphertext` with AES-CBC.
///
/// # Errors
///
/// Returns `CodecError::DecryptionFailed` if the ciphertext is not block
/// aligned or the cipher cannot be set up.
pub fn decrypt_cbc(
    key: &KeyBytes,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CodecError> {
    if ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(CodecError::DecryptionFailed(
            "ciphertext length is not a multiple of the AES block size",
        ));
    }

    let mut buf = ciphertext.to_vec();
    let len = match key {
        KeyBytes::Aes128(k) => Aes128CbcDec::new_from_slices(k, iv)
            .map_err(|_| CodecError::DecryptionFailed("invalid key or IV length"))?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(|_| CodecError::DecryptionFailed("AES-128-CBC decrypt failed"))?
            .len(),
        KeyBytes::Aes256(k) => Aes256CbcDec::new_from_slices(k, iv)
            .map_err(|_| CodecError::DecryptionFailed("invalid key or IV length"))?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(|_| CodecError::DecryptionFailed("AES-256-CBC decrypt failed"))?
            .len(),
    };
    buf.truncate(len);
    Ok(buf)
}

/// Encrypt block-aligned `plaintext` with AES-CBC.
///
/// # Errors
///
/// * `CodecError::Invalid` if `plaintext` is not a multiple of 16 bytes.
/// * `CodecError::DecryptionFailed` if the cipher cannot be set up (the
///   provider failure kind is shared by both directions).
pub fn encrypt_cbc(
    key: &KeyBytes,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, CodecError> {
    if plaintext.len() % AES_BLOCK_SIZE != 0 {
        return Err(CodecError::Invalid("plaintext must be padded to the AES block size"));
    }

    let msg_len = plaintext.len();
    let mut buf = plaintext.to_vec();
    let len = match key {
        KeyBytes::Aes128(k) => Aes128CbcEnc::new_from_slices(k, iv)
            .map_err(|_| CodecError::DecryptionFailed("invalid key or IV length"))?
            .encrypt_padded_mut::<NoPadding>(&mut buf, msg_len)
            .map_err(|_| CodecError::DecryptionFailed("AES-128-CBC encrypt failed"))?
            .len(),
        KeyBytes::Aes256(k) => Aes256CbcEnc::new_from_slices(k, iv)
            .map_err(|_| CodecError::DecryptionFailed("invalid key or IV length"))?
            .encrypt_padded_mut::<NoPadding>(&mut buf, msg_len)
            .map_err(|_| CodecError::DecryptionFailed("AES-256-CBC encrypt failed"))?
            .len(),
    };
    buf.truncate(len);
    Ok(buf)
}

/// Pad `data` in place for encryption under `key`.
///
/// 256-bit keys get classic PKCS7 (1..=16 bytes, each equal to the pad
/// length). 128-bit keys are zero-filled up to the next block boundary only.
pub fn pad_for_key(data: &mut Vec<u8>, key: &KeyBytes) {
    if key.is_aes256() {
        let pad = AES_BLOCK_SIZE - data.len() % AES_BLOCK_SIZE;
        data.resize(data.len() + pad, pad as u8);
    } else {
        let aligned = data.len().div_ceil(AES_BLOCK_SIZE) * AES_BLOCK_SIZE;
        data.resize(aligned, 0);
    }
}

/// Strip a PKCS7 pad, returning `None` if the trailing bytes are not one.
pub fn strip_pkcs7(data: &[u8]) -> Option<&[u8]> {
    let pad = *data.last()? as usize;
    if pad == 0 || pad > AES_BLOCK_SIZE || pad > data.len() {
        return None;
    }
    let (body, tail) = data.split_at(data.len() - pad);
    tail.iter().all(|&b| b as usize == pad).then_some(body)
}
