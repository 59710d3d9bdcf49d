//! AES-CBC primitives backing the `AESV2`/`AESV3` crypt filters (spec.md §4.E).

use aes::cipher::block_padding::{NoPadding, UnpadError};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};
use cbc::{Decryptor, Encryptor};

use crate::encryption::pkcs5::Pkcs5;
use crate::error::{CryptoError, Result};

const BLOCK: usize = 16;

/// Decrypts `data` whose first 16 bytes are the CBC initialization vector
/// (the on-disk convention for stream/string content, spec.md §4.E), with
/// PKCS#7 padding stripped. Dispatches on `key.len()` (16 or 32 bytes).
pub fn decrypt_with_iv_prefix(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < BLOCK {
        return Err(CryptoError::ShortInput.into());
    }
    let (iv, ciphertext) = data.split_at(BLOCK);
    if ciphertext.is_empty() {
        return Ok(Vec::new());
    }
    cbc_decrypt_pkcs7(key, iv, ciphertext)
}

/// Encrypts `data` with a freshly-chosen IV, prefixing it to the ciphertext
/// (used only by tests that need to produce fixtures, never by the read path).
#[cfg(test)]
pub fn encrypt_with_random_iv(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; BLOCK];
    getrandom::fill(&mut iv).map_err(|_| CryptoError::UnsupportedScheme)?;
    let ciphertext = cbc_encrypt_pkcs7(key, &iv, data)?;
    let mut out = Vec::with_capacity(BLOCK + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn cbc_decrypt_pkcs7(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut buf = ciphertext.to_vec();
    let plain: &[u8] = match key.len() {
        16 => Decryptor::<Aes128>::new(key.into(), iv.into())
            .decrypt_padded_mut::<Pkcs5>(&mut buf)
            .map_err(|_: UnpadError| CryptoError::BadPadding)?,
        32 => Decryptor::<Aes256>::new(key.into(), iv.into())
            .decrypt_padded_mut::<Pkcs5>(&mut buf)
            .map_err(|_: UnpadError| CryptoError::BadPadding)?,
        _ => return Err(CryptoError::UnsupportedScheme.into()),
    };
    Ok(plain.to_vec())
}

#[cfg(test)]
fn cbc_encrypt_pkcs7(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let out = match key.len() {
        16 => Encryptor::<Aes128>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs5>(data),
        32 => Encryptor::<Aes256>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs5>(data),
        _ => return Err(CryptoError::UnsupportedScheme.into()),
    };
    Ok(out)
}

/// AES-128-CBC, no padding, used only inside the Algorithm 2.B hash iteration
/// (spec.md §4.E, R6 key derivation). `data` must already be block-aligned.
pub fn cbc128_encrypt_nopad(key: &[u8; 16], iv: &[u8; 16], data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    Encryptor::<Aes128>::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, data.len())
        .expect("input is block-aligned")
        .to_vec()
}

/// AES-256-CBC, no padding, zero IV: unwraps the 32-byte `/UE` or `/OE`
/// intermediate-key wrapper (spec.md §4.E).
pub fn cbc256_decrypt_nopad_zero_iv(key: &[u8; 32], data: &[u8; 32]) -> [u8; 32] {
    let mut buf = *data;
    let out = Decryptor::<Aes256>::new(key.into(), &[0u8; 16].into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .expect("32 bytes is block-aligned, no padding to validate");
    let mut result = [0u8; 32];
    result.copy_from_slice(out);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iv_prefix_round_trips_aes128() {
        let key = [0x11u8; 16];
        let plain = b"a stream that is longer than one AES block of content";
        let encrypted = encrypt_with_random_iv(&key, plain).unwrap();
        assert_eq!(decrypt_with_iv_prefix(&key, &encrypted).unwrap(), plain);
    }

    #[test]
    fn iv_prefix_round_trips_aes256() {
        let key = [0x22u8; 32];
        let plain = b"another fixture string, not block-aligned in length";
        let encrypted = encrypt_with_random_iv(&key, plain).unwrap();
        assert_eq!(decrypt_with_iv_prefix(&key, &encrypted).unwrap(), plain);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let key = [0x33u8; 16];
        let encrypted = encrypt_with_random_iv(&key, b"").unwrap();
        assert_eq!(decrypt_with_iv_prefix(&key, &encrypted).unwrap(), b"");
    }

    #[test]
    fn short_input_is_an_error() {
        assert!(decrypt_with_iv_prefix(&[0u8; 16], &[1, 2, 3]).is_err());
    }

    #[test]
    fn cbc256_nopad_zero_iv_round_trips_with_encrypt_padded() {
        let key = [0x44u8; 32];
        let block = [7u8; 32];
        let ciphertext = cbc256_encrypt_nopad_zero_iv_for_test(&key, &block);
        assert_eq!(cbc256_decrypt_nopad_zero_iv(&key, &ciphertext), block);
    }

    fn cbc256_encrypt_nopad_zero_iv_for_test(key: &[u8; 32], data: &[u8; 32]) -> [u8; 32] {
        let mut buf = *data;
        let out = Encryptor::<Aes256>::new(key.into(), &[0u8; 16].into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, data.len())
            .unwrap();
        let mut result = [0u8; 32];
        result.copy_from_slice(out);
        result
    }
}
