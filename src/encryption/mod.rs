//! PDF Standard Security Handler (spec.md §4.E).
//!
//! Authentication happens once, on `Document::open`/`open_with_password`,
//! producing an `EncryptionState` that every later stream/string decode goes
//! through. Only decryption is implemented — this crate does not write
//! encrypted output (spec.md Non-goals).

mod aes;
mod key;
mod pkcs5;
mod rc4;

use crate::error::{CryptoError, Error, Result};
use crate::object::{Dictionary, Object, ObjectId};

/// The cipher actually applied to a stream or string's bytes, resolved from
/// `/V`, `/CF`, `/StmF`, `/StrF` (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    Rc4,
    Aes128,
    Aes256,
    Identity,
}

/// Authenticated encryption context for one document. Holds the derived file
/// encryption key and which cipher applies to streams vs. strings (they may
/// differ under a `V4` crypt-filter dictionary, though in practice almost
/// every producer sets both the same).
#[derive(Debug, Clone)]
pub struct EncryptionState {
    file_key: Vec<u8>,
    stream_method: CryptMethod,
    string_method: CryptMethod,
    encrypt_metadata: bool,
}

fn cfm_from_name(name: &[u8]) -> CryptMethod {
    match name {
        b"V2" => CryptMethod::Rc4,
        b"AESV2" => CryptMethod::Aes128,
        b"AESV3" => CryptMethod::Aes256,
        _ => CryptMethod::Identity,
    }
}

fn crypt_filter_method(encrypt_dict: &Dictionary, filter_key: &[u8]) -> CryptMethod {
    let name = encrypt_dict.get(filter_key).and_then(Object::as_name_bytes).unwrap_or(b"Identity");
    if name == b"Identity" {
        return CryptMethod::Identity;
    }
    let Ok(cf) = encrypt_dict.get(b"CF").and_then(Object::as_dict) else {
        return CryptMethod::Identity;
    };
    let Ok(filter_dict) = cf.get(name).and_then(Object::as_dict) else {
        return CryptMethod::Identity;
    };
    let cfm = filter_dict.get(b"CFM").and_then(Object::as_name_bytes).unwrap_or(b"Identity");
    cfm_from_name(cfm)
}

fn bytes_of(dict: &Dictionary, key: &[u8]) -> Result<Vec<u8>> {
    dict.get(key).and_then(Object::as_str).map(<[u8]>::to_vec).map_err(|_| Error::Decryption(CryptoError::ShortInput))
}

impl EncryptionState {
    /// Authenticates `password` (the empty string is the common case: no
    /// owner or user password was actually set) against `/Encrypt`, returning
    /// an `EncryptionState` ready to decrypt the rest of the document, or
    /// `Error::InvalidPassword` if neither the user nor the owner check
    /// passes.
    pub fn authenticate(encrypt_dict: &Dictionary, id0: &[u8], password: &str) -> Result<EncryptionState> {
        let v = encrypt_dict.get(b"V").and_then(Object::as_i64).unwrap_or(0);
        let r = encrypt_dict.get(b"R").and_then(Object::as_i64).unwrap_or(2) as u8;
        let p = encrypt_dict.get(b"P").and_then(Object::as_i64).unwrap_or(0) as i32;
        let length_bits = encrypt_dict.get(b"Length").and_then(Object::as_i64).unwrap_or(40);
        let encrypt_metadata = encrypt_dict.get(b"EncryptMetadata").and_then(Object::as_bool).unwrap_or(true);
        let o = bytes_of(encrypt_dict, b"O")?;
        let u = bytes_of(encrypt_dict, b"U")?;

        if v >= 5 {
            let oe = bytes_of(encrypt_dict, b"OE")?;
            let ue = bytes_of(encrypt_dict, b"UE")?;
            let password_bytes = key::normalize_password_r6(password);
            let file_key = key::authenticate_r5_r6(&password_bytes, &u, &ue, &o, &oe).ok_or(Error::InvalidPassword)?;
            return Ok(EncryptionState {
                file_key: file_key.to_vec(),
                stream_method: CryptMethod::Aes256,
                string_method: CryptMethod::Aes256,
                encrypt_metadata,
            });
        }

        let key_len_bytes = if v == 1 { 5 } else { (length_bits / 8).clamp(5, 16) as usize };
        let password_bytes = password.as_bytes();
        let file_key = key::authenticate_user_password(password_bytes, &o, &u, p, id0, r, key_len_bytes, encrypt_metadata)
            .or_else(|| key::authenticate_owner_password(password_bytes, &o, &u, p, id0, r, key_len_bytes, encrypt_metadata))
            .ok_or(Error::InvalidPassword)?;

        let (stream_method, string_method) = if v == 4 {
            (crypt_filter_method(encrypt_dict, b"StmF"), crypt_filter_method(encrypt_dict, b"StrF"))
        } else {
            (CryptMethod::Rc4, CryptMethod::Rc4)
        };

        Ok(EncryptionState { file_key, stream_method, string_method, encrypt_metadata })
    }

    pub fn encrypt_metadata(&self) -> bool {
        self.encrypt_metadata
    }

    /// Algorithm 1: per-object key for RC4/AES-128 (AES-256 uses the file key
    /// directly — spec.md §4.E).
    fn object_key(&self, id: ObjectId, is_aes: bool) -> Vec<u8> {
        use md5::{Digest, Md5};
        let mut md5 = Md5::new();
        md5.update(&self.file_key);
        md5.update(&id.0.to_le_bytes()[0..3]);
        md5.update(id.1.to_le_bytes());
        if is_aes {
            md5.update(b"sAlT");
        }
        let hash = md5.finalize();
        let len = (self.file_key.len() + 5).min(16);
        hash[..len].to_vec()
    }

    fn decrypt(&self, id: ObjectId, data: &[u8], method: CryptMethod) -> Result<Vec<u8>> {
        match method {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::Rc4 => Ok(rc4::crypt(&self.object_key(id, false), data)),
            CryptMethod::Aes128 => aes::decrypt_with_iv_prefix(&self.object_key(id, true), data),
            CryptMethod::Aes256 => aes::decrypt_with_iv_prefix(&self.file_key, data),
        }
    }

    pub fn decrypt_stream(&self, id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(id, data, self.stream_method)
    }

    pub fn decrypt_string(&self, id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
        self.decrypt(id, data, self.string_method)
    }

    /// Decrypts every `String` nested inside `obj` in place (spec.md §4.E).
    /// Stream content is left alone: it is decrypted lazily, at stream-decode
    /// time, once the caller knows whether `/Metadata` skip rule applies.
    pub fn decrypt_strings(&self, id: ObjectId, obj: &mut Object) -> Result<()> {
        match obj {
            Object::String(bytes, _) => {
                *bytes = self.decrypt_string(id, bytes)?;
                Ok(())
            }
            Object::Array(items) => {
                for item in items {
                    self.decrypt_strings(id, item)?;
                }
                Ok(())
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.iter_mut() {
                    self.decrypt_strings(id, value)?;
                }
                Ok(())
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    self.decrypt_strings(id, value)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::StringFormat;

    const ID0: &[u8] = b"0123456789ABCDEF";
    const PADDING: [u8; 32] = [
        0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E,
        0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
    ];

    /// Reproduces Algorithm 2 (key derivation) and Algorithm 5 (`U`, revision
    /// >= 3) independently of `key.rs`'s private helpers, so the test fixture
    /// acts as a second implementation rather than asserting against itself.
    fn derive_key(o: &[u8; 32], permissions: i32, id0: &[u8]) -> Vec<u8> {
        use md5::{Digest, Md5};
        let mut md5 = Md5::new();
        md5.update(PADDING);
        md5.update(o);
        md5.update(permissions.to_le_bytes());
        md5.update(id0);
        let mut hash = md5.finalize().to_vec();
        for _ in 0..50 {
            let mut m = Md5::new();
            m.update(&hash[..16]);
            hash = m.finalize().to_vec();
        }
        hash.truncate(16);
        hash
    }

    fn compute_u(key: &[u8], id0: &[u8]) -> Vec<u8> {
        use md5::{Digest, Md5};
        let mut md5 = Md5::new();
        md5.update(PADDING);
        md5.update(id0);
        let mut data = md5.finalize().to_vec();
        for round in 0..20u8 {
            let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
            data = super::rc4::crypt(&round_key, &data);
        }
        data
    }

    /// A `V2/R3` RC4-128 `/Encrypt` dictionary with a zeroed `/O` (an empty
    /// owner password) and a `/U` matching the empty user password.
    fn legacy_rc4_encrypt_dict(permissions: i32) -> Dictionary {
        let o = [0u8; 32];
        let key = derive_key(&o, permissions, ID0);
        let u = compute_u(&key, ID0);

        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"Standard".to_vec()));
        dict.set("V", Object::Integer(2));
        dict.set("R", Object::Integer(3));
        dict.set("Length", Object::Integer(128));
        dict.set("P", Object::Integer(permissions as i64));
        dict.set("O", Object::String(o.to_vec(), StringFormat::Literal));
        dict.set("U", Object::String(u, StringFormat::Literal));
        dict
    }

    #[test]
    fn authenticate_accepts_empty_user_password_rc4() {
        let dict = legacy_rc4_encrypt_dict(-4);
        let state = EncryptionState::authenticate(&dict, ID0, "").unwrap();
        assert_eq!(state.stream_method, CryptMethod::Rc4);
        assert_eq!(state.string_method, CryptMethod::Rc4);
    }

    #[test]
    fn authenticate_rejects_wrong_password() {
        let dict = legacy_rc4_encrypt_dict(-4);
        let result = EncryptionState::authenticate(&dict, ID0, "wrong password");
        assert!(matches!(result, Err(Error::InvalidPassword)));
    }

    #[test]
    fn object_key_differs_per_object_id() {
        let state = EncryptionState {
            file_key: vec![1, 2, 3, 4, 5],
            stream_method: CryptMethod::Rc4,
            string_method: CryptMethod::Rc4,
            encrypt_metadata: true,
        };
        assert_ne!(state.object_key((1, 0), false), state.object_key((2, 0), false));
        assert_ne!(state.object_key((1, 0), false), state.object_key((1, 1), false));
    }

    #[test]
    fn stream_decrypt_round_trips_aes128() {
        let state = EncryptionState {
            file_key: vec![9u8; 5],
            stream_method: CryptMethod::Aes128,
            string_method: CryptMethod::Aes128,
            encrypt_metadata: true,
        };
        let id = (3, 0);
        let plaintext = b"PDF stream payload, long enough to span blocks comfortably";
        let object_key = state.object_key(id, true);
        let encrypted = super::aes::encrypt_with_random_iv(&object_key, plaintext).unwrap();
        assert_eq!(state.decrypt_stream(id, &encrypted).unwrap(), plaintext);
    }

    #[test]
    fn metadata_stream_is_exempt_when_encrypt_metadata_false() {
        let state = EncryptionState {
            file_key: vec![9u8; 5],
            stream_method: CryptMethod::Rc4,
            string_method: CryptMethod::Rc4,
            encrypt_metadata: false,
        };
        assert!(!state.encrypt_metadata());
    }
}
