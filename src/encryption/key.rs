//! PDF Standard Security Handler key derivation (spec.md §4.E).
//!
//! `compute_file_key_legacy` implements Algorithm 2 (key derivation) plus
//! Algorithms 4/5/6/7 (U/O authentication) for `V` 1/2/4, revisions 2-4.
//! `compute_file_key_r6` implements the SHA-256/384/512 hash iteration
//! (Algorithm 2.B) and its user/owner authentication (Algorithm 2.A/11/12)
//! introduced for `V5`/`R6`.

use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};

use crate::encryption::{aes, rc4};

/// Algorithm 2 step (a): the fixed 32-byte padding string.
const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let take = password.len().min(32);
    out[..take].copy_from_slice(&password[..take]);
    out[take..].copy_from_slice(&PADDING[..32 - take]);
    out
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Algorithm 2: derives the RC4/AES-128 file encryption key from the user
/// password, `/O`, `/P`, the first element of `/ID`, and (revision >= 4) the
/// `/EncryptMetadata` flag.
fn compute_encryption_key(
    password: &[u8], o: &[u8], permissions: i32, id0: &[u8], revision: u8, key_len_bytes: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let padded = pad_password(password);
    let mut md5 = Md5::new();
    md5.update(padded);
    md5.update(&o[..32.min(o.len())]);
    md5.update(permissions.to_le_bytes());
    md5.update(id0);
    if revision >= 4 && !encrypt_metadata {
        md5.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash = md5.finalize().to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            let mut m = Md5::new();
            m.update(&hash[..key_len_bytes.min(hash.len())]);
            hash = m.finalize().to_vec();
        }
    }
    hash.truncate(key_len_bytes);
    hash
}

/// Algorithm 4 (revision 2): `U = RC4(key, PADDING)`.
fn compute_u_r2(key: &[u8]) -> Vec<u8> {
    rc4::crypt(key, &PADDING)
}

/// Algorithm 5 (revision >= 3): 20 rounds of RC4 over `MD5(PADDING ++ id0)`,
/// each round's key XORed with the round index. Only the first 16 of the
/// resulting 32 stored bytes are meaningful for comparison.
fn compute_u_r3(key: &[u8], id0: &[u8]) -> Vec<u8> {
    let mut md5 = Md5::new();
    md5.update(PADDING);
    md5.update(id0);
    let mut data = md5.finalize().to_vec();
    for round in 0..20u8 {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        data = rc4::crypt(&round_key, &data);
    }
    data
}

/// Algorithm 6: authenticates a candidate user password against `/U`,
/// returning the file encryption key on success.
#[allow(clippy::too_many_arguments)]
pub fn authenticate_user_password(
    password: &[u8], o: &[u8], u: &[u8], permissions: i32, id0: &[u8], revision: u8, key_len_bytes: usize,
    encrypt_metadata: bool,
) -> Option<Vec<u8>> {
    let key = compute_encryption_key(password, o, permissions, id0, revision, key_len_bytes, encrypt_metadata);
    let matches = if revision == 2 {
        constant_time_eq(&compute_u_r2(&key), &u[..u.len().min(32)])
    } else {
        let computed = compute_u_r3(&key, id0);
        constant_time_eq(&computed[..16], &u[..16.min(u.len())])
    };
    matches.then_some(key)
}

/// Algorithm 7: authenticates a candidate owner password by recovering the
/// padded user password from `/O` and delegating to Algorithm 6.
#[allow(clippy::too_many_arguments)]
pub fn authenticate_owner_password(
    password: &[u8], o: &[u8], u: &[u8], permissions: i32, id0: &[u8], revision: u8, key_len_bytes: usize,
    encrypt_metadata: bool,
) -> Option<Vec<u8>> {
    let padded_owner = pad_password(password);
    let rc4_key = {
        let mut hash = {
            let mut md5 = Md5::new();
            md5.update(padded_owner);
            md5.finalize().to_vec()
        };
        if revision >= 3 {
            for _ in 0..50 {
                let mut m = Md5::new();
                m.update(&hash[..key_len_bytes.min(hash.len())]);
                hash = m.finalize().to_vec();
            }
        }
        hash.truncate(key_len_bytes);
        hash
    };

    let mut recovered = o[..32.min(o.len())].to_vec();
    if revision == 2 {
        recovered = rc4::crypt(&rc4_key, &recovered);
    } else {
        for round in (0..20u8).rev() {
            let round_key: Vec<u8> = rc4_key.iter().map(|b| b ^ round).collect();
            recovered = rc4::crypt(&round_key, &recovered);
        }
    }
    authenticate_user_password(&recovered, o, u, permissions, id0, revision, key_len_bytes, encrypt_metadata)
}

/// UTF-8 password normalization for `V5`/`R6` (PDF 2.0 §7.6.4.3.4): SASLprep,
/// then truncate to 127 bytes. Passwords that fail SASLprep profiling (stray
/// prohibited codepoints) fall back to their raw UTF-8 bytes rather than
/// rejecting the open outright — permissive readers do the same.
pub fn normalize_password_r6(password: &str) -> Vec<u8> {
    let normalized = stringprep::saslprep(password).map(|c| c.into_owned()).unwrap_or_else(|_| password.to_string());
    let mut bytes = normalized.into_bytes();
    bytes.truncate(127);
    bytes
}

/// Algorithm 2.B: the SHA-256/384/512 hash iteration used by `R6` (and, as a
/// single round with no iteration, by `R5`).
fn hash_2b(password: &[u8], salt: &[u8], udata: &[u8]) -> [u8; 32] {
    let mut input = Vec::with_capacity(password.len() + salt.len() + udata.len());
    input.extend_from_slice(password);
    input.extend_from_slice(salt);
    input.extend_from_slice(udata);

    let mut k: Vec<u8> = Sha256::digest(&input).to_vec();
    let mut round: u32 = 0;
    loop {
        let mut k1 = Vec::with_capacity(64 * (password.len() + k.len() + udata.len()));
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(udata);
        }
        let key16: [u8; 16] = k[0..16].try_into().expect("k is always >= 32 bytes");
        let iv16: [u8; 16] = k[16..32].try_into().expect("k is always >= 32 bytes");
        let e = aes::cbc128_encrypt_nopad(&key16, &iv16, &k1);

        let modulus: u32 = e[0..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
        k = match modulus {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };
        round += 1;
        if round >= 64 {
            let last = *e.last().expect("e is never empty") as u32;
            if last <= round - 32 {
                break;
            }
        }
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&k[..32]);
    out
}

/// Authenticates a `V5` user or owner password (R5/R6 share the `/U`,`/UE` and
/// `/O`,`/OE` layout; R5 is a degenerate one-round case of the same hash).
/// Tries the user password first, then the owner password, mirroring how a
/// reader has no a-priori knowledge of which kind of password it was given.
pub fn authenticate_r5_r6(password: &[u8], u: &[u8], ue: &[u8], o: &[u8], oe: &[u8]) -> Option<[u8; 32]> {
    if u.len() < 48 || ue.len() < 32 {
        return None;
    }
    let validation_salt = &u[32..40];
    let key_salt = &u[40..48];
    if constant_time_eq(&hash_2b(password, validation_salt, &[]), &u[0..32]) {
        let intermediate = hash_2b(password, key_salt, &[]);
        let mut ue32 = [0u8; 32];
        ue32.copy_from_slice(&ue[..32]);
        return Some(aes::cbc256_decrypt_nopad_zero_iv(&intermediate, &ue32));
    }

    if o.len() < 48 || oe.len() < 32 {
        return None;
    }
    let o_validation_salt = &o[32..40];
    let o_key_salt = &o[40..48];
    if constant_time_eq(&hash_2b(password, o_validation_salt, &u[..48]), &o[0..32]) {
        let intermediate = hash_2b(password, o_key_salt, &u[..48]);
        let mut oe32 = [0u8; 32];
        oe32.copy_from_slice(&oe[..32]);
        return Some(aes::cbc256_decrypt_nopad_zero_iv(&intermediate, &oe32));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_password_fills_with_padding_constant() {
        let padded = pad_password(b"");
        assert_eq!(padded, PADDING);
    }

    #[test]
    fn pad_password_truncates_long_input() {
        let long = [0x41u8; 40];
        let padded = pad_password(&long);
        assert_eq!(&padded[..], &[0x41u8; 32][..]);
    }

    #[test]
    fn empty_user_password_round_trips_r3() {
        let id0 = b"0123456789ABCDEF";
        let key = compute_encryption_key(b"", &[0u8; 32], -4, id0, 3, 16, true);
        let u = compute_u_r3(&key, id0);
        assert_eq!(authenticate_user_password(b"", &[0u8; 32], &u, -4, id0, 3, 16, true), Some(key));
    }
}
