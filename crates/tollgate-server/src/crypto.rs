//! Symmetric codec for the session cookie.
//!
//! AES-256-CBC with PKCS#7 padding and Base64 output, byte-compatible with
//! OpenSSL's `aes-256-cbc` when given the same string key and IV. Cookies
//! minted by earlier deployments therefore keep decrypting.
//!
//! # Security
//!
//! The IV is fixed per deployment rather than drawn per message, so equal
//! plaintexts produce equal ciphertexts. Switching to a random, prefixed IV
//! would change the cookie wire format and invalidate every live session.

use aes::Aes256;
use base64::{Engine, engine::general_purpose::STANDARD};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES block / IV length in bytes.
pub const IV_LEN: usize = 16;

/// Decryption failures. None of these are distinguishable to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("ciphertext is not valid base64")]
    InvalidBase64,

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidLength(usize),

    #[error("decryption failed (wrong key or corrupted input)")]
    Decrypt,

    #[error("decrypted text is not valid UTF-8")]
    InvalidUtf8,
}

/// Fixed-key, fixed-IV cipher for session credentials.
#[derive(Clone)]
pub struct CookieCipher {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl std::fmt::Debug for CookieCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCipher").finish_non_exhaustive()
    }
}

impl CookieCipher {
    /// Build a cipher from raw key and IV bytes.
    ///
    /// Inputs are fitted the way OpenSSL does it: short values are NUL-padded,
    /// long values truncated. A warning is logged when either was adjusted.
    pub fn new(secret: &[u8], iv: &[u8]) -> Self {
        if secret.len() != KEY_LEN {
            tracing::warn!(
                len = secret.len(),
                expected = KEY_LEN,
                "Session secret length differs from AES-256 key size; fitting it"
            );
        }
        if iv.len() != IV_LEN {
            tracing::warn!(
                len = iv.len(),
                expected = IV_LEN,
                "Session IV length differs from block size; fitting it"
            );
        }

        Self {
            key: fit(secret),
            iv: fit(iv),
        }
    }

    /// Encrypt `plaintext` and return Base64 ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> String {
        // Key and IV are fixed-size arrays, so construction cannot fail.
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        STANDARD.encode(ciphertext)
    }

    /// Decrypt Base64 ciphertext produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let bytes = STANDARD
            .decode(ciphertext.trim())
            .map_err(|_| CryptoError::InvalidBase64)?;

        if bytes.is_empty() || bytes.len() % IV_LEN != 0 {
            return Err(CryptoError::InvalidLength(bytes.len()));
        }

        let plaintext = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }
}

fn fit<const N: usize>(input: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let n = input.len().min(N);
    out[..n].copy_from_slice(&input[..n]);
    out
}
