//! Session credential carried in the client's cookie.
//!
//! The plaintext is `code*|*access_token*|*code`. The authorization code is
//! repeated on both ends so that a decryption that happens to unpad cleanly
//! still has to produce exactly three fields to be accepted.

use crate::crypto::{CookieCipher, CryptoError};

/// Field delimiter inside the plaintext credential.
pub const DELIMITER: &str = "*|*";

/// Why a cookie value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("credential has {0} fields, expected 3")]
    Malformed(usize),
}

/// A decrypted, well-formed session credential.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    code: String,
    access_token: String,
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential").finish_non_exhaustive()
    }
}

impl SessionCredential {
    pub fn new(code: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            access_token: access_token.into(),
        }
    }

    /// The authorization code the session was created from.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The bearer token for the upstream API.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Plaintext form: `code*|*access_token*|*code`.
    pub fn to_plaintext(&self) -> String {
        [self.code.as_str(), &self.access_token, &self.code].join(DELIMITER)
    }

    /// Split a plaintext credential. Anything other than exactly three fields
    /// is rejected; the fields themselves are not otherwise inspected.
    pub fn from_plaintext(plaintext: &str) -> Result<Self, CredentialError> {
        let fields: Vec<&str> = plaintext.split(DELIMITER).collect();
        match fields.as_slice() {
            [code, access_token, _] => Ok(Self::new(*code, *access_token)),
            _ => Err(CredentialError::Malformed(fields.len())),
        }
    }

    /// Encrypt into a cookie value.
    pub fn seal(&self, cipher: &CookieCipher) -> String {
        cipher.encrypt(&self.to_plaintext())
    }

    /// Decrypt and split a cookie value.
    pub fn open(cookie_value: &str, cipher: &CookieCipher) -> Result<Self, CredentialError> {
        let plaintext = cipher.decrypt(cookie_value)?;
        Self::from_plaintext(&plaintext)
    }
}
