//! Credential Vault - Symmetric encryption of mail-account passwords
//!
//! AES-256-CBC with a random per-encryption IV, encoded as
//! `<ivHex>:<cipherHex>`. The key is derived from a process-wide secret,
//! length-normalized to 32 bytes. Input that does not match the encoded
//! shape is passed through unchanged so historical unencrypted rows keep
//! working; that fallback is a compatibility shim, not a security boundary.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const IV_LENGTH: usize = 16;
const KEY_LENGTH: usize = 32;

/// Vault errors
///
/// Only well-shaped ciphertext that fails to decrypt is an error; anything
/// that does not look encrypted is treated as legacy plaintext.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Credential ciphertext did not decrypt cleanly")]
    Corrupt,

    #[error("Decrypted credential is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Credential vault
///
/// Holds only the derived key; never touches storage.
#[derive(Clone)]
pub struct CredentialVault {
    key: [u8; KEY_LENGTH],
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // key bytes stay out of logs
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}

impl CredentialVault {
    /// Create a vault from the process-wide secret
    ///
    /// Secrets of any length normalize to the cipher's key size: the first
    /// 32 bytes of the base64-encoded SHA-256 digest of the secret.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let encoded = STANDARD.encode(digest);

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&encoded.as_bytes()[..KEY_LENGTH]);

        Self { key }
    }

    /// Encrypt a plaintext credential
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LENGTH];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    /// Decrypt a stored credential
    ///
    /// Values that do not match the `<ivHex>:<cipherHex>` shape are returned
    /// unchanged (legacy unencrypted rows).
    pub fn decrypt(&self, input: &str) -> Result<String, VaultError> {
        let Some((iv_hex, cipher_hex)) = input.split_once(':') else {
            return Ok(input.to_string());
        };

        let (Ok(iv), Ok(ciphertext)) = (hex::decode(iv_hex), hex::decode(cipher_hex)) else {
            return Ok(input.to_string());
        };

        if iv.len() != IV_LENGTH || ciphertext.is_empty() || ciphertext.len() % IV_LENGTH != 0 {
            return Ok(input.to_string());
        }

        let mut iv_bytes = [0u8; IV_LENGTH];
        iv_bytes.copy_from_slice(&iv);

        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv_bytes.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| VaultError::Corrupt)?;

        Ok(String::from_utf8(plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_roundtrip() {
        let vault = CredentialVault::new("test secret");
        let ciphertext = vault.encrypt("hunter2");

        assert!(ciphertext.contains(':'));
        assert_eq!(vault.decrypt(&ciphertext).unwrap(), "hunter2");
    }

    #[test]
    fn test_roundtrip_empty_and_unicode() {
        let vault = CredentialVault::new("test secret");
        for plaintext in ["", "p@ss wörd ✉", &"x".repeat(100)] {
            let ciphertext = vault.encrypt(plaintext);
            assert_eq!(vault.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_iv_is_random() {
        let vault = CredentialVault::new("test secret");
        assert_ne!(vault.encrypt("same"), vault.encrypt("same"));
    }

    #[test]
    fn test_legacy_plaintext_passthrough() {
        let vault = CredentialVault::new("test secret");

        // no colon means the row was never encrypted
        assert_eq!(vault.decrypt("plain_password").unwrap(), "plain_password");
        assert_eq!(vault.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_non_hex_passthrough() {
        let vault = CredentialVault::new("test secret");

        // colon present but parts are not hex: not our encoding
        assert_eq!(vault.decrypt("user:password").unwrap(), "user:password");
        // hex but wrong IV length
        assert_eq!(vault.decrypt("abcd:deadbeef").unwrap(), "abcd:deadbeef");
    }

    #[test]
    fn test_same_secret_interoperates() {
        let a = CredentialVault::new("shared secret");
        let b = CredentialVault::new("shared secret");

        assert_eq!(b.decrypt(&a.encrypt("hunter2")).unwrap(), "hunter2");
    }

    #[test]
    fn test_wrong_key_never_reveals_plaintext() {
        let vault = CredentialVault::new("secret one");
        let other = CredentialVault::new("secret two");
        let ciphertext = vault.encrypt("hunter2");

        match other.decrypt(&ciphertext) {
            Ok(plaintext) => assert_ne!(plaintext, "hunter2"),
            Err(_) => {}
        }
    }

    #[test]
    fn test_key_normalization_handles_any_secret_length() {
        let short = CredentialVault::new("s");
        let long = CredentialVault::new(&"long".repeat(50));

        assert_eq!(short.decrypt(&short.encrypt("x")).unwrap(), "x");
        assert_eq!(long.decrypt(&long.encrypt("x")).unwrap(), "x");
    }
}
