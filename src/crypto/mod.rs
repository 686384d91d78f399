//! Field-level encryption.
//!
//! Values are encrypted into a self-describing token:
//!
//! ```text
//! <profile>:<tag>:<iv hex>:<ciphertext>
//! ```
//!
//! `tag` and `ciphertext` are base64, `tag` is empty for ciphers without
//! authentication. The profile name travels with the ciphertext so a table can keep
//! old profiles installed for reading while new values are written with a rotated one.
mod b64_encode;
mod profile;

pub use profile::{
    Cipher, CryptoConfig, CryptoProfile, ProfileRegistry, ProfileSettings, PRIMARY_PROFILE,
};

use crate::errors::{ConfigError, CryptoError};
use aes::Aes256;
use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray, Aead, KeyInit},
    AesGcm,
};
use b64_encode::{b64_decode, b64_encode};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit, StreamCipher};
use log::debug;
use parking_lot::RwLock;
use rand::RngCore;
use std::sync::Arc;

const IV_LENGTH: usize = 16;
const TAG_LENGTH: usize = 16;

// 16 byte nonces keep tokens interchangeable with the other ciphers' IV length
type Aes256Gcm16 = AesGcm<Aes256, U16>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Holds the installed [`ProfileRegistry`] and encrypts / decrypts with it.
///
/// Every call works against a snapshot of the registry, so [`Crypto::install`]
/// never changes the profiles seen by a call already in progress.
#[derive(Debug, Default)]
pub struct Crypto {
    registry: RwLock<Arc<ProfileRegistry>>,
}

impl Crypto {
    pub fn new(config: &CryptoConfig) -> Result<Self, ConfigError> {
        let registry = ProfileRegistry::from_config(config, 1)?;

        Ok(Self {
            registry: RwLock::new(Arc::new(registry)),
        })
    }

    /// Replace every installed profile. Returns the new registry version.
    pub fn install(&self, config: &CryptoConfig) -> Result<u64, ConfigError> {
        let mut guard = self.registry.write();
        let registry = ProfileRegistry::from_config(config, guard.version() + 1)?;
        let version = registry.version();

        *guard = Arc::new(registry);
        debug!("Installed crypto profiles (version {version})");

        Ok(version)
    }

    pub fn registry(&self) -> Arc<ProfileRegistry> {
        self.registry.read().clone()
    }

    pub fn encrypt(&self, text: &str, profile: &str) -> Result<String, CryptoError> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let registry = self.registry();
        let profile = registry
            .get(profile)
            .ok_or_else(|| CryptoError::MissingProfile(profile.to_string()))?;

        let mut iv = [0u8; IV_LENGTH];
        rand::thread_rng().fill_bytes(&mut iv);

        let (tag, ciphertext) = seal(profile, &iv, text.as_bytes())?;

        Ok(format!(
            "{}:{}:{}:{}",
            profile.name(),
            tag.map(b64_encode).unwrap_or_default(),
            hex::encode(iv),
            b64_encode(ciphertext)
        ))
    }

    /// Decrypt a token produced by [`Crypto::encrypt`].
    ///
    /// Anything that is not shaped like a token is returned as is, which lets encrypted
    /// and plaintext values coexist in a table.
    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        let Some(parts) = TokenParts::split(token) else {
            return Ok(token.to_string());
        };

        let registry = self.registry();
        let profile = registry
            .get(parts.profile)
            .ok_or_else(|| CryptoError::MissingProfile(parts.profile.to_string()))?;

        let iv = hex::decode(parts.iv).map_err(|e| CryptoError::InvalidToken(e.to_string()))?;
        let ciphertext = b64_decode(parts.ciphertext)?;
        let tag = if parts.tag.is_empty() {
            None
        } else {
            Some(b64_decode(parts.tag)?)
        };

        let plaintext = open(profile, &iv, tag, ciphertext)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
    }
}

struct TokenParts<'t> {
    profile: &'t str,
    tag: &'t str,
    iv: &'t str,
    ciphertext: &'t str,
}

impl<'t> TokenParts<'t> {
    fn split(token: &'t str) -> Option<Self> {
        let mut fields = token.split(':');

        let parts = Self {
            profile: fields.next()?,
            tag: fields.next()?,
            iv: fields.next()?,
            ciphertext: fields.next()?,
        };

        if fields.next().is_some()
            || parts.profile.is_empty()
            || parts.iv.is_empty()
            || parts.ciphertext.is_empty()
        {
            return None;
        }

        Some(parts)
    }
}

fn seal(
    profile: &CryptoProfile,
    iv: &[u8; IV_LENGTH],
    plaintext: &[u8],
) -> Result<(Option<Vec<u8>>, Vec<u8>), CryptoError> {
    let secret = &profile.secret()[..];

    match profile.cipher() {
        Cipher::Aes256Gcm => {
            let cipher = Aes256Gcm16::new(GenericArray::from_slice(secret));
            let mut sealed = cipher
                .encrypt(GenericArray::from_slice(iv), plaintext)
                .map_err(|_| CryptoError::Authentication)?;
            let tag = sealed.split_off(sealed.len() - TAG_LENGTH);

            Ok((Some(tag), sealed))
        }
        Cipher::Aes256Cbc => {
            let ciphertext = cbc::Encryptor::<Aes256>::new_from_slices(secret, iv)
                .map_err(|e| CryptoError::InvalidToken(e.to_string()))?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

            Ok((None, ciphertext))
        }
        Cipher::Aes256Ctr => {
            let mut buf = plaintext.to_vec();
            Aes256Ctr::new_from_slices(secret, iv)
                .map_err(|e| CryptoError::InvalidToken(e.to_string()))?
                .apply_keystream(&mut buf);

            Ok((None, buf))
        }
    }
}

fn open(
    profile: &CryptoProfile,
    iv: &[u8],
    tag: Option<Vec<u8>>,
    mut ciphertext: Vec<u8>,
) -> Result<Vec<u8>, CryptoError> {
    if iv.len() != IV_LENGTH {
        return Err(CryptoError::InvalidToken(format!(
            "expected a {IV_LENGTH} byte IV, got {}",
            iv.len()
        )));
    }

    let secret = &profile.secret()[..];

    match profile.cipher() {
        Cipher::Aes256Gcm => {
            let tag = tag
                .filter(|tag| tag.len() == TAG_LENGTH)
                .ok_or(CryptoError::Authentication)?;
            ciphertext.extend_from_slice(&tag);

            Aes256Gcm16::new(GenericArray::from_slice(secret))
                .decrypt(GenericArray::from_slice(iv), ciphertext.as_slice())
                .map_err(|_| CryptoError::Authentication)
        }
        Cipher::Aes256Cbc => cbc::Decryptor::<Aes256>::new_from_slices(secret, iv)
            .map_err(|e| CryptoError::InvalidToken(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::Padding),
        Cipher::Aes256Ctr => {
            Aes256Ctr::new_from_slices(secret, iv)
                .map_err(|e| CryptoError::InvalidToken(e.to_string()))?
                .apply_keystream(&mut ciphertext);

            Ok(ciphertext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> Crypto {
        let config: CryptoConfig = [
            (
                "primary".to_string(),
                ProfileSettings::new("aes-256-gcm", "primary-password"),
            ),
            (
                "cbc".to_string(),
                ProfileSettings::new("aes-256-cbc", "cbc-password"),
            ),
            (
                "ctr".to_string(),
                ProfileSettings::new("aes-256-ctr", "ctr-password"),
            ),
        ]
        .into_iter()
        .collect();

        Crypto::new(&config).expect("Failed to build crypto")
    }

    #[test]
    fn test_round_trip_all_ciphers() {
        let crypto = crypto();

        for profile in ["primary", "cbc", "ctr"] {
            for text in ["secret", "x", "with:colons:inside", "ünïcødé ✓"] {
                let token = crypto.encrypt(text, profile).unwrap();
                assert!(token.starts_with(&format!("{profile}:")));
                assert_eq!(crypto.decrypt(&token).unwrap(), text);
            }
        }
    }

    #[test]
    fn test_gcm_token_has_tag() {
        let token = crypto().encrypt("secret", "primary").unwrap();
        let fields: Vec<&str> = token.split(':').collect();

        assert_eq!(fields.len(), 4);
        assert!(!fields[1].is_empty());
        assert_eq!(fields[2].len(), IV_LENGTH * 2);
    }

    #[test]
    fn test_cbc_token_has_empty_tag() {
        let token = crypto().encrypt("secret", "cbc").unwrap();
        let fields: Vec<&str> = token.split(':').collect();

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1], "");
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let crypto = crypto();
        let a = crypto.encrypt("secret", "primary").unwrap();
        let b = crypto.encrypt("secret", "primary").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_is_noop() {
        let crypto = crypto();
        assert_eq!(crypto.encrypt("", "primary").unwrap(), "");
        assert_eq!(crypto.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_plaintext_passes_through() {
        let crypto = crypto();
        assert_eq!(crypto.decrypt("plainvalue").unwrap(), "plainvalue");
        assert_eq!(crypto.decrypt("a:b:c").unwrap(), "a:b:c");
        assert_eq!(crypto.decrypt("a:b:c:d:e").unwrap(), "a:b:c:d:e");
    }

    #[test]
    fn test_missing_profile() {
        let crypto = crypto();
        assert_eq!(
            crypto.encrypt("secret", "nope"),
            Err(CryptoError::MissingProfile("nope".to_string()))
        );

        let token = crypto.encrypt("secret", "primary").unwrap();
        let rewritten = token.replacen("primary", "nope", 1);
        assert_eq!(
            crypto.decrypt(&rewritten),
            Err(CryptoError::MissingProfile("nope".to_string()))
        );
    }

    #[test]
    fn test_tampered_tag_fails() {
        let crypto = crypto();
        let token = crypto.encrypt("secret", "primary").unwrap();
        let fields: Vec<&str> = token.split(':').collect();

        let mut tag = b64_decode(fields[1]).unwrap();
        tag[0] ^= 0xff;
        let tampered = format!("{}:{}:{}:{}", fields[0], b64_encode(tag), fields[2], fields[3]);

        assert_eq!(crypto.decrypt(&tampered), Err(CryptoError::Authentication));
    }

    #[test]
    fn test_stripped_tag_fails() {
        let crypto = crypto();
        let token = crypto.encrypt("secret", "primary").unwrap();
        let fields: Vec<&str> = token.split(':').collect();
        let stripped = format!("{}::{}:{}", fields[0], fields[2], fields[3]);

        assert_eq!(crypto.decrypt(&stripped), Err(CryptoError::Authentication));
    }

    #[test]
    fn test_rotation_keeps_old_profile_readable() {
        let crypto = crypto();
        let old = crypto.encrypt("secret", "primary").unwrap();

        let rotated: CryptoConfig = [
            (
                "primary".to_string(),
                ProfileSettings::new("aes-256-gcm", "primary-password"),
            ),
            (
                "v2".to_string(),
                ProfileSettings::new("aes-256-gcm", "rotated-password"),
            ),
        ]
        .into_iter()
        .collect();

        let before = crypto.registry();
        assert_eq!(crypto.install(&rotated).unwrap(), 2);

        // Snapshots taken before the install are untouched
        assert!(before.get("v2").is_none());
        assert!(crypto.registry().get("cbc").is_none());

        let new = crypto.encrypt("secret", "v2").unwrap();
        assert_eq!(crypto.decrypt(&old).unwrap(), "secret");
        assert_eq!(crypto.decrypt(&new).unwrap(), "secret");
    }

    #[test]
    fn test_wrong_password_fails_authentication() {
        let token = crypto().encrypt("secret", "primary").unwrap();

        let other: CryptoConfig = [(
            "primary".to_string(),
            ProfileSettings::new("aes-256-gcm", "different"),
        )]
        .into_iter()
        .collect();

        let crypto = Crypto::new(&other).unwrap();
        assert_eq!(crypto.decrypt(&token), Err(CryptoError::Authentication));
    }
}
