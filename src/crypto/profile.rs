use crate::errors::ConfigError;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

/// The profile used when a caller does not name one.
pub const PRIMARY_PROFILE: &str = "primary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cipher {
    Aes256Gcm,
    Aes256Cbc,
    Aes256Ctr,
}

impl Cipher {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aes256Gcm => "aes-256-gcm",
            Self::Aes256Cbc => "aes-256-cbc",
            Self::Aes256Ctr => "aes-256-ctr",
        }
    }

    /// Authenticated modes carry a tag in the ciphertext token.
    pub fn is_authenticated(&self) -> bool {
        self.as_str().ends_with("-gcm")
    }
}

impl Default for Cipher {
    fn default() -> Self {
        Self::Aes256Gcm
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cipher {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-256-gcm" => Ok(Self::Aes256Gcm),
            "aes-256-cbc" => Ok(Self::Aes256Cbc),
            "aes-256-ctr" => Ok(Self::Aes256Ctr),
            other => Err(ConfigError::InvalidCipher(other.to_string())),
        }
    }
}

/// Settings for one named profile as they appear in configuration.
///
/// ```json
/// { "primary": { "cipher": "aes-256-gcm", "password": "..." } }
/// ```
#[derive(Deserialize, Clone)]
pub struct ProfileSettings {
    #[serde(default = "default_cipher")]
    pub cipher: String,
    pub password: String,
}

fn default_cipher() -> String {
    Cipher::default().as_str().to_string()
}

impl ProfileSettings {
    pub fn new(cipher: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            cipher: cipher.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ProfileSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileSettings")
            .field("cipher", &self.cipher)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

pub type CryptoConfig = HashMap<String, ProfileSettings>;

/// A named cipher with its derived secret.
pub struct CryptoProfile {
    name: String,
    cipher: Cipher,
    secret: [u8; 32],
    password: String,
}

impl CryptoProfile {
    pub fn new(name: impl Into<String>, cipher: Cipher, password: impl Into<String>) -> Self {
        let password = password.into();

        Self {
            name: name.into(),
            cipher,
            secret: Sha256::digest(password.as_bytes()).into(),
            password,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    pub(crate) fn secret(&self) -> &[u8; 32] {
        &self.secret
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for CryptoProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoProfile")
            .field("name", &self.name)
            .field("cipher", &self.cipher)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Immutable set of installed profiles. A new registry is built on every
/// (re)install and swapped in whole.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    version: u64,
    profiles: HashMap<String, Arc<CryptoProfile>>,
}

impl ProfileRegistry {
    pub fn from_config(config: &CryptoConfig, version: u64) -> Result<Self, ConfigError> {
        let profiles = config
            .iter()
            .map(|(name, settings)| {
                let cipher = settings.cipher.parse()?;
                let profile = CryptoProfile::new(name.clone(), cipher, settings.password.clone());
                Ok((name.clone(), Arc::new(profile)))
            })
            .collect::<Result<_, ConfigError>>()?;

        Ok(Self { version, profiles })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CryptoProfile>> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_sha256_of_password() {
        let profile = CryptoProfile::new("primary", Cipher::Aes256Gcm, "abc");

        assert_ne!(&profile.secret()[..], profile.password().as_bytes());
        assert_eq!(
            hex::encode(profile.secret()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_cipher_parse() {
        assert_eq!("AES-256-GCM".parse::<Cipher>().unwrap(), Cipher::Aes256Gcm);
        assert!(Cipher::Aes256Gcm.is_authenticated());
        assert!(!Cipher::Aes256Cbc.is_authenticated());
        assert!(matches!(
            "des".parse::<Cipher>(),
            Err(ConfigError::InvalidCipher(x)) if x == "des"
        ));
    }

    #[test]
    fn test_registry_from_json_config() {
        let config: CryptoConfig = serde_json::from_str(
            r#"{"primary": {"password": "one"}, "legacy": {"cipher": "aes-256-cbc", "password": "two"}}"#,
        )
        .unwrap();

        let registry = ProfileRegistry::from_config(&config, 3).unwrap();

        assert_eq!(registry.version(), 3);
        assert_eq!(registry.get("primary").unwrap().cipher(), Cipher::Aes256Gcm);
        assert_eq!(registry.get("legacy").unwrap().cipher(), Cipher::Aes256Cbc);
        assert!(registry.get("missing").is_none());
    }
}
