//! RSA-OAEP encryption of the KSeF API token
//!
//! The plaintext is `"{token}|{timestamp}"`, encrypted with OAEP using
//! SHA-256 for both the hash and MGF1, then base64-encoded. Neither the
//! plaintext nor the ciphertext is ever logged.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ksef_core::TokenEncryptor;
use ksef_domain::{KsefError, Result};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

/// Parse an RSA public key from SPKI (`BEGIN PUBLIC KEY`) or PKCS#1
/// (`BEGIN RSA PUBLIC KEY`) PEM text.
pub fn parse_public_key(pem: &str) -> std::result::Result<RsaPublicKey, String> {
    RsaPublicKey::from_public_key_pem(pem).or_else(|spki_err| {
        RsaPublicKey::from_pkcs1_pem(pem).map_err(|_| spki_err.to_string())
    })
}

/// Read and parse the public key file.
///
/// # Errors
/// `Config` when the file is missing, unreadable or not an RSA public key.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey> {
    if !path.exists() {
        return Err(KsefError::Config(format!("public key file not found: {}", path.display())));
    }

    let pem = fs::read_to_string(path).map_err(|err| {
        KsefError::Config(format!("cannot read public key file {}: {err}", path.display()))
    })?;

    parse_public_key(&pem).map_err(|reason| {
        KsefError::Config(format!(
            "public key file {} is not an RSA public key: {reason}",
            path.display()
        ))
    })
}

/// Encrypt `"{api_token}|{server_timestamp}"` under `key`.
///
/// # Errors
/// `Security` when the payload does not fit the key.
pub fn encrypt_token(
    key: &RsaPublicKey,
    api_token: &str,
    server_timestamp: &str,
) -> Result<String> {
    let plaintext = format!("{api_token}|{server_timestamp}");
    let mut rng = rand::thread_rng();

    let ciphertext = key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext.as_bytes())
        .map_err(|err| KsefError::Security(format!("token encryption failed: {err}")))?;

    Ok(STANDARD.encode(ciphertext))
}

/// Encryptor over an already loaded key.
pub struct RsaTokenEncryptor {
    key: RsaPublicKey,
}

impl RsaTokenEncryptor {
    pub fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }
}

impl TokenEncryptor for RsaTokenEncryptor {
    fn encrypt(&self, api_token: &str, server_timestamp: &str) -> Result<String> {
        encrypt_token(&self.key, api_token, server_timestamp)
    }
}

/// Encryptor that reads the PEM file on every call, so a missing key only
/// fails the operation that needs it.
pub struct PemFileTokenEncryptor {
    path: PathBuf,
}

impl PemFileTokenEncryptor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenEncryptor for PemFileTokenEncryptor {
    fn encrypt(&self, api_token: &str, server_timestamp: &str) -> Result<String> {
        let key = load_public_key(&self.path)?;
        encrypt_token(&key, api_token, server_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::pkcs8::{EncodePublicKey, LineEnding};
    use rsa::RsaPrivateKey;
    use tempfile::TempDir;

    use super::*;

    const TOKEN: &str = "20240501-EC-0123456789ABCDEF";
    const TIMESTAMP: &str = "2024-05-01T08:00:00.000Z";

    fn key_pair() -> (RsaPrivateKey, RsaPublicKey) {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    fn decrypt(private: &RsaPrivateKey, encoded: &str) -> String {
        let ciphertext = STANDARD.decode(encoded).unwrap();
        let plaintext = private.decrypt(Oaep::new::<Sha256>(), &ciphertext).unwrap();
        String::from_utf8(plaintext).unwrap()
    }

    #[test]
    fn pem_file_encryptor_round_trips_with_private_key() {
        let (private, public) = key_pair();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ksef_public_key.pem");
        fs::write(&path, public.to_public_key_pem(LineEnding::LF).unwrap()).unwrap();

        let encryptor = PemFileTokenEncryptor::new(&path);
        let first = encryptor.encrypt(TOKEN, TIMESTAMP).unwrap();
        let second = encryptor.encrypt(TOKEN, TIMESTAMP).unwrap();

        assert_eq!(decrypt(&private, &first), format!("{TOKEN}|{TIMESTAMP}"));
        assert_ne!(first, second);
        assert!(!first.contains(TOKEN));
    }

    #[test]
    fn pkcs1_pem_is_accepted() {
        let (private, public) = key_pair();
        let pem = public.to_pkcs1_pem(LineEnding::LF).unwrap();

        let key = parse_public_key(&pem).unwrap();
        let encrypted = RsaTokenEncryptor::new(key).encrypt(TOKEN, TIMESTAMP).unwrap();

        assert_eq!(decrypt(&private, &encrypted), format!("{TOKEN}|{TIMESTAMP}"));
    }

    #[test]
    fn missing_key_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let encryptor = PemFileTokenEncryptor::new(dir.path().join("absent.pem"));

        let err = encryptor.encrypt(TOKEN, TIMESTAMP).unwrap_err();

        assert!(matches!(err, KsefError::Config(msg) if msg.contains("public key file not found")));
    }

    #[test]
    fn garbage_key_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pem");
        fs::write(&path, "-----BEGIN PUBLIC KEY-----\nbm90IGEga2V5\n-----END PUBLIC KEY-----\n")
            .unwrap();

        let err = load_public_key(&path).unwrap_err();

        assert!(matches!(err, KsefError::Config(msg) if msg.contains("not an RSA public key")));
    }
}
