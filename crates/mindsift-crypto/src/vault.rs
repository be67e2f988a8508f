//! The credential vault: symmetric encryption of provider API keys and
//! sync secrets at rest.
//!
//! The vault key is derived once, at construction, from a configured
//! passphrase via Argon2id. Every encrypt call draws a fresh random nonce,
//! so equal plaintexts produce distinct blobs. Decryption verifies the GCM
//! authentication tag and refuses tampered or corrupt data.

use serde::{Deserialize, Serialize};

use crate::cipher::{aes_gcm_decrypt, aes_gcm_encrypt, generate_nonce, NONCE_LEN};
use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_key, DerivedKey, KdfParams};

/// Domain-separation salt for the vault key derivation. Fixed so the same
/// passphrase always yields the same key across process restarts.
const VAULT_KEY_SALT: &[u8; 32] = b"mindsift.credential-vault.v1\0\0\0\0";

/// Environment variable holding the vault passphrase.
pub const ENV_VAULT_SECRET: &str = "MINDSIFT_SECRET";

/// An encrypted secret as stored: hex ciphertext (authentication tag
/// appended) plus the hex nonce it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    pub ciphertext: String,
    pub iv: String,
}

/// Configuration for constructing a [`Vault`].
#[derive(Clone)]
pub struct VaultConfig {
    passphrase: String,
    kdf: KdfParams,
}

impl VaultConfig {
    /// Build a config from an explicit passphrase.
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
            kdf: KdfParams::default(),
        }
    }

    /// Override the KDF cost parameters.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Read the passphrase from `MINDSIFT_SECRET`.
    ///
    /// A missing or empty variable is a configuration error surfaced here,
    /// at first use, rather than a silent wrong-plaintext path later.
    pub fn from_env() -> CryptoResult<Self> {
        match std::env::var(ENV_VAULT_SECRET) {
            Ok(passphrase) if !passphrase.is_empty() => Ok(Self::new(passphrase)),
            _ => Err(CryptoError::MissingSecret),
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("passphrase", &"[REDACTED]")
            .field("kdf", &self.kdf)
            .finish()
    }
}

/// Symmetric encryption boundary for stored credentials.
pub struct Vault {
    key: DerivedKey,
}

impl Vault {
    /// Derive the vault key and construct the vault.
    ///
    /// Key derivation is deliberately slow; construct once per worker
    /// context and share, rather than per call.
    pub fn new(config: &VaultConfig) -> CryptoResult<Self> {
        let key = derive_key(config.passphrase.as_bytes(), VAULT_KEY_SALT, &config.kdf)?;
        Ok(Self { key })
    }

    /// Encrypt a plaintext secret under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<EncryptedSecret> {
        let nonce = generate_nonce();
        let ciphertext = aes_gcm_encrypt(self.key.as_bytes(), &nonce, plaintext.as_bytes())?;

        Ok(EncryptedSecret {
            ciphertext: hex::encode(ciphertext),
            iv: hex::encode(nonce),
        })
    }

    /// Decrypt a stored secret, verifying its authentication tag.
    pub fn decrypt(&self, secret: &EncryptedSecret) -> CryptoResult<String> {
        let ciphertext = hex::decode(&secret.ciphertext)
            .map_err(|e| CryptoError::InvalidFormat(e.to_string()))?;
        let nonce_bytes =
            hex::decode(&secret.iv).map_err(|e| CryptoError::InvalidFormat(e.to_string()))?;

        let nonce: [u8; NONCE_LEN] = nonce_bytes.try_into().map_err(|_| {
            CryptoError::InvalidFormat(format!("nonce must be {} bytes", NONCE_LEN))
        })?;

        let plaintext = aes_gcm_decrypt(self.key.as_bytes(), &nonce, &ciphertext)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::TamperedOrCorrupt)
    }
}
