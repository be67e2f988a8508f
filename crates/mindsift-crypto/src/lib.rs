//! # mindsift-crypto
//!
//! Credential vault primitives for mindsift.
//!
//! This crate provides:
//! - Argon2id key derivation from a configured passphrase
//! - AES-256-GCM authenticated encryption with per-call random nonces
//! - The [`Vault`] encrypt/decrypt boundary protecting stored API keys
//!   and sync secrets
//!
//! ## Example
//!
//! ```rust
//! use mindsift_crypto::{KdfParams, Vault, VaultConfig};
//!
//! let config = VaultConfig::new("my-long-vault-passphrase")
//!     .with_kdf(KdfParams::low_memory());
//! let vault = Vault::new(&config).unwrap();
//!
//! let sealed = vault.encrypt("sk-ant-...").unwrap();
//! assert_eq!(vault.decrypt(&sealed).unwrap(), "sk-ant-...");
//! ```

pub mod cipher;
pub mod error;
pub mod kdf;
pub mod vault;

pub use error::{CryptoError, CryptoResult};
pub use kdf::{DerivedKey, KdfParams, MIN_PASSPHRASE_LENGTH};
pub use vault::{EncryptedSecret, Vault, VaultConfig, ENV_VAULT_SECRET};
