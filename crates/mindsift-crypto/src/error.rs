//! Error types for credential vault operations.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Vault secret is not configured.
    #[error("Vault secret is not configured (set MINDSIFT_SECRET)")]
    MissingSecret,

    /// Passphrase too short.
    #[error("Vault passphrase too short (minimum {0} characters required)")]
    PassphraseTooShort(usize),

    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Authentication tag mismatch - data may be tampered or corrupt.
    /// Never surfaces partial or garbage plaintext.
    #[error("Decryption failed - data may be tampered or corrupt")]
    TamperedOrCorrupt,

    /// Stored blob is not valid hex or has an impossible length.
    #[error("Invalid encrypted blob: {0}")]
    InvalidFormat(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
