//! Error types for eitherbox operations.

use thiserror::Error;

/// Errors that can occur while building or opening an envelope, or parsing key material.
///
/// None of the variants carry plaintext, key bytes, or which key box came closer to opening.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EitherboxError {
    /// The secure random source failed. Fatal: retrying without fixing the source is unsafe.
    #[error("entropy source failure: {0}")]
    Entropy(String),

    /// Anonymous sealing of the content key failed.
    #[error("failed to seal content key")]
    Seal,

    /// Symmetric encryption of the payload failed.
    #[error("aead failure")]
    Aead,

    /// The envelope is too short to hold its fixed segments.
    #[error("malformed envelope")]
    Malformed,

    /// Neither key box opens with the supplied key pair.
    #[error("envelope cannot be opened with this key pair")]
    Unauthorized,

    /// The payload failed authentication after the content key was recovered.
    #[error("envelope failed authentication")]
    Forged,

    /// Key material has the wrong length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Key material is not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl EitherboxError {
    /// True for errors the caller must not retry, because the process cannot produce safe
    /// randomness.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Entropy(_))
    }
}

impl From<hex::FromHexError> for EitherboxError {
    fn from(err: hex::FromHexError) -> Self {
        Self::InvalidHex(err.to_string())
    }
}

impl From<rand::Error> for EitherboxError {
    fn from(err: rand::Error) -> Self {
        Self::Entropy(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EitherboxError>;
