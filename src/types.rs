//! Key material and the binary envelope layout.
//!
//! An envelope is three fixed-order segments:
//!
//! ```text
//! [ key box for recipient 1 | key box for recipient 2 | nonce || AEAD ciphertext ]
//! ```
//!
//! Each key box is the content key sealed anonymously to one recipient, so both are exactly
//! [`KEY_BOX_SIZE`] bytes long. Nothing in the envelope identifies the recipients; position is
//! only an artifact of the order the public keys were passed to [`crate::encrypt`].

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::EitherboxError;

/// Size of public keys, private keys and the content key.
pub const KEY_SIZE: usize = 32;

/// Size of the XChaCha20-Poly1305 nonce stored in front of the payload ciphertext.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag appended to the payload ciphertext.
pub const TAG_SIZE: usize = 16;

/// Bytes added by anonymous sealing: the ephemeral X25519 public key plus a Poly1305 tag.
pub const SEAL_OVERHEAD: usize = KEY_SIZE + TAG_SIZE;

/// Length of one sealed copy of the content key.
pub const KEY_BOX_SIZE: usize = KEY_SIZE + SEAL_OVERHEAD;

/// Fixed number of bytes an envelope adds on top of the payload.
pub const ENVELOPE_OVERHEAD: usize = 2 * KEY_BOX_SIZE + NONCE_SIZE + TAG_SIZE;

/* ---------------- Keys ---------------- */

/// X25519 public key of one envelope recipient.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; KEY_SIZE]);

impl PublicKey {
    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Parse a public key from a byte slice of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EitherboxError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| EitherboxError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(hex_str: &str) -> Result<Self, EitherboxError> {
        let bytes = hex::decode(hex_str.trim())?;
        Self::from_slice(&bytes)
    }

    /// Encode the key as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// X25519 private key. Wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; KEY_SIZE]);

impl PrivateKey {
    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Parse a private key from a byte slice of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EitherboxError> {
        if bytes.len() != KEY_SIZE {
            return Err(EitherboxError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Parse a hex-encoded private key.
    pub fn from_hex(hex_str: &str) -> Result<Self, EitherboxError> {
        let bytes = Zeroizing::new(hex::decode(hex_str.trim())?);
        Self::from_slice(&bytes)
    }

    /// Encode the key as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; KEY_SIZE]> for PrivateKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Matched public/private key pair held by one party.
#[derive(Clone, Debug)]
pub struct KeyPair {
    /// Public half, handed to whoever builds envelopes for this party.
    pub public: PublicKey,
    /// Private half, needed to open envelopes.
    pub private: PrivateKey,
}

/* ---------------- Envelope ---------------- */

/// Sealed payload that either of two recipients can open.
///
/// Serializes as a single byte string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(#[serde(with = "serde_bytes")] Vec<u8>);

impl Envelope {
    /// Total envelope length for a payload of `payload_len` bytes.
    pub const fn sealed_len(payload_len: usize) -> usize {
        ENVELOPE_OVERHEAD + payload_len
    }

    /// Borrow the wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the wire bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the wire bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True only for an empty byte string, which never decrypts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Open the envelope with one recipient's key pair. See [`crate::decrypt`].
    pub fn decrypt(
        &self,
        own_public: &PublicKey,
        own_private: &PrivateKey,
    ) -> Result<Vec<u8>, EitherboxError> {
        crate::crypto::decrypt(&self.0, own_public, own_private)
    }
}

impl From<Vec<u8>> for Envelope {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<Envelope> for Vec<u8> {
    fn from(envelope: Envelope) -> Self {
        envelope.0
    }
}

impl AsRef<[u8]> for Envelope {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Borrowed view of the three envelope segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segments<'a> {
    /// Sealed content key copies, in construction order.
    pub key_boxes: [&'a [u8]; 2],
    /// Nonce followed by the AEAD ciphertext of the payload.
    pub ciphertext: &'a [u8],
}

impl<'a> Segments<'a> {
    /// Split raw envelope bytes into their segments.
    ///
    /// Fails with [`EitherboxError::Malformed`] unless the input is strictly longer than the
    /// two key boxes. No cryptographic work is done here.
    pub fn split(bytes: &'a [u8]) -> Result<Self, EitherboxError> {
        if bytes.len() <= 2 * KEY_BOX_SIZE {
            return Err(EitherboxError::Malformed);
        }
        let (first, rest) = bytes.split_at(KEY_BOX_SIZE);
        let (second, ciphertext) = rest.split_at(KEY_BOX_SIZE);
        Ok(Self {
            key_boxes: [first, second],
            ciphertext,
        })
    }
}
