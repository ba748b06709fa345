//! # eitherbox
//!
//! A sealed box that can be opened by either of two key holders, without either holder
//! knowing about the other and without any interaction with the sender.
//!
//! ## Construction
//!
//! - **Content key:** fresh random 32-byte key per envelope
//! - **Payload encryption:** XChaCha20-Poly1305 with a fresh 24-byte nonce
//! - **Key wrapping:** the content key is sealed anonymously (X25519 + XSalsa20-Poly1305,
//!   NaCl `crypto_box_seal`) once for each recipient
//! - **Wire format:** `[key box 1 | key box 2 | nonce || ciphertext]`, no identifiers or version
//!
//! ## Example
//!
//! ```rust
//! use eitherbox::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let alice = KeyPair::generate()?;
//! let bob = KeyPair::generate()?;
//! let eve = KeyPair::generate()?;
//!
//! let envelope = encrypt(b"hello world", &alice.public, &bob.public)?;
//!
//! assert_eq!(envelope.decrypt(&alice.public, &alice.private)?, b"hello world");
//! assert_eq!(envelope.decrypt(&bob.public, &bob.private)?, b"hello world");
//! assert_eq!(
//!     envelope.decrypt(&eve.public, &eve.private),
//!     Err(EitherboxError::Unauthorized)
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Considerations
//!
//! - There is no sender authentication: anyone holding a recipient public key can build an
//!   envelope for it
//! - Envelope length reveals the payload length
//! - [`EitherboxError::Entropy`] means the system random source failed and must be treated as
//!   fatal, never retried
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0.

mod crypto;
mod errors;
mod types;

pub use crypto::*;
pub use errors::EitherboxError;
pub use types::*;
