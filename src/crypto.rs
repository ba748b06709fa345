use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, error, trace};
use zeroize::Zeroizing;

use crate::errors::{EitherboxError, Result};
use crate::types::*;

/* ---------------- Keygen ---------------- */

impl KeyPair {
    /// Generate a fresh X25519 key pair from the system random source.
    pub fn generate() -> Result<Self> {
        let seed = random_key()?;
        Ok(Self::from_private(PrivateKey::from(*seed)))
    }

    /// Rebuild the full key pair from a stored private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let secret = crypto_box::SecretKey::from(*private.as_bytes());
        let public = PublicKey::from(*secret.public_key().as_bytes());
        Self { public, private }
    }
}

/* ---------------- Randomness ---------------- */

fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|err| {
        error!(error = %err, "secure random source failed");
        EitherboxError::from(err)
    })
}

fn random_key() -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    fill_random(&mut key[..])?;
    Ok(key)
}

fn random_nonce() -> Result<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;
    Ok(nonce)
}

/* ---------------- Symmetric helpers ---------------- */

fn aead_enc(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    pt: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .encrypt(XNonce::from_slice(nonce), Payload { msg: pt, aad })
        .map_err(|_| EitherboxError::Aead)
}

fn aead_dec(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    aad: &[u8],
    ct: &[u8],
) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ct, aad })
        .map_err(|_| EitherboxError::Forged)
}

/* ---------------- Anonymous sealing ---------------- */

// Any clamped scalar works: only points in the small-order subgroup map to zero.
const TRIAL_SCALAR: [u8; KEY_SIZE] = [0x5a; KEY_SIZE];

/// True if `key` lies in the small-order subgroup. Sealing to such a key yields an all-zero
/// shared secret, so anyone could open the key box.
fn is_low_order(key: &PublicKey) -> bool {
    let scalar = x25519_dalek::StaticSecret::from(TRIAL_SCALAR);
    let point = x25519_dalek::PublicKey::from(*key.as_bytes());
    !scalar.diffie_hellman(&point).was_contributory()
}

fn seal_key(recipient: &PublicKey, content_key: &[u8; KEY_SIZE]) -> Result<Vec<u8>> {
    if is_low_order(recipient) {
        debug!("rejected low-order recipient key");
        return Err(EitherboxError::Seal);
    }
    let recipient = crypto_box::PublicKey::from(*recipient.as_bytes());
    let key_box = recipient
        .seal(&mut OsRng, &content_key[..])
        .map_err(|_| EitherboxError::Seal)?;
    if key_box.len() != KEY_BOX_SIZE {
        return Err(EitherboxError::Seal);
    }
    Ok(key_box)
}

/// Try to unseal the content key from each candidate key box, in order.
///
/// Every candidate is attempted even after one has opened, so the work done does not depend
/// on which position (if any) belongs to the caller. The first candidate that opens to a
/// [`KEY_SIZE`]-byte key wins.
///
/// `own_public` must be the public half of `own_private`. A mismatched pair opens nothing.
/// The returned value is the secret content key.
pub(crate) fn open_any<'a, I>(
    own_public: &PublicKey,
    own_private: &PrivateKey,
    candidates: I,
) -> Result<Zeroizing<[u8; KEY_SIZE]>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let secret = crypto_box::SecretKey::from(*own_private.as_bytes());
    let pair_matches = secret.public_key().as_bytes() == own_public.as_bytes();

    let mut content_key: Option<Zeroizing<[u8; KEY_SIZE]>> = None;
    let mut attempts = 0usize;
    for candidate in candidates {
        attempts += 1;
        let opened = secret.unseal(candidate).map(Zeroizing::new);
        if let Ok(bytes) = opened {
            if pair_matches && content_key.is_none() && bytes.len() == KEY_SIZE {
                let mut key = Zeroizing::new([0u8; KEY_SIZE]);
                key.copy_from_slice(&bytes);
                content_key = Some(key);
            }
        }
    }
    trace!(attempts, "tried key boxes");

    content_key.ok_or(EitherboxError::Unauthorized)
}

/* ---------------- Encrypt ---------------- */

/// Seal `payload` so that either `recipient1` or `recipient2` can open it.
///
/// A fresh content key and nonce are drawn for every call. The content key is sealed once
/// per recipient and the resulting envelope is laid out as
/// `[key box 1 | key box 2 | nonce || ciphertext]`. Both key boxes are authenticated as
/// associated data of the payload ciphertext. Any failure aborts the whole call; no partial
/// envelope is ever returned. [`EitherboxError::Entropy`] is fatal.
pub fn encrypt(payload: &[u8], recipient1: &PublicKey, recipient2: &PublicKey) -> Result<Envelope> {
    let content_key = random_key()?;
    let nonce = random_nonce()?;

    let mut wire = Vec::with_capacity(Envelope::sealed_len(payload.len()));
    wire.extend_from_slice(&seal_key(recipient1, &content_key)?);
    wire.extend_from_slice(&seal_key(recipient2, &content_key)?);

    // AAD = both key boxes, so neither can be swapped or damaged without detection
    let ciphertext = aead_enc(&content_key, &nonce, &wire, payload)?;
    wire.extend_from_slice(&nonce);
    wire.extend_from_slice(&ciphertext);

    debug!(
        payload_len = payload.len(),
        envelope_len = wire.len(),
        "sealed envelope"
    );
    Ok(Envelope::from(wire))
}

/* ---------------- Decrypt ---------------- */

/// Open an envelope with one recipient's key pair.
///
/// The caller does not need to know whether it was the first or second recipient: both key
/// boxes are always tried. Errors are returned in validation order:
///
/// - [`EitherboxError::Malformed`] if the envelope cannot hold both key boxes plus a nonce
/// - [`EitherboxError::Unauthorized`] if neither key box opens with this key pair
/// - [`EitherboxError::Forged`] if the payload fails authentication
pub fn decrypt(envelope: &[u8], own_public: &PublicKey, own_private: &PrivateKey) -> Result<Vec<u8>> {
    let segments = Segments::split(envelope).map_err(|err| {
        debug!(envelope_len = envelope.len(), "envelope too short");
        err
    })?;

    let content_key = open_any(own_public, own_private, segments.key_boxes).map_err(|err| {
        debug!("no key box opened");
        err
    })?;

    if segments.ciphertext.len() < NONCE_SIZE {
        debug!("ciphertext too short for nonce");
        return Err(EitherboxError::Malformed);
    }
    let (nonce_bytes, ciphertext) = segments.ciphertext.split_at(NONCE_SIZE);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(nonce_bytes);

    let key_boxes = &envelope[..2 * KEY_BOX_SIZE];
    let payload = aead_dec(&content_key, &nonce, key_boxes, ciphertext).map_err(|err| {
        debug!("payload failed authentication");
        err
    })?;

    debug!(payload_len = payload.len(), "opened envelope");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_key_has_fixed_size() {
        let pair = KeyPair::generate().unwrap();
        let key = random_key().unwrap();
        let key_box = seal_key(&pair.public, &key).unwrap();
        assert_eq!(key_box.len(), KEY_BOX_SIZE);
    }

    #[test]
    fn test_open_any_second_candidate() {
        let pair = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let key = random_key().unwrap();

        let miss = seal_key(&other.public, &key).unwrap();
        let hit = seal_key(&pair.public, &key).unwrap();

        let opened = open_any(&pair.public, &pair.private, [&miss[..], &hit[..]]).unwrap();
        assert_eq!(*opened, *key);
    }

    #[test]
    fn test_open_any_first_success_wins() {
        let pair = KeyPair::generate().unwrap();
        let first = random_key().unwrap();
        let second = random_key().unwrap();

        let box1 = seal_key(&pair.public, &first).unwrap();
        let box2 = seal_key(&pair.public, &second).unwrap();

        let opened = open_any(&pair.public, &pair.private, [&box1[..], &box2[..]]).unwrap();
        assert_eq!(*opened, *first);
    }

    #[test]
    fn test_open_any_no_candidates() {
        let pair = KeyPair::generate().unwrap();
        let result = open_any(&pair.public, &pair.private, std::iter::empty::<&[u8]>());
        assert_eq!(result.unwrap_err(), EitherboxError::Unauthorized);
    }

    #[test]
    fn test_open_any_mismatched_pair() {
        let pair = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let key = random_key().unwrap();
        let key_box = seal_key(&pair.public, &key).unwrap();

        let result = open_any(&other.public, &pair.private, [&key_box[..]]);
        assert_eq!(result.unwrap_err(), EitherboxError::Unauthorized);
    }

    #[test]
    fn test_keypair_from_private_matches() {
        let pair = KeyPair::generate().unwrap();
        let rebuilt = KeyPair::from_private(pair.private.clone());
        assert_eq!(rebuilt.public, pair.public);
    }

    // Small-order X25519 encodings, including non-canonical ones
    const LOW_ORDER_KEYS: [&str; 7] = [
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0100000000000000000000000000000000000000000000000000000000000000",
        "e0eb7a7c3b41b8ae1656e3faf19fc46ada098deb9c32b1fd866205165f49b800",
        "5f9c95bca3508c24b1d0b1559c83ef5b04445cc4581c8e86d8224eddd09f1157",
        "ecffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f",
        "edffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f",
        "eeffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f",
    ];

    #[test]
    fn test_low_order_keys_detected() {
        for hex_key in LOW_ORDER_KEYS {
            let key = PublicKey::from_hex(hex_key).unwrap();
            assert!(is_low_order(&key), "{hex_key} not flagged");
        }
    }

    #[test]
    fn test_generated_keys_not_low_order() {
        for _ in 0..16 {
            let pair = KeyPair::generate().unwrap();
            assert!(!is_low_order(&pair.public));
        }
    }

    #[test]
    fn test_seal_key_rejects_low_order() {
        let key = random_key().unwrap();
        for hex_key in LOW_ORDER_KEYS {
            let recipient = PublicKey::from_hex(hex_key).unwrap();
            assert_eq!(seal_key(&recipient, &key), Err(EitherboxError::Seal));
        }
    }

    #[test]
    fn test_each_key_box_opens_for_one_recipient() {
        let k1 = KeyPair::generate().unwrap();
        let k2 = KeyPair::generate().unwrap();

        let envelope = encrypt(b"layout", &k1.public, &k2.public).unwrap();
        let segments = Segments::split(envelope.as_bytes()).unwrap();

        assert!(open_any(&k1.public, &k1.private, [segments.key_boxes[0]]).is_ok());
        assert!(open_any(&k1.public, &k1.private, [segments.key_boxes[1]]).is_err());
        assert!(open_any(&k2.public, &k2.private, [segments.key_boxes[1]]).is_ok());
        assert!(open_any(&k2.public, &k2.private, [segments.key_boxes[0]]).is_err());
    }

    #[test]
    fn test_both_key_boxes_hold_same_content_key() {
        let k1 = KeyPair::generate().unwrap();
        let k2 = KeyPair::generate().unwrap();

        let envelope = encrypt(b"shared", &k1.public, &k2.public).unwrap();
        let segments = Segments::split(envelope.as_bytes()).unwrap();

        let key1 = open_any(&k1.public, &k1.private, segments.key_boxes).unwrap();
        let key2 = open_any(&k2.public, &k2.private, segments.key_boxes).unwrap();
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn test_random_helpers_fresh() {
        assert_ne!(*random_key().unwrap(), *random_key().unwrap());
        assert_ne!(random_nonce().unwrap(), random_nonce().unwrap());
    }
}
