//! ECIES-ed25519: An Integrated Encryption Scheme on Twisted Edwards Curve25519.
//!
//! It uses many of the same primitives as the ed25519 signature scheme, but is also different.
//!   - It uses the same Secret Key representation as the ed25519 signature scheme.
//!   - It uses a different Public Key representation. While the ed25519 signature scheme hashes the
//!     secret key and mangles some bits before using it to derive the public key,
//!     ECIES-ed25519 uses the secret key directly. This means you should take care to
//!     use a good secure RNG or KDF to generate a your secret key.
//!
//! Ciphertext layout: `ephemeral public key (32) || AES-GCM nonce (12) || AES-GCM ciphertext`.

use crate::*;
use aes_gcm::aead::{generic_array::GenericArray, Aead, NewAead};
use aes_gcm::Aes256Gcm;
use curve25519_dalek::constants;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::SecretKey;
use ed25519_dalek::PUBLIC_KEY_LENGTH;
use hkdf::Hkdf;
use rand::{thread_rng, Rng};
use sha2::Sha256;
use std::convert::TryInto;

const AES_IV_LENGTH: usize = 12;
const AES_TAG_LENGTH: usize = 16;

/// Smallest possible ciphertext: an empty plaintext
pub const MIN_CIPHERTEXT_LENGTH: usize = PUBLIC_KEY_LENGTH + AES_IV_LENGTH + AES_TAG_LENGTH;

type AesKey = [u8; 32];
type SharedSecret = [u8; 32];

/// A ed25519 Public Key meant for use in ECIES
///
/// Neither it's PrivateKey nor should this public key be used for signing
/// or in any other protocol other than ECIES.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EciesPublicKey([u8; PUBLIC_KEY_LENGTH]);

impl EciesPublicKey {
    /// Convert this public key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0
    }

    /// View this public key as a byte array.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Construct a public key from a slice of bytes.
    ///
    /// Will return None if the bytes are not a valid curve point
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().ok()?;
        let pk = EciesPublicKey(bytes);
        pk.as_point().map(|_| pk)
    }

    /// Derive a public key from a private key
    pub fn from_secret(sk: &SecretKey) -> Self {
        let point = &Scalar::from_bits(sk.to_bytes()) * &constants::ED25519_BASEPOINT_TABLE;
        EciesPublicKey(point.compress().to_bytes())
    }

    /// Get the Edwards Point for this public key
    pub fn as_point(&self) -> Option<EdwardsPoint> {
        CompressedEdwardsY(self.0).decompress()
    }
}

impl AsRef<[u8]> for EciesPublicKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// ECIES over ed25519 with an HKDF-SHA256 derived AES-256-GCM key
#[derive(Copy, Clone, Debug, Default)]
pub struct EciesEd25519;

impl EncryptionProvider for EciesEd25519 {
    type PublicKey = EciesPublicKey;
    type SecretKey = SecretKey;

    fn generate_keypair(&self) -> KeyPair<EciesPublicKey, SecretKey> {
        let (secret, public) = generate_keypair();
        KeyPair { public, secret }
    }

    fn encrypt(&self, msg: &[u8], public: &EciesPublicKey) -> Result<Vec<u8>> {
        encrypt(public, msg)
    }

    fn decrypt(&self, ciphertext: &[u8], secret: &SecretKey) -> Result<Vec<u8>> {
        decrypt(secret, ciphertext)
    }
}

/// Generate a keypair, ready for use in ECIES
pub fn generate_keypair() -> (SecretKey, EciesPublicKey) {
    let mut csprng = rand::rngs::OsRng {};
    let ed25519_dalek::Keypair { public: _, secret } =
        ed25519_dalek::Keypair::generate(&mut csprng);
    let public = EciesPublicKey::from_secret(&secret);
    (secret, public)
}

/// Encrypt a message using ECIES, it can only be decrypted by the receiver's SecretKey.
pub fn encrypt(receiver_pub: &EciesPublicKey, msg: &[u8]) -> Result<Vec<u8>> {
    let receiver_point = receiver_pub.as_point().ok_or(Error::EncryptionFailed)?;
    if receiver_point.is_small_order() {
        return Err(Error::EncryptionFailed);
    }

    let (ephemeral_sk, ephemeral_pk) = generate_keypair();

    let aes_key = encapsulate(&ephemeral_sk, &receiver_point).ok_or(Error::EncryptionFailed)?;
    let encrypted = aes_encrypt(&aes_key, msg).ok_or(Error::EncryptionFailed)?;

    let mut cipher_text = Vec::with_capacity(PUBLIC_KEY_LENGTH + encrypted.len());
    cipher_text.extend(ephemeral_pk.to_bytes().iter());
    cipher_text.extend(encrypted);

    Ok(cipher_text)
}

/// Decrypt a ECIES encrypted ciphertext using the receiver's SecretKey.
pub fn decrypt(receiver_sec: &SecretKey, msg: &[u8]) -> Result<Vec<u8>> {
    if msg.len() < MIN_CIPHERTEXT_LENGTH {
        return Err(Error::DecryptionFailed);
    }

    let ephemeral_pk =
        EciesPublicKey::from_bytes(&msg[..PUBLIC_KEY_LENGTH]).ok_or(Error::DecryptionFailed)?;
    let encrypted = &msg[PUBLIC_KEY_LENGTH..];
    let aes_key = decapsulate(receiver_sec, &ephemeral_pk).ok_or(Error::DecryptionFailed)?;

    aes_decrypt(&aes_key, encrypted).ok_or(Error::DecryptionFailed)
}

fn hkdf_sha256(master: &[u8]) -> Option<AesKey> {
    let h = Hkdf::<Sha256>::new(None, master);
    let mut out = [0u8; 32];
    h.expand(&[], &mut out).ok()?;
    Some(out)
}

fn generate_shared(secret: &SecretKey, public: &EdwardsPoint) -> SharedSecret {
    let secret = Scalar::from_bits(secret.to_bytes());
    let shared_point = public * secret;
    shared_point.compress().to_bytes()
}

fn encapsulate(emphemeral_sk: &SecretKey, peer_point: &EdwardsPoint) -> Option<AesKey> {
    let shared_point = generate_shared(emphemeral_sk, peer_point);

    let emphemeral_pk = EciesPublicKey::from_secret(emphemeral_sk);

    let mut master = Vec::with_capacity(32 * 2);
    master.extend(emphemeral_pk.as_bytes().iter());
    master.extend(shared_point.iter());
    hkdf_sha256(master.as_slice())
}

fn decapsulate(sk: &SecretKey, emphemeral_pk: &EciesPublicKey) -> Option<AesKey> {
    let shared_point = generate_shared(sk, &emphemeral_pk.as_point()?);

    let mut master = Vec::with_capacity(32 * 2);
    master.extend(emphemeral_pk.as_bytes().iter());
    master.extend(shared_point.iter());

    hkdf_sha256(master.as_slice())
}

fn aes_encrypt(key: &AesKey, msg: &[u8]) -> Option<Vec<u8>> {
    let aead = Aes256Gcm::new(GenericArray::from_slice(key));

    let mut nonce = [0u8; AES_IV_LENGTH];
    thread_rng().fill(&mut nonce);
    let nonce = GenericArray::from_slice(&nonce);

    let ciphertext = aead.encrypt(nonce, msg).ok()?;

    let mut output = Vec::with_capacity(AES_IV_LENGTH + ciphertext.len());
    output.extend(nonce);
    output.extend(ciphertext);

    Some(output)
}

fn aes_decrypt(key: &AesKey, ciphertext: &[u8]) -> Option<Vec<u8>> {
    if ciphertext.len() < AES_IV_LENGTH + AES_TAG_LENGTH {
        return None;
    }

    let aead = Aes256Gcm::new(GenericArray::from_slice(key));

    let nonce = GenericArray::from_slice(&ciphertext[..AES_IV_LENGTH]);
    let encrypted = &ciphertext[AES_IV_LENGTH..];

    aead.decrypt(nonce, encrypted).ok()
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_shared() {
        let (emphemeral_sk, emphemeral_pk) = generate_keypair();
        let (peer_sk, peer_pk) = generate_keypair();

        let emphemeral_point = emphemeral_pk.as_point().unwrap();
        let peer_point = peer_pk.as_point().unwrap();

        assert_eq!(
            generate_shared(&emphemeral_sk, &peer_point),
            generate_shared(&peer_sk, &emphemeral_point)
        );

        // Make sure it fails when wrong keys used
        assert_ne!(
            generate_shared(&emphemeral_sk, &emphemeral_point),
            generate_shared(&peer_sk, &peer_point)
        )
    }

    #[test]
    fn test_encapsulation() {
        let (emphemeral_sk, emphemeral_pk) = generate_keypair();
        let (peer_sk, peer_pk) = generate_keypair();

        assert_eq!(
            encapsulate(&emphemeral_sk, &peer_pk.as_point().unwrap()),
            decapsulate(&peer_sk, &emphemeral_pk)
        )
    }

    #[test]
    fn test_aes() {
        let mut key = [0u8; 32];
        thread_rng().fill(&mut key);

        let plaintext = b"ONE VOTER ONE VOTE";
        let encrypted = aes_encrypt(&key, plaintext).unwrap();
        let decrypted = aes_decrypt(&key, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
        assert!(aes_decrypt(&key, &encrypted[..AES_IV_LENGTH]).is_none());
    }

    #[test]
    fn test_ecies_ed25519() {
        let (peer_sk, peer_pk) = generate_keypair();

        let plaintext = b"ONE VOTER ONE VOTE";

        let encrypted = encrypt(&peer_pk, plaintext).unwrap();
        let decrypted = decrypt(&peer_sk, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());

        // Test that it fails when using a bad secret key
        let (bad_sk, _) = generate_keypair();
        assert!(matches!(
            decrypt(&bad_sk, &encrypted),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn test_malformed_ciphertext() {
        let (peer_sk, peer_pk) = generate_keypair();
        let encrypted = encrypt(&peer_pk, b"").unwrap();
        assert_eq!(encrypted.len(), MIN_CIPHERTEXT_LENGTH);

        assert!(decrypt(&peer_sk, &encrypted).unwrap().is_empty());
        assert!(decrypt(&peer_sk, &encrypted[..MIN_CIPHERTEXT_LENGTH - 1]).is_err());
        assert!(decrypt(&peer_sk, &[4, 6, 8, 0]).is_err());
        assert!(decrypt(&peer_sk, &[]).is_err());

        // Every single-byte flip is rejected
        let encrypted = encrypt(&peer_pk, b"ballot").unwrap();
        for i in 0..encrypted.len() {
            let mut tampered = encrypted.clone();
            tampered[i] ^= 0x80;
            assert!(decrypt(&peer_sk, &tampered).is_err(), "flip at byte {}", i);
        }
    }

    #[test]
    fn test_invalid_receiver_key() {
        // The identity point has small order
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let pk = EciesPublicKey::from_bytes(&identity).unwrap();
        assert!(matches!(encrypt(&pk, b"x"), Err(Error::EncryptionFailed)));

        assert!(EciesPublicKey::from_bytes(&[0u8; 31]).is_none());
    }
}
