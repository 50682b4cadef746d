//! Asymmetric primitives consumed by the protocol.
//!
//! The protocol only depends on the [`SignatureProvider`] and [`EncryptionProvider`] traits.
//! [`Ed25519Signatures`] and [`EciesEd25519`] are the default implementations.

use crate::*;
use ed25519_dalek::ExpandedSecretKey;
use ed25519_dalek::Keypair;
use ed25519_dalek::PublicKey;
use ed25519_dalek::SecretKey;
use ed25519_dalek::Signature;
use std::convert::TryFrom;
use std::fmt::Debug;

/// A public / private key pair for a given scheme
pub struct KeyPair<P, S> {
    pub public: P,
    pub secret: S,
}

/// A digital signature scheme
pub trait SignatureProvider: Clone + Send + Sync {
    type PublicKey: Clone + PartialEq + Debug + Send + Sync;
    type SecretKey: Send + Sync;

    /// Every signature produced by this scheme has exactly this many bytes
    const SIGNATURE_LENGTH: usize;

    fn generate_keypair(&self) -> KeyPair<Self::PublicKey, Self::SecretKey>;

    fn sign(&self, msg: &[u8], keypair: &KeyPair<Self::PublicKey, Self::SecretKey>) -> Vec<u8>;

    fn verify(&self, msg: &[u8], signature: &[u8], public: &Self::PublicKey) -> bool;
}

/// An asymmetric encryption scheme
pub trait EncryptionProvider: Clone + Send + Sync {
    type PublicKey: Clone + PartialEq + Debug + Send + Sync;
    type SecretKey: Send + Sync;

    fn generate_keypair(&self) -> KeyPair<Self::PublicKey, Self::SecretKey>;

    /// Fails with [`Error::EncryptionFailed`] if the public key is unusable
    fn encrypt(&self, msg: &[u8], public: &Self::PublicKey) -> Result<Vec<u8>>;

    /// Fails with [`Error::DecryptionFailed`] on a corrupt ciphertext or the wrong key
    fn decrypt(&self, ciphertext: &[u8], secret: &Self::SecretKey) -> Result<Vec<u8>>;
}

/// Ed25519 signatures, verified strictly
#[derive(Copy, Clone, Debug, Default)]
pub struct Ed25519Signatures;

impl SignatureProvider for Ed25519Signatures {
    type PublicKey = PublicKey;
    type SecretKey = SecretKey;

    const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

    fn generate_keypair(&self) -> KeyPair<PublicKey, SecretKey> {
        let mut csprng = rand::rngs::OsRng {};
        let Keypair { public, secret } = Keypair::generate(&mut csprng);
        KeyPair { public, secret }
    }

    fn sign(&self, msg: &[u8], keypair: &KeyPair<PublicKey, SecretKey>) -> Vec<u8> {
        let expanded: ExpandedSecretKey = (&keypair.secret).into();
        expanded.sign(msg, &keypair.public).to_bytes().to_vec()
    }

    fn verify(&self, msg: &[u8], signature: &[u8], public: &PublicKey) -> bool {
        match Signature::try_from(signature) {
            Ok(signature) => public.verify_strict(msg, &signature).is_ok(),
            Err(_) => false,
        }
    }
}
