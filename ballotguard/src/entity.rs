use crate::*;

/// The capability every protocol participant is built on: one signature key pair and one
/// encryption key pair, bound to the providers that operate on them.
///
/// Private keys never leave this struct. Participants embed a `SecuredEntity` and only reach
/// the keys through the operations below.
pub struct SecuredEntity<S: SignatureProvider, E: EncryptionProvider> {
    signatures: S,
    encryption: E,
    signature_keys: KeyPair<S::PublicKey, S::SecretKey>,
    encryption_keys: KeyPair<E::PublicKey, E::SecretKey>,
}

impl<S: SignatureProvider, E: EncryptionProvider> SecuredEntity<S, E> {
    /// Create an entity with freshly generated key pairs
    pub fn generate(signatures: S, encryption: E) -> Self {
        let signature_keys = signatures.generate_keypair();
        let encryption_keys = encryption.generate_keypair();
        SecuredEntity::from_keys(signatures, encryption, signature_keys, encryption_keys)
    }

    pub fn from_keys(
        signatures: S,
        encryption: E,
        signature_keys: KeyPair<S::PublicKey, S::SecretKey>,
        encryption_keys: KeyPair<E::PublicKey, E::SecretKey>,
    ) -> Self {
        SecuredEntity {
            signatures,
            encryption,
            signature_keys,
            encryption_keys,
        }
    }

    pub fn signature_public_key(&self) -> &S::PublicKey {
        &self.signature_keys.public
    }

    pub fn encryption_public_key(&self) -> &E::PublicKey {
        &self.encryption_keys.public
    }

    pub(crate) fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.signatures.sign(msg, &self.signature_keys)
    }

    pub(crate) fn verify_signature(
        &self,
        msg: &[u8],
        signature: &[u8],
        peer_public_key: &S::PublicKey,
    ) -> bool {
        self.signatures.verify(msg, signature, peer_public_key)
    }

    pub(crate) fn encrypt_for(&self, msg: &[u8], peer_public_key: &E::PublicKey) -> Result<Vec<u8>> {
        self.encryption.encrypt(msg, peer_public_key)
    }

    pub(crate) fn decrypt_own(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.encryption.decrypt(ciphertext, &self.encryption_keys.secret)
    }

    /// Sign the canonical encoding of `data`
    pub(crate) fn sign_payload<T: Codec>(&self, data: T) -> SignedPayload<T> {
        let signature = self.sign(&data.encode());
        SignedPayload::new(data, signature)
    }

    /// Sign `data` and encrypt the signed payload for a peer
    pub(crate) fn seal<T: Codec>(&self, data: T, peer_public_key: &E::PublicKey) -> Result<Vec<u8>> {
        let signed = self.sign_payload(data);
        self.encrypt_for(&signed.encode(), peer_public_key)
    }

    /// Decrypt a message addressed to this entity and decode it as a signed payload.
    ///
    /// The signature is not checked here: the caller decides whose key it must verify against.
    pub(crate) fn open<T: Codec>(&self, ciphertext: &[u8]) -> Result<SignedPayload<T>> {
        let plaintext = self.decrypt_own(ciphertext)?;
        Ok(SignedPayload::decode(&plaintext, S::SIGNATURE_LENGTH)?)
    }

    /// Check a payload's signature against a peer's public signing key
    pub(crate) fn verify_payload<T: Codec>(
        &self,
        payload: &SignedPayload<T>,
        peer_public_key: &S::PublicKey,
    ) -> Result<()> {
        if self.verify_signature(&payload.data_bytes(), &payload.signature, peer_public_key) {
            Ok(())
        } else {
            Err(Error::SignatureInvalid)
        }
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> std::fmt::Debug for SecuredEntity<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SecuredEntity")
            .field("signature_public_key", self.signature_public_key())
            .field("encryption_public_key", self.encryption_public_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entity() -> SecuredEntity<Ed25519Signatures, EciesEd25519> {
        SecuredEntity::generate(Ed25519Signatures, EciesEd25519)
    }

    #[test]
    fn seal_and_open() {
        let alice = entity();
        let bob = entity();

        let id = Uuid::new_v4();
        let sealed = alice.seal(id, bob.encryption_public_key()).unwrap();

        let opened = bob.open::<Uuid>(&sealed).unwrap();
        assert_eq!(opened.data, id);
        bob.verify_payload(&opened, alice.signature_public_key()).unwrap();

        // Signed by alice, so bob's own key must not verify it
        assert!(matches!(
            bob.verify_payload(&opened, bob.signature_public_key()),
            Err(Error::SignatureInvalid)
        ));

        // Only bob can open it
        assert!(matches!(
            alice.open::<Uuid>(&sealed),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn open_rejects_wrong_shape() {
        let alice = entity();
        let bob = entity();

        let sealed = alice
            .seal("Ann".to_owned(), bob.encryption_public_key())
            .unwrap();
        assert!(matches!(
            bob.open::<Ballot>(&sealed),
            Err(Error::MalformedEncoding(_))
        ));

        let garbage = alice
            .encrypt_for(&[4, 6, 8, 0], bob.encryption_public_key())
            .unwrap();
        assert!(matches!(
            bob.open::<Uuid>(&garbage),
            Err(Error::MalformedEncoding(_))
        ));
    }

    #[test]
    fn debug_hides_secrets() {
        let alice = entity();
        let debug = format!("{:?}", alice);
        assert!(debug.contains("signature_public_key"));
        assert!(!debug.contains("secret"));
    }
}
