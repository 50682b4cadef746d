use crate::util::short_id;
use crate::*;
use log::debug;
use uuid::Uuid;

/// What the registration bureau knows about a voter
#[derive(Clone, Debug, PartialEq)]
pub struct VoterProfile<K> {
    pub full_name: String,
    pub is_eligible: bool,
    pub signature_public_key: K,
}

/// A voter
///
/// Registers with the bureau under their full name, then casts an anonymous ballot under a
/// freshly generated voter id.
pub struct Voter<S: SignatureProvider = Ed25519Signatures, E: EncryptionProvider = EciesEd25519>
{
    entity: SecuredEntity<S, E>,
    full_name: String,
    is_eligible: bool,
    voter_id: Option<Uuid>,
    registration_number: Option<Uuid>,
}

impl Voter {
    /// Create a voter with freshly generated ed25519 / ECIES keys
    pub fn new(full_name: impl Into<String>, is_eligible: bool) -> Self {
        Voter::with_entity(
            full_name,
            is_eligible,
            SecuredEntity::generate(Ed25519Signatures, EciesEd25519),
        )
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> Voter<S, E> {
    pub fn with_entity(
        full_name: impl Into<String>,
        is_eligible: bool,
        entity: SecuredEntity<S, E>,
    ) -> Self {
        Voter {
            entity,
            full_name: full_name.into(),
            is_eligible,
            voter_id: None,
            registration_number: None,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_eligible(&self) -> bool {
        self.is_eligible
    }

    /// The ephemeral voter id that will be placed on the next ballot
    pub fn voter_id(&self) -> Option<Uuid> {
        self.voter_id
    }

    pub fn registration_number(&self) -> Option<Uuid> {
        self.registration_number
    }

    pub fn signature_public_key(&self) -> &S::PublicKey {
        self.entity.signature_public_key()
    }

    pub fn encryption_public_key(&self) -> &E::PublicKey {
        self.entity.encryption_public_key()
    }

    /// The public record the registration bureau keeps for this voter
    pub fn profile(&self) -> VoterProfile<S::PublicKey> {
        VoterProfile {
            full_name: self.full_name.clone(),
            is_eligible: self.is_eligible,
            signature_public_key: self.signature_public_key().clone(),
        }
    }

    /// Build a registration request: our full name, signed, encrypted for the bureau
    pub fn prepare_registration_request(
        &self,
        bureau_encryption_public_key: &E::PublicKey,
    ) -> Result<Vec<u8>> {
        self.entity.seal(self.full_name.clone(), bureau_encryption_public_key)
    }

    /// Accept the bureau's encrypted response to a registration request.
    ///
    /// The registration number is only stored once the response decrypts, decodes and carries
    /// a valid bureau signature. A voter holds at most one registration number.
    pub fn accept_registration_number(
        &mut self,
        encrypted_response: &[u8],
        bureau_signature_public_key: &S::PublicKey,
    ) -> Result<()> {
        if self.registration_number.is_some() {
            return Err(Error::AlreadyRegistered);
        }

        let signed = self.entity.open::<Uuid>(encrypted_response)?;
        self.entity.verify_payload(&signed, bureau_signature_public_key)?;

        debug!("voter accepted registration number {}", short_id(&signed.data));
        self.registration_number = Some(signed.into_inner());
        Ok(())
    }

    /// Generate a fresh ephemeral voter id, replacing any previous one
    pub fn generate_ephemeral_id(&mut self) -> Uuid {
        let voter_id = Uuid::new_v4();
        self.voter_id = Some(voter_id);
        voter_id
    }

    /// Build a ballot for `candidate_id`, sign it and encrypt it for the commission
    pub fn prepare_ballot(
        &self,
        candidate_id: i32,
        commission_encryption_public_key: &E::PublicKey,
    ) -> Result<Vec<u8>> {
        let registration_id = self
            .registration_number
            .ok_or(Error::MissingRegistrationNumber)?;
        let voter_id = self.voter_id.ok_or(Error::MissingVoterId)?;

        let ballot = Ballot::new(voter_id, registration_id, candidate_id);
        self.entity.seal(ballot, commission_encryption_public_key)
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> std::fmt::Debug for Voter<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Voter")
            .field("full_name", &self.full_name)
            .field("is_eligible", &self.is_eligible)
            .field("voter_id", &self.voter_id)
            .field("registration_number", &self.registration_number)
            .finish()
    }
}
