use crate::util::{lock, short_id};
use crate::*;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::sync::Mutex;
use uuid::Uuid;

struct BallotBox<K> {
    allow_list: IndexMap<Uuid, K>,
    results: VotingResults,
    completed: bool,
}

/// The election commission
///
/// Accepts encrypted, signed ballots from registered voters and tallies them. Each registration
/// id on the allow list can be used for exactly one ballot: it is removed in the same step that
/// counts the vote.
pub struct ElectionCommission<
    S: SignatureProvider = Ed25519Signatures,
    E: EncryptionProvider = EciesEd25519,
> {
    entity: SecuredEntity<S, E>,
    ballot_box: Mutex<BallotBox<S::PublicKey>>,
}

impl ElectionCommission {
    /// Create a commission with freshly generated ed25519 / ECIES keys
    pub fn new(
        candidates: impl IntoIterator<Item = Candidate>,
        allow_list: AllowList<ed25519_dalek::PublicKey>,
    ) -> Result<Self> {
        ElectionCommission::with_entity(
            SecuredEntity::generate(Ed25519Signatures, EciesEd25519),
            candidates,
            allow_list,
        )
    }

    pub fn from_config(
        config: &ElectionConfig,
        allow_list: AllowList<ed25519_dalek::PublicKey>,
    ) -> Result<Self> {
        ElectionCommission::new(config.candidates.iter().cloned(), allow_list)
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> ElectionCommission<S, E> {
    /// Create a commission. Candidate ids must be unique.
    pub fn with_entity(
        entity: SecuredEntity<S, E>,
        candidates: impl IntoIterator<Item = Candidate>,
        allow_list: AllowList<S::PublicKey>,
    ) -> Result<Self> {
        let results = VotingResults::new(candidates)?;
        Ok(ElectionCommission {
            entity,
            ballot_box: Mutex::new(BallotBox {
                allow_list: allow_list.into_entries(),
                results,
                completed: false,
            }),
        })
    }

    pub fn signature_public_key(&self) -> &S::PublicKey {
        self.entity.signature_public_key()
    }

    pub fn encryption_public_key(&self) -> &E::PublicKey {
        self.entity.encryption_public_key()
    }

    pub fn is_completed(&self) -> bool {
        lock(&self.ballot_box).completed
    }

    /// Number of registration ids that have not voted yet
    pub fn remaining_voters(&self) -> usize {
        lock(&self.ballot_box).allow_list.len()
    }

    /// Whether `registration_id` may still cast a ballot
    pub fn is_allowed(&self, registration_id: &Uuid) -> bool {
        lock(&self.ballot_box).allow_list.contains_key(registration_id)
    }

    /// Snapshot of the tally and audit trail
    pub fn results(&self) -> VotingResults {
        lock(&self.ballot_box).results.clone()
    }

    /// Accept an encrypted, signed ballot.
    ///
    /// Nothing changes unless the ballot decrypts, decodes, carries an unused registration id,
    /// is signed by the voter that id was issued to, has a voter id and names a known
    /// candidate.
    pub fn accept_vote(&self, encrypted_signed_ballot: &[u8]) -> Result<()> {
        let mut ballot_box = lock(&self.ballot_box);

        let result = self.cast(&mut ballot_box, encrypted_signed_ballot);
        if let Err(e) = &result {
            warn!("ballot rejected: {}", e);
        }
        result
    }

    fn cast(&self, ballot_box: &mut BallotBox<S::PublicKey>, encrypted: &[u8]) -> Result<()> {
        if ballot_box.completed {
            return Err(Error::VotingCompleted);
        }

        let signed_ballot = self.entity.open::<Ballot>(encrypted)?;
        let ballot = signed_ballot.data;

        let voter_public_key = ballot_box
            .allow_list
            .get(&ballot.registration_id)
            .ok_or(Error::VoterNotRegistered)?;

        self.entity.verify_payload(&signed_ballot, voter_public_key)?;

        if ballot.voter_id.is_nil() {
            return Err(Error::InvalidBallot);
        }

        if !ballot_box.results.contains_candidate(ballot.candidate_id) {
            return Err(Error::CandidateNotFound(ballot.candidate_id));
        }

        ballot_box.allow_list.swap_remove(&ballot.registration_id);
        ballot_box.results.record(&ballot);
        info!(
            "accepted ballot for registration number {}",
            short_id(&ballot.registration_id)
        );

        Ok(())
    }

    /// Stop accepting ballots. Calling this again has no further effect.
    pub fn complete_voting(&self) {
        let mut ballot_box = lock(&self.ballot_box);
        if ballot_box.completed {
            debug!("voting already completed");
            return;
        }
        ballot_box.completed = true;
        info!(
            "voting completed: {} ballots accepted, {} registrations unused",
            ballot_box.results.audit_trail.len(),
            ballot_box.allow_list.len()
        );
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> std::fmt::Debug for ElectionCommission<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ElectionCommission")
            .field("entity", &self.entity)
            .field("remaining_voters", &self.remaining_voters())
            .field("completed", &self.is_completed())
            .finish()
    }
}
