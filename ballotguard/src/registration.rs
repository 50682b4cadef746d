use crate::util::{lock, short_id};
use crate::*;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::sync::Mutex;
use uuid::Uuid;

/// Registration ids still entitled to vote, mapped to the signing key of the voter they were
/// issued to. Produced by [`RegistrationBureau::close_registration`] and consumed by the
/// [`ElectionCommission`].
#[derive(Clone, Debug, PartialEq)]
pub struct AllowList<K> {
    entries: IndexMap<Uuid, K>,
}

impl<K> AllowList<K> {
    pub fn get(&self, registration_id: &Uuid) -> Option<&K> {
        self.entries.get(registration_id)
    }

    pub fn contains(&self, registration_id: &Uuid) -> bool {
        self.entries.contains_key(registration_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &K)> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> IndexMap<Uuid, K> {
        self.entries
    }
}

impl<K> std::iter::FromIterator<(Uuid, K)> for AllowList<K> {
    fn from_iter<I: IntoIterator<Item = (Uuid, K)>>(iter: I) -> Self {
        AllowList {
            entries: iter.into_iter().collect(),
        }
    }
}

struct RollEntry<K> {
    profile: VoterProfile<K>,
    registration_id: Option<Uuid>,
}

struct Roll<K> {
    voters: IndexMap<String, RollEntry<K>>,
    closed: bool,
}

/// The registration bureau
///
/// Issues one registration id to each eligible voter on its roll, in response to a request
/// signed by that voter. Registration is open until [`close_registration`] is called, which
/// hands the issued ids over as an [`AllowList`].
///
/// The bureau is `Sync`: every request runs its whole validation pipeline under one lock, so
/// concurrent requests for the same voter cannot both be issued an id.
///
/// Voters are identified by full name and the request carries no challenge, so a captured
/// request can be replayed, possibly with a different response key. Whichever copy arrives
/// first is issued the id and every later one fails with `AlreadyRegistered`. The id is bound
/// to the voter's signing key, so a ballot cast with it must still be signed by that voter.
///
/// [`close_registration`]: RegistrationBureau::close_registration
pub struct RegistrationBureau<
    S: SignatureProvider = Ed25519Signatures,
    E: EncryptionProvider = EciesEd25519,
> {
    entity: SecuredEntity<S, E>,
    roll: Mutex<Roll<S::PublicKey>>,
}

impl RegistrationBureau {
    /// Create a bureau with freshly generated ed25519 / ECIES keys
    pub fn new(
        voters: impl IntoIterator<Item = VoterProfile<ed25519_dalek::PublicKey>>,
    ) -> Result<Self> {
        RegistrationBureau::with_entity(
            SecuredEntity::generate(Ed25519Signatures, EciesEd25519),
            voters,
        )
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> RegistrationBureau<S, E> {
    /// Create a bureau for the given voters. Full names must be unique.
    pub fn with_entity(
        entity: SecuredEntity<S, E>,
        voters: impl IntoIterator<Item = VoterProfile<S::PublicKey>>,
    ) -> Result<Self> {
        let mut roll = IndexMap::new();
        for profile in voters {
            if roll.contains_key(&profile.full_name) {
                return Err(Error::DuplicateVoter(profile.full_name));
            }
            roll.insert(
                profile.full_name.clone(),
                RollEntry {
                    profile,
                    registration_id: None,
                },
            );
        }

        Ok(RegistrationBureau {
            entity,
            roll: Mutex::new(Roll {
                voters: roll,
                closed: false,
            }),
        })
    }

    pub fn signature_public_key(&self) -> &S::PublicKey {
        self.entity.signature_public_key()
    }

    pub fn encryption_public_key(&self) -> &E::PublicKey {
        self.entity.encryption_public_key()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.roll).closed
    }

    /// Number of voters on the roll
    pub fn voter_count(&self) -> usize {
        lock(&self.roll).voters.len()
    }

    /// Number of registration ids issued so far
    pub fn registered_count(&self) -> usize {
        lock(&self.roll)
            .voters
            .values()
            .filter(|entry| entry.registration_id.is_some())
            .count()
    }

    pub fn is_registered(&self, full_name: &str) -> bool {
        lock(&self.roll)
            .voters
            .get(full_name)
            .map_or(false, |entry| entry.registration_id.is_some())
    }

    /// Handle an encrypted, signed registration request.
    ///
    /// Returns the new registration id, signed by the bureau and encrypted for
    /// `voter_encryption_public_key`. The id is only recorded once every check has passed and
    /// the response has been sealed.
    pub fn request_registration_number(
        &self,
        encrypted_request: &[u8],
        voter_encryption_public_key: &E::PublicKey,
    ) -> Result<Vec<u8>> {
        let mut roll = lock(&self.roll);

        let result = self.issue(&mut roll, encrypted_request, voter_encryption_public_key);
        if let Err(e) = &result {
            warn!("registration request rejected: {}", e);
        }
        result
    }

    fn issue(
        &self,
        roll: &mut Roll<S::PublicKey>,
        encrypted_request: &[u8],
        voter_encryption_public_key: &E::PublicKey,
    ) -> Result<Vec<u8>> {
        if roll.closed {
            return Err(Error::RegistrationClosed);
        }

        let signed_name = self.entity.open::<String>(encrypted_request)?;

        let entry = roll
            .voters
            .get_mut(&signed_name.data)
            .ok_or(Error::VoterNotFound)?;

        if !entry.profile.is_eligible {
            return Err(Error::NotEligible);
        }

        self.entity
            .verify_payload(&signed_name, &entry.profile.signature_public_key)?;

        if entry.registration_id.is_some() {
            return Err(Error::AlreadyRegistered);
        }

        let registration_id = Uuid::new_v4();
        let response = self
            .entity
            .seal(registration_id, voter_encryption_public_key)?;

        entry.registration_id = Some(registration_id);
        info!("issued registration number {}", short_id(&registration_id));

        Ok(response)
    }

    /// Close registration and hand over every issued id with its voter's signing key.
    ///
    /// Calling this again returns the same allow list: no ids can be issued once closed.
    pub fn close_registration(&self) -> AllowList<S::PublicKey> {
        let mut roll = lock(&self.roll);
        if !roll.closed {
            roll.closed = true;
            info!("registration closed");
        } else {
            debug!("registration already closed");
        }

        roll.voters
            .values()
            .filter_map(|entry| {
                entry
                    .registration_id
                    .map(|id| (id, entry.profile.signature_public_key.clone()))
            })
            .collect()
    }
}

impl<S: SignatureProvider, E: EncryptionProvider> std::fmt::Debug for RegistrationBureau<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("RegistrationBureau")
            .field("entity", &self.entity)
            .field("voters", &self.voter_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
