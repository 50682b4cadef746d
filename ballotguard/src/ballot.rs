use uuid::Uuid;

/// A cast ballot
///
/// `voter_id` is an ephemeral identifier generated right before casting and is not linked to the
/// voter's identity. `registration_id` is the one-time credential issued by the registration
/// bureau.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ballot {
    pub voter_id: Uuid,
    pub registration_id: Uuid,
    pub candidate_id: i32,
}

impl Ballot {
    pub fn new(voter_id: Uuid, registration_id: Uuid, candidate_id: i32) -> Self {
        Ballot {
            voter_id,
            registration_id,
            candidate_id,
        }
    }
}

/// A value paired with a signature over its canonical binary encoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPayload<T> {
    pub data: T,
    pub signature: Vec<u8>,
}

impl<T> SignedPayload<T> {
    pub fn new(data: T, signature: Vec<u8>) -> Self {
        SignedPayload { data, signature }
    }

    /// Get the inner unsigned value
    pub fn inner(&self) -> &T {
        &self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> AsRef<T> for SignedPayload<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}
