use thiserror::Error;

/// Crate-wide result type
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error types
///
/// Every protocol operation fails with exactly one of these. Validation failures never leave
/// partially applied state behind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ballotguard: registration is closed")]
    RegistrationClosed,

    #[error("ballotguard: voting is already completed")]
    VotingCompleted,

    #[error("ballotguard: voter was not found")]
    VoterNotFound,

    #[error("ballotguard: voter is not eligible to vote")]
    NotEligible,

    #[error("ballotguard: voter has already been issued a registration number")]
    AlreadyRegistered,

    #[error("ballotguard: signature is not authentic")]
    SignatureInvalid,

    #[error("ballotguard: message could not be decrypted")]
    DecryptionFailed,

    #[error("ballotguard: message could not be encrypted for the given public key")]
    EncryptionFailed,

    #[error("ballotguard: malformed encoding: {0}")]
    MalformedEncoding(#[from] CodecError),

    #[error("ballotguard: voter has not registered or has already cast a vote")]
    VoterNotRegistered,

    #[error("ballotguard: ballot is invalid - voter id cannot be empty")]
    InvalidBallot,

    #[error("ballotguard: candidate {0} was not found")]
    CandidateNotFound(i32),

    #[error("ballotguard: unsupported message type tag {0:#04x}")]
    UnsupportedType(u8),

    #[error("ballotguard: voter has no registration number")]
    MissingRegistrationNumber,

    #[error("ballotguard: voter has no ephemeral voter id")]
    MissingVoterId,

    #[error("ballotguard: duplicate candidate id {0}")]
    DuplicateCandidate(i32),

    #[error("ballotguard: duplicate voter {0}")]
    DuplicateVoter(String),

    #[error("ballotguard: error parsing election configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Binary decoding errors, wrapped by [`Error::MalformedEncoding`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("input truncated: needed {needed} bytes, found {found}")]
    Truncated { needed: usize, found: usize },

    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("wrong length: expected {expected} bytes, found {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}
