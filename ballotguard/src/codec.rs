//! Binary wire encoding for protocol messages.
//!
//! All encodings are fixed-layout with no padding. Integers are big-endian and UUIDs are their
//! 16 raw RFC 4122 bytes.
//!
//! | shape              | layout                                                        |
//! |--------------------|---------------------------------------------------------------|
//! | `Uuid`             | 16 bytes                                                      |
//! | `Ballot`           | voter id (16) \|\| registration id (16) \|\| candidate id (i32, 4) |
//! | `String`           | byte length (u32, 4) \|\| UTF-8 bytes                          |
//! | `SignedPayload<T>` | encode(T) \|\| signature (fixed per signature scheme)          |
//!
//! A signed payload carries no length prefix for its signature: decoding reads exactly the width
//! of `T` and requires the remainder to be exactly the signature scheme's published length.

use crate::*;
use num_enum::TryFromPrimitive;
use std::convert::TryInto;
use uuid::Uuid;

pub const UUID_LENGTH: usize = 16;
pub const CANDIDATE_ID_LENGTH: usize = 4;
pub const BALLOT_LENGTH: usize = UUID_LENGTH * 2 + CANDIDATE_ID_LENGTH;
pub const STRING_PREFIX_LENGTH: usize = 4;

/// A shape with a canonical binary encoding
///
/// This trait should be considered sealed: the set of wire shapes is closed.
pub trait Codec: Sized {
    /// Encoded width in bytes, or `None` when the width is carried by a length prefix
    const ENCODED_LEN: Option<usize>;

    fn encode_to(&self, out: &mut Vec<u8>);

    fn decode_from(reader: &mut Reader) -> Result<Self, CodecError>;

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_LEN.unwrap_or(32));
        self.encode_to(&mut out);
        out
    }
}

/// Encode a value
pub fn encode<T: Codec>(value: &T) -> Vec<u8> {
    value.encode()
}

/// Decode a value, requiring that the whole input is consumed
pub fn decode<T: Codec>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut reader = Reader::new(bytes);
    let value = T::decode_from(&mut reader)?;
    reader.finish()?;
    Ok(value)
}

/// A cursor over an input buffer. Never reads out of bounds.
pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.bytes.len() < len {
            return Err(CodecError::Truncated {
                needed: len,
                found: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let slice = self.take(N)?;
        slice.try_into().map_err(|_| CodecError::WrongLength {
            expected: N,
            found: slice.len(),
        })
    }

    /// Take everything that is left
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = self.bytes;
        self.bytes = &[];
        rest
    }

    pub fn finish(self) -> Result<(), CodecError> {
        match self.bytes.len() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

impl Codec for Uuid {
    const ENCODED_LEN: Option<usize> = Some(UUID_LENGTH);

    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn decode_from(reader: &mut Reader) -> Result<Self, CodecError> {
        let bytes: [u8; UUID_LENGTH] = reader.take_array()?;
        Ok(Uuid::from_bytes(bytes))
    }
}

impl Codec for Ballot {
    const ENCODED_LEN: Option<usize> = Some(BALLOT_LENGTH);

    fn encode_to(&self, out: &mut Vec<u8>) {
        self.voter_id.encode_to(out);
        self.registration_id.encode_to(out);
        out.extend_from_slice(&self.candidate_id.to_be_bytes());
    }

    fn decode_from(reader: &mut Reader) -> Result<Self, CodecError> {
        let voter_id = Uuid::decode_from(reader)?;
        let registration_id = Uuid::decode_from(reader)?;
        let candidate_id = i32::from_be_bytes(reader.take_array()?);
        Ok(Ballot {
            voter_id,
            registration_id,
            candidate_id,
        })
    }
}

impl Codec for String {
    const ENCODED_LEN: Option<usize> = None;

    fn encode_to(&self, out: &mut Vec<u8>) {
        // Identities are names, far below 4 GiB
        out.extend_from_slice(&(self.len() as u32).to_be_bytes());
        out.extend_from_slice(self.as_bytes());
    }

    fn decode_from(reader: &mut Reader) -> Result<Self, CodecError> {
        let len = u32::from_be_bytes(reader.take_array()?) as usize;
        let bytes = reader.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl<T: Codec> SignedPayload<T> {
    /// Encoded width for a given signature length, if `T` is fixed-width
    pub fn encoded_len(signature_len: usize) -> Option<usize> {
        T::ENCODED_LEN.map(|len| len + signature_len)
    }

    /// The canonical bytes the signature is computed over
    pub fn data_bytes(&self) -> Vec<u8> {
        self.data.encode()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(T::ENCODED_LEN.unwrap_or(32) + self.signature.len());
        self.data.encode_to(&mut out);
        out.extend_from_slice(&self.signature);
        out
    }

    pub fn decode(bytes: &[u8], signature_len: usize) -> Result<Self, CodecError> {
        if let Some(expected) = Self::encoded_len(signature_len) {
            if bytes.len() != expected {
                return Err(CodecError::WrongLength {
                    expected,
                    found: bytes.len(),
                });
            }
        }

        let mut reader = Reader::new(bytes);
        let data = T::decode_from(&mut reader)?;
        let signature = reader.rest();
        if signature.len() != signature_len {
            return Err(CodecError::WrongLength {
                expected: signature_len,
                found: signature.len(),
            });
        }

        Ok(SignedPayload {
            data,
            signature: signature.to_vec(),
        })
    }
}

/// Wire message tag
#[derive(TryFromPrimitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Ballot = 1,
    SignedBallot = 2,
    RegistrationId = 3,
    SignedRegistrationId = 4,
    VoterName = 5,
    SignedVoterName = 6,
}

impl MessageKind {
    /// Resolve a tag byte
    pub fn from_tag(tag: u8) -> Result<Self, Error> {
        MessageKind::try_from_primitive(tag).map_err(|_| Error::UnsupportedType(tag))
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            MessageKind::Ballot => "ballot",
            MessageKind::SignedBallot => "signed_ballot",
            MessageKind::RegistrationId => "registration_id",
            MessageKind::SignedRegistrationId => "signed_registration_id",
            MessageKind::VoterName => "voter_name",
            MessageKind::SignedVoterName => "signed_voter_name",
        };
        write!(f, "{}", name)
    }
}

/// Every message shape that crosses the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Ballot(Ballot),
    SignedBallot(SignedPayload<Ballot>),
    RegistrationId(Uuid),
    SignedRegistrationId(SignedPayload<Uuid>),
    VoterName(String),
    SignedVoterName(SignedPayload<String>),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Ballot(_) => MessageKind::Ballot,
            Message::SignedBallot(_) => MessageKind::SignedBallot,
            Message::RegistrationId(_) => MessageKind::RegistrationId,
            Message::SignedRegistrationId(_) => MessageKind::SignedRegistrationId,
            Message::VoterName(_) => MessageKind::VoterName,
            Message::SignedVoterName(_) => MessageKind::SignedVoterName,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Ballot(m) => m.encode(),
            Message::SignedBallot(m) => m.encode(),
            Message::RegistrationId(m) => m.encode(),
            Message::SignedRegistrationId(m) => m.encode(),
            Message::VoterName(m) => m.encode(),
            Message::SignedVoterName(m) => m.encode(),
        }
    }

    /// Decode a message of a known kind
    ///
    /// `signature_len` is only consulted for signed shapes.
    pub fn decode(kind: MessageKind, bytes: &[u8], signature_len: usize) -> Result<Self, Error> {
        let message = match kind {
            MessageKind::Ballot => Message::Ballot(decode(bytes)?),
            MessageKind::SignedBallot => {
                Message::SignedBallot(SignedPayload::decode(bytes, signature_len)?)
            }
            MessageKind::RegistrationId => Message::RegistrationId(decode(bytes)?),
            MessageKind::SignedRegistrationId => {
                Message::SignedRegistrationId(SignedPayload::decode(bytes, signature_len)?)
            }
            MessageKind::VoterName => Message::VoterName(decode(bytes)?),
            MessageKind::SignedVoterName => {
                Message::SignedVoterName(SignedPayload::decode(bytes, signature_len)?)
            }
        };
        Ok(message)
    }

    /// Decode a message framed as `tag || encoding`
    pub fn from_tagged_bytes(bytes: &[u8], signature_len: usize) -> Result<Self, Error> {
        let (tag, body) = bytes.split_first().ok_or(CodecError::Truncated {
            needed: 1,
            found: 0,
        })?;
        let kind = MessageKind::from_tag(*tag)?;
        Message::decode(kind, body, signature_len)
    }

    /// Encode as `tag || encoding`
    pub fn to_tagged_bytes(&self) -> Vec<u8> {
        let body = self.encode();
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(self.kind().tag());
        out.extend(body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIG_LEN: usize = 64;

    fn sample_ballot() -> Ballot {
        Ballot::new(Uuid::new_v4(), Uuid::new_v4(), -7)
    }

    #[test]
    fn ballot_layout() {
        let voter_id = Uuid::from_bytes([0x11; 16]);
        let registration_id = Uuid::from_bytes([0x22; 16]);
        let ballot = Ballot::new(voter_id, registration_id, 0x0102_0304);

        let bytes = encode(&ballot);
        assert_eq!(bytes.len(), BALLOT_LENGTH);
        assert_eq!(&bytes[..16], &[0x11; 16]);
        assert_eq!(&bytes[16..32], &[0x22; 16]);
        assert_eq!(&bytes[32..], &[0x01, 0x02, 0x03, 0x04]);

        assert_eq!(decode::<Ballot>(&bytes).unwrap(), ballot);
    }

    #[test]
    fn negative_candidate_id() {
        let ballot = Ballot::new(Uuid::new_v4(), Uuid::new_v4(), -1);
        let bytes = encode(&ballot);
        assert_eq!(&bytes[32..], &[0xff; 4]);
        assert_eq!(decode::<Ballot>(&bytes).unwrap().candidate_id, -1);
    }

    #[test]
    fn uuid_is_raw_bytes() {
        let id = Uuid::new_v4();
        let bytes = encode(&id);
        assert_eq!(bytes.as_slice(), id.as_bytes());
        assert_eq!(decode::<Uuid>(&bytes).unwrap(), id);
    }

    #[test]
    fn string_is_length_prefixed() {
        let name = "Zoë Ann".to_owned();
        let bytes = encode(&name);
        assert_eq!(&bytes[..4], &(name.len() as u32).to_be_bytes());
        assert_eq!(&bytes[4..], name.as_bytes());
        assert_eq!(decode::<String>(&bytes).unwrap(), name);

        assert_eq!(decode::<String>(&encode(&String::new())).unwrap(), "");
    }

    #[test]
    fn signed_payload_splits_at_data_width() {
        let ballot = sample_ballot();
        let signed = SignedPayload::new(ballot, vec![0xab; SIG_LEN]);

        let bytes = signed.encode();
        assert_eq!(bytes.len(), BALLOT_LENGTH + SIG_LEN);
        assert_eq!(
            SignedPayload::<Ballot>::encoded_len(SIG_LEN),
            Some(BALLOT_LENGTH + SIG_LEN)
        );
        assert_eq!(&bytes[..BALLOT_LENGTH], encode(&ballot).as_slice());

        let decoded = SignedPayload::<Ballot>::decode(&bytes, SIG_LEN).unwrap();
        assert_eq!(decoded, signed);

        let name = SignedPayload::new("Ann".to_owned(), vec![7; SIG_LEN]);
        let decoded = SignedPayload::<String>::decode(&name.encode(), SIG_LEN).unwrap();
        assert_eq!(decoded, name);
        assert_eq!(SignedPayload::<String>::encoded_len(SIG_LEN), None);
    }

    #[test]
    fn malformed_lengths_are_rejected() {
        assert!(matches!(
            decode::<Uuid>(&[0; 15]),
            Err(CodecError::Truncated { needed: 16, found: 15 })
        ));
        assert!(matches!(
            decode::<Uuid>(&[0; 17]),
            Err(CodecError::TrailingBytes(1))
        ));
        assert!(decode::<Ballot>(&[4, 6, 8, 0]).is_err());
        assert!(decode::<Ballot>(&[]).is_err());

        // Length prefix pointing past the end of the input
        let mut bytes = 100u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"Ann");
        assert!(matches!(
            decode::<String>(&bytes),
            Err(CodecError::Truncated { needed: 100, found: 3 })
        ));

        let mut bytes = 2u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0xc3, 0x28]);
        assert_eq!(decode::<String>(&bytes), Err(CodecError::InvalidUtf8));

        let signed = SignedPayload::new(Uuid::new_v4(), vec![1; SIG_LEN]).encode();
        assert!(SignedPayload::<Uuid>::decode(&signed[..signed.len() - 1], SIG_LEN).is_err());
        assert!(SignedPayload::<Uuid>::decode(&signed, SIG_LEN + 1).is_err());

        let name = SignedPayload::new("Ann".to_owned(), vec![1; SIG_LEN]).encode();
        assert!(SignedPayload::<String>::decode(&name[..name.len() - 1], SIG_LEN).is_err());
    }

    #[test]
    fn message_dispatch() {
        let messages = vec![
            Message::Ballot(sample_ballot()),
            Message::SignedBallot(SignedPayload::new(sample_ballot(), vec![3; SIG_LEN])),
            Message::RegistrationId(Uuid::new_v4()),
            Message::SignedRegistrationId(SignedPayload::new(Uuid::new_v4(), vec![4; SIG_LEN])),
            Message::VoterName("Ann".to_owned()),
            Message::SignedVoterName(SignedPayload::new("Ann".to_owned(), vec![5; SIG_LEN])),
        ];

        for message in messages {
            let tagged = message.to_tagged_bytes();
            assert_eq!(tagged[0], message.kind().tag());
            let decoded = Message::from_tagged_bytes(&tagged, SIG_LEN).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        assert!(matches!(
            MessageKind::from_tag(0),
            Err(Error::UnsupportedType(0))
        ));
        assert!(matches!(
            Message::from_tagged_bytes(&[0x42, 1, 2, 3], SIG_LEN),
            Err(Error::UnsupportedType(0x42))
        ));
        assert!(matches!(
            Message::from_tagged_bytes(&[], SIG_LEN),
            Err(Error::MalformedEncoding(_))
        ));
        assert_eq!(MessageKind::from_tag(2).unwrap(), MessageKind::SignedBallot);
        assert_eq!(format!("{}", MessageKind::SignedBallot), "signed_ballot");
    }
}
