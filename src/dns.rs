pub mod codec;
pub mod message;
pub mod name;
pub mod record;
pub mod transport;

pub use codec::Codec;
pub use message::Message;
pub use transport::Transport;

use bytes::{BufMut, Bytes};
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

pub const HEADER_LEN: usize = 12;

/// Top two bits of a length byte that mark a compression pointer.
pub const POINTER_MASK: u8 = 0xC0;

const QR_BIT: u16 = 0b1000000000000000;
const TC_BIT: u16 = 0b0000001000000000;
const RCODE_BITS: u16 = 0b0000000000001111;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("message ends inside the {0}")]
    Truncated(&'static str),
    #[error("compression pointer to offset {0} lies outside the message")]
    PointerOutOfBounds(usize),
    #[error("compression pointer loop through offset {0}")]
    PointerLoop(usize),
    #[error("domain name is longer than 255 octets")]
    NameTooLong,
    #[error("record data length {declared} overruns the message ({available} bytes left)")]
    RdataOverrun { declared: usize, available: usize },
    #[error("server answered with {0:?}")]
    ServerError(Rcode),
    #[error("message {0} is a query, not a response")]
    NotAResponse(u16),
    #[error("zone transfer ended before the closing SOA record")]
    UnterminatedTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl Header {
    /// A plain standard query: no opcode, no recursion desired, one question.
    pub fn query<R: Rng>(rng: &mut R) -> Self {
        Self {
            id: rng.gen(),
            flags: 0,
            qd_count: 1,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    pub fn is_response(&self) -> bool {
        self.flags & QR_BIT != 0
    }

    pub fn truncated(&self) -> bool {
        self.flags & TC_BIT != 0
    }

    pub fn response_code(&self) -> Rcode {
        Rcode::from((self.flags & RCODE_BITS) as u8)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Other(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: DomainName,
    pub query_type: RecordType,
    pub query_class: RecordClass,
}

/// A question read back from a response. The client already knows what it
/// asked, so only the type, class and extent are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSection {
    pub query_type: RecordType,
    pub query_class: RecordClass,
    pub wire_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardQuery {
    pub header: Header,
    pub question: Question,
}

impl StandardQuery {
    pub fn axfr<R: Rng>(zone: DomainName, rng: &mut R) -> Self {
        Self {
            header: Header::query(rng),
            question: Question {
                name: zone,
                query_type: RecordType::AXFR,
                query_class: RecordClass::IN,
            },
        }
    }
}

/// A resource record as found in a message. The owner name is kept as raw wire
/// bytes and may end in a compression pointer, so it can only be decoded
/// against the message it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Bytes,
    pub record_type: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: Bytes,
}

impl ResourceRecord {
    pub fn wire_len(&self) -> usize {
        self.name.len() + 10 + self.data.len()
    }

    pub fn owner(&self, message: &[u8]) -> Result<DomainName, ProtocolError> {
        name::decode(&self.name, message)
    }

    pub fn render_data(&self, message: &[u8]) -> Result<String, ProtocolError> {
        record::render(self, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOfAuthority {
    pub mname: DomainName,
    pub rname: DomainName,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

impl fmt::Display for StartOfAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ( {} {} {} {} {} )",
            self.mname, self.rname, self.serial, self.refresh, self.retry, self.expire, self.minimum
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for DomainName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    AXFR,
    Unknown(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordClass {
    IN,
    Unknown(u16),
}

impl From<&StandardQuery> for Vec<u8> {
    fn from(query: &StandardQuery) -> Self {
        let mut raw_query: Vec<u8> = Vec::from(&query.header);
        raw_query.extend(Vec::<u8>::from(&query.question));
        raw_query
    }
}

impl From<&Header> for Vec<u8> {
    fn from(header: &Header) -> Self {
        let mut raw_header = Vec::with_capacity(HEADER_LEN);

        raw_header.put_u16(header.id);
        raw_header.put_u16(header.flags);
        raw_header.put_u16(header.qd_count);
        raw_header.put_u16(header.an_count);
        raw_header.put_u16(header.ns_count);
        raw_header.put_u16(header.ar_count);

        raw_header
    }
}

impl From<&Question> for Vec<u8> {
    fn from(question: &Question) -> Self {
        let mut raw = Vec::<u8>::from(&question.name);

        raw.put_u16(question.query_type.into());
        raw.put_u16(question.query_class.into());

        raw
    }
}

impl From<&ResourceRecord> for Vec<u8> {
    fn from(rr: &ResourceRecord) -> Self {
        let mut raw_rr = Vec::with_capacity(rr.wire_len());

        raw_rr.put_slice(&rr.name);
        raw_rr.put_u16(rr.record_type.into());
        raw_rr.put_u16(rr.class.into());
        raw_rr.put_u32(rr.ttl);
        raw_rr.put_u16(rr.data.len() as u16);
        raw_rr.put_slice(&rr.data);

        raw_rr
    }
}

impl From<&StartOfAuthority> for Vec<u8> {
    fn from(soa: &StartOfAuthority) -> Self {
        let mut raw = Vec::<u8>::from(&soa.mname);

        raw.extend(Vec::<u8>::from(&soa.rname));
        raw.put_u32(soa.serial);
        raw.put_u32(soa.refresh);
        raw.put_u32(soa.retry);
        raw.put_u32(soa.expire);
        raw.put_u32(soa.minimum);

        raw
    }
}

impl From<&DomainName> for Vec<u8> {
    fn from(name: &DomainName) -> Self {
        name::encode(&name.0)
    }
}

impl From<u8> for Rcode {
    fn from(code: u8) -> Self {
        match code {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            code => Rcode::Other(code),
        }
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            12 => RecordType::PTR,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            28 => RecordType::AAAA,
            252 => RecordType::AXFR,
            t => RecordType::Unknown(t),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> u16 {
        match value {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::AXFR => 252,
            RecordType::Unknown(t) => t,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::NS => f.write_str("NS"),
            RecordType::CNAME => f.write_str("CNAME"),
            RecordType::SOA => f.write_str("SOA"),
            RecordType::PTR => f.write_str("PTR"),
            RecordType::MX => f.write_str("MX"),
            RecordType::TXT => f.write_str("TXT"),
            RecordType::AAAA => f.write_str("AAAA"),
            RecordType::AXFR => f.write_str("AXFR"),
            RecordType::Unknown(t) => write!(f, "TYPE{}", t),
        }
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            c => RecordClass::Unknown(c),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        match value {
            RecordClass::IN => 1,
            RecordClass::Unknown(c) => c,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::IN => f.write_str("IN"),
            RecordClass::Unknown(c) => write!(f, "CLASS{}", c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn query_header_is_plain() {
        let mut rng = StdRng::seed_from_u64(42);
        let header = Header::query(&mut rng);

        assert_eq!(header.flags, 0);
        assert_eq!(header.qd_count, 1);
        assert_eq!(header.an_count + header.ns_count + header.ar_count, 0);
    }

    #[test]
    fn query_id_follows_the_generator() {
        let first = Header::query(&mut StdRng::seed_from_u64(7));
        let second = Header::query(&mut StdRng::seed_from_u64(7));

        assert_eq!(first.id, second.id);
    }

    #[test]
    fn encode_axfr_query() {
        let mut rng = StdRng::seed_from_u64(1);
        let query = StandardQuery::axfr(DomainName::from("example.com"), &mut rng);
        let id = query.header.id.to_be_bytes();

        let raw = Vec::<u8>::from(&query);

        assert_eq!(&raw[..2], &id);
        assert_eq!(
            &raw[2..],
            b"\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x07example\x03com\x00\x00\xfc\x00\x01"
        );
    }

    #[test]
    fn header_flag_helpers() {
        let header = Header {
            id: 1,
            flags: 0x8205,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        };

        assert!(header.is_response());
        assert!(header.truncated());
        assert_eq!(header.response_code(), Rcode::Refused);
    }

    #[test]
    fn type_and_class_names() {
        assert_eq!(RecordType::from(28).to_string(), "AAAA");
        assert_eq!(RecordType::from(252).to_string(), "AXFR");
        assert_eq!(RecordType::from(99).to_string(), "TYPE99");
        assert_eq!(RecordClass::from(1).to_string(), "IN");
        assert_eq!(RecordClass::from(3).to_string(), "CLASS3");
    }

    #[test]
    fn record_wire_len_matches_encoding() {
        let rr = ResourceRecord {
            name: Bytes::from_static(b"\xc0\x0c"),
            record_type: RecordType::A,
            class: RecordClass::IN,
            ttl: 60,
            data: Bytes::from_static(&[10, 0, 0, 1]),
        };

        assert_eq!(Vec::<u8>::from(&rr).len(), rr.wire_len());
    }
}
