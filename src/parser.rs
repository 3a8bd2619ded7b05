use nom::{
    bytes::complete::take,
    combinator::map,
    number::complete::{be_u16, be_u32, be_u8},
    sequence::tuple,
    IResult,
};

use crate::dns::{Header, QuestionSection, POINTER_MASK};

/// One element of a name as it sits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSegment<'a> {
    Label(&'a [u8]),
    /// 14-bit message-local offset.
    Pointer(usize),
    End,
}

/// The fixed part of a resource record. The payload is not taken here so that
/// the caller can tell an overrunning data length apart from a short record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader<'a> {
    pub name: &'a [u8],
    pub record_type: u16,
    pub class: u16,
    pub ttl: u32,
    pub data_len: u16,
}

pub fn dns_header(input: &[u8]) -> IResult<&[u8], Header> {
    map(
        tuple((be_u16, be_u16, be_u16, be_u16, be_u16, be_u16)),
        |(id, flags, qd_count, an_count, ns_count, ar_count)| Header {
            id,
            flags,
            qd_count,
            an_count,
            ns_count,
            ar_count,
        },
    )(input)
}

/// Implemented as described in [RFC 1035](https://tools.ietf.org/html/rfc1035#section-4.1.4)
pub fn name_segment(input: &[u8]) -> IResult<&[u8], NameSegment<'_>> {
    let (rem, len) = be_u8(input)?;

    match len {
        0 => Ok((rem, NameSegment::End)),
        len if len & POINTER_MASK == POINTER_MASK => {
            let (rem, low) = be_u8(rem)?;
            let offset = usize::from(len & !POINTER_MASK) << 8 | usize::from(low);
            Ok((rem, NameSegment::Pointer(offset)))
        }
        len => {
            let (rem, label) = take(len)(rem)?;
            Ok((rem, NameSegment::Label(label)))
        }
    }
}

/// Recognizes the bytes a name occupies in place. A pointer ends the name and
/// counts for its own two bytes only.
pub fn dns_name(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let mut rem = input;
    loop {
        let (next, segment) = name_segment(rem)?;
        rem = next;
        if !matches!(segment, NameSegment::Label(_)) {
            break;
        }
    }

    let consumed = input.len() - rem.len();
    Ok((rem, &input[..consumed]))
}

pub fn dns_question(input: &[u8]) -> IResult<&[u8], QuestionSection> {
    let (rem, (name, qtype, qclass)) = tuple((dns_name, be_u16, be_u16))(input)?;

    Ok((
        rem,
        QuestionSection {
            query_type: qtype.into(),
            query_class: qclass.into(),
            wire_len: name.len() + 4,
        },
    ))
}

pub fn record_header(input: &[u8]) -> IResult<&[u8], RecordHeader<'_>> {
    let (rem, (name, record_type, class, ttl, data_len)) =
        tuple((dns_name, be_u16, be_u16, be_u32, be_u16))(input)?;

    Ok((
        rem,
        RecordHeader {
            name,
            record_type,
            class,
            ttl,
            data_len,
        },
    ))
}

pub fn soa_timers(input: &[u8]) -> IResult<&[u8], (u32, u32, u32, u32, u32)> {
    tuple((be_u32, be_u32, be_u32, be_u32, be_u32))(input)
}
