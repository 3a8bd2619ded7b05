use bytes::BufMut;

use std::collections::HashSet;

use crate::dns::{DomainName, ProtocolError};
use crate::parser::{self, NameSegment};

/// Encodes a dotted name into length-prefixed labels. A single trailing dot is
/// accepted. Label lengths are not checked.
pub fn encode(name: &str) -> Vec<u8> {
    let name = name.strip_suffix('.').unwrap_or(name);
    let mut raw = Vec::with_capacity(name.len() + 2);

    if !name.is_empty() {
        for label in name.split('.') {
            let bytes = label.as_bytes();
            raw.put_u8(bytes.len() as u8);
            raw.put_slice(bytes);
        }
    }
    // null terminated
    raw.put_u8(0);

    raw
}

/// Longest name allowed on the wire, length bytes and terminator included.
pub const MAX_NAME_LEN: usize = 255;

/// Decodes the name at the start of `name` into dotted form, following
/// compression pointers into `message`. Every label is followed by a dot and
/// the root name decodes to `.`. Dots, backslashes, whitespace and other
/// unprintable bytes inside a label are escaped as in zone files (`\.`,
/// `\\`, `\DDD`).
///
/// Pointer targets are always offsets into `message`, whatever slice of it
/// `name` happens to be. A target that is visited twice is a loop, and the
/// expanded name may not exceed [`MAX_NAME_LEN`] octets.
pub fn decode(name: &[u8], message: &[u8]) -> Result<DomainName, ProtocolError> {
    let mut decoded = String::new();
    let mut wire_len = 1;
    let mut visited = HashSet::new();
    let mut rem = name;

    loop {
        let (next, segment) =
            parser::name_segment(rem).map_err(|_| ProtocolError::Truncated("domain name"))?;

        match segment {
            NameSegment::End => break,
            NameSegment::Label(label) => {
                wire_len += 1 + label.len();
                if wire_len > MAX_NAME_LEN {
                    return Err(ProtocolError::NameTooLong);
                }
                push_label(&mut decoded, label);
                rem = next;
            }
            NameSegment::Pointer(offset) => {
                if !visited.insert(offset) {
                    return Err(ProtocolError::PointerLoop(offset));
                }
                rem = message
                    .get(offset..)
                    .filter(|target| !target.is_empty())
                    .ok_or(ProtocolError::PointerOutOfBounds(offset))?;
            }
        }
    }

    if decoded.is_empty() {
        decoded.push('.');
    }

    Ok(DomainName::from(decoded))
}

fn push_label(out: &mut String, label: &[u8]) {
    for &b in label {
        match b {
            b'.' | b'\\' => {
                out.push('\\');
                out.push(char::from(b));
            }
            0x21..=0x7e => out.push(char::from(b)),
            _ => out.push_str(&format!("\\{:03}", b)),
        }
    }
    out.push('.');
}

/// Number of bytes the name occupies where it is written, not the length of
/// the name it stands for.
pub fn wire_length(name: &[u8]) -> Result<usize, ProtocolError> {
    parser::dns_name(name)
        .map(|(_, raw)| raw.len())
        .map_err(|_| ProtocolError::Truncated("domain name"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_labels() {
        assert_eq!(encode("www.example.com"), b"\x03www\x07example\x03com\x00");
    }

    #[test]
    fn encode_ignores_trailing_dot() {
        assert_eq!(encode("example.com."), encode("example.com"));
    }

    #[test]
    fn encode_root() {
        assert_eq!(encode(""), b"\x00");
        assert_eq!(encode("."), b"\x00");
    }

    #[test]
    fn round_trip() {
        let long_label = "a".repeat(63);
        let names = vec![
            "example.com".to_string(),
            "x.y".to_string(),
            format!("{}.example.org", long_label),
            "_sip._tcp.example.net".to_string(),
        ];

        for name in names {
            let raw = encode(&name);
            let decoded = decode(&raw, &raw).unwrap();
            assert_eq!(decoded.as_str(), format!("{}.", name));
        }
    }

    #[test]
    fn decode_root() {
        assert_eq!(decode(b"\x00", b"\x00").unwrap().as_str(), ".");
    }

    #[test]
    fn decode_follows_pointer() {
        let message = b"\x07example\x03com\x00\x03www\xc0\x00";

        let decoded = decode(&message[13..], message).unwrap();

        assert_eq!(decoded.as_str(), "www.example.com.");
    }

    #[test]
    fn decode_pointer_chain() {
        // "com" at 0, "example" + ptr(0) at 5, "mail" + ptr(5) at 15
        let message = b"\x03com\x00\x07example\xc0\x00\x04mail\xc0\x05";

        let decoded = decode(&message[15..], message).unwrap();

        assert_eq!(decoded.as_str(), "mail.example.com.");
    }

    #[test]
    fn decode_self_pointer_fails() {
        let message = b"\xc0\x00";

        assert_eq!(decode(message, message), Err(ProtocolError::PointerLoop(0)));
    }

    #[test]
    fn decode_two_pointer_cycle_fails() {
        let message = b"\x01a\xc0\x04\x01b\xc0\x00";

        assert!(matches!(
            decode(message, message),
            Err(ProtocolError::PointerLoop(_))
        ));
    }

    #[test]
    fn decode_long_label_cycle_fails_early() {
        // 500 labels of 63 bytes, the last one pointing back to the first
        let mut message = Vec::new();
        for _ in 0..500 {
            message.push(63);
            message.extend_from_slice(&[b'x'; 63]);
        }
        message.extend_from_slice(b"\xc0\x00");

        assert_eq!(decode(&message, &message), Err(ProtocolError::NameTooLong));
    }

    #[test]
    fn decode_long_pointer_chain_cycle() {
        // every pointer refers to the one after it, the last one to the first
        let count = 2000;
        let mut message = Vec::new();
        for i in 1..count {
            message.extend_from_slice(&(0xc000 | (2 * i) as u16).to_be_bytes());
        }
        message.extend_from_slice(b"\xc0\x00");

        assert!(matches!(
            decode(&message, &message),
            Err(ProtocolError::PointerLoop(_))
        ));
    }

    #[test]
    fn decode_longest_name() {
        // 3 * 64 + 62 + 1 = 255 octets
        let name = format!("{a}.{a}.{a}.{b}", a = "a".repeat(63), b = "b".repeat(61));
        let raw = encode(&name);
        assert_eq!(raw.len(), MAX_NAME_LEN);

        assert_eq!(decode(&raw, &raw).unwrap().as_str(), format!("{}.", name));

        let longer = encode(&format!("{}b", name));
        assert_eq!(decode(&longer, &longer), Err(ProtocolError::NameTooLong));
    }

    #[test]
    fn decode_escapes_special_bytes() {
        let raw = b"\x04a.b\\\x03c\td\x02\xff \x00";

        assert_eq!(decode(raw, raw).unwrap().as_str(), "a\\.b\\\\.c\\009d.\\255\\032.");
    }

    #[test]
    fn decode_pointer_past_end() {
        let message = b"\x03www\xc0\x40";

        assert_eq!(
            decode(message, message),
            Err(ProtocolError::PointerOutOfBounds(0x40))
        );
    }

    #[test]
    fn decode_truncated_label() {
        let message = b"\x07exa";

        assert_eq!(
            decode(message, message),
            Err(ProtocolError::Truncated("domain name"))
        );
    }

    #[test]
    fn wire_length_counts_pointer_as_two() {
        assert_eq!(wire_length(b"\x03www\xc0\x0c\xff\xff").unwrap(), 6);
        assert_eq!(wire_length(b"\x03www\x00\xff").unwrap(), 5);
        assert_eq!(wire_length(b"\xc0\x0c").unwrap(), 2);
    }
}
