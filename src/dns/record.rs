use nom::number::complete::be_u16;

use crate::dns::{name, ProtocolError, RecordClass, RecordType, ResourceRecord, StartOfAuthority};
use crate::parser;

/// Renders the record data in zone-file presentation. Only the name-bearing
/// types are spelled out; everything else, and every record outside the
/// Internet class, uses the generic `\# <len> <hex>` form of RFC 3597.
pub fn render(record: &ResourceRecord, message: &[u8]) -> Result<String, ProtocolError> {
    if record.class != RecordClass::IN {
        return Ok(opaque(&record.data));
    }

    match record.record_type {
        RecordType::NS | RecordType::CNAME | RecordType::PTR => {
            Ok(name::decode(&record.data, message)?.to_string())
        }
        RecordType::SOA => Ok(StartOfAuthority::decode(&record.data, message)?.to_string()),
        RecordType::MX => mail_exchange(&record.data, message),
        _ => Ok(opaque(&record.data)),
    }
}

impl StartOfAuthority {
    /// Decodes SOA record data. Both names may point anywhere in `message`.
    pub fn decode(data: &[u8], message: &[u8]) -> Result<Self, ProtocolError> {
        let mname = name::decode(data, message)?;
        let rem = &data[name::wire_length(data)?..];
        let rname = name::decode(rem, message)?;
        let rem = &rem[name::wire_length(rem)?..];

        let (_, (serial, refresh, retry, expire, minimum)) =
            parser::soa_timers(rem).map_err(|_| ProtocolError::Truncated("SOA record"))?;

        Ok(Self {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        })
    }
}

fn mail_exchange(data: &[u8], message: &[u8]) -> Result<String, ProtocolError> {
    let (rem, preference) =
        be_u16::<_, nom::error::Error<&[u8]>>(data).map_err(|_| ProtocolError::Truncated("MX record"))?;
    let exchange = name::decode(rem, message)?;

    Ok(format!("{} {}", preference, exchange))
}

fn opaque(data: &[u8]) -> String {
    if data.is_empty() {
        return "\\# 0".to_string();
    }
    let hex = data.iter().map(|b| format!("{:02x}", b)).collect::<String>();
    format!("\\# {} {}", data.len(), hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::DomainName;
    use bytes::Bytes;

    fn record(record_type: RecordType, class: RecordClass, data: &[u8]) -> ResourceRecord {
        ResourceRecord {
            name: Bytes::from_static(b"\x00"),
            record_type,
            class,
            ttl: 300,
            data: Bytes::copy_from_slice(data),
        }
    }

    #[test]
    fn render_soa() {
        let soa = StartOfAuthority {
            mname: DomainName::from("ns1.example.com"),
            rname: DomainName::from("admin.example.com"),
            serial: 2024010100,
            refresh: 3600,
            retry: 900,
            expire: 604800,
            minimum: 300,
        };
        let data = Vec::<u8>::from(&soa);
        let rr = record(RecordType::SOA, RecordClass::IN, &data);

        assert_eq!(
            render(&rr, &data).unwrap(),
            "ns1.example.com. admin.example.com. ( 2024010100 3600 900 604800 300 )"
        );
    }

    #[test]
    fn render_soa_with_compressed_names() {
        // message: "example.com" at 0, rdata at 13
        let mut message = b"\x07example\x03com\x00".to_vec();
        let rdata_start = message.len();
        message.extend_from_slice(b"\x03ns1\xc0\x00\x05admin\xc0\x00");
        message.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 5]);

        let rr = record(RecordType::SOA, RecordClass::IN, &message[rdata_start..]);

        assert_eq!(
            render(&rr, &message).unwrap(),
            "ns1.example.com. admin.example.com. ( 1 2 3 4 5 )"
        );
    }

    #[test]
    fn render_short_soa() {
        let data = b"\x00\x00\x00\x00\x00\x01";
        let rr = record(RecordType::SOA, RecordClass::IN, data);

        assert_eq!(
            render(&rr, data),
            Err(ProtocolError::Truncated("SOA record"))
        );
    }

    #[test]
    fn render_mx() {
        let data = b"\x00\x0a\x04mail\x07example\x03com\x00";
        let rr = record(RecordType::MX, RecordClass::IN, data);

        assert_eq!(render(&rr, data).unwrap(), "10 mail.example.com.");
    }

    #[test]
    fn render_name_types() {
        let data = b"\x03ns2\x07example\x03net\x00";
        for record_type in [RecordType::NS, RecordType::CNAME, RecordType::PTR] {
            let rr = record(record_type, RecordClass::IN, data);
            assert_eq!(render(&rr, data).unwrap(), "ns2.example.net.");
        }
    }

    #[test]
    fn render_unknown_type() {
        let rr = record(RecordType::Unknown(99), RecordClass::IN, &[0xDE, 0xAD]);

        assert_eq!(render(&rr, &[]).unwrap(), "\\# 2 dead");
    }

    #[test]
    fn render_address_as_opaque() {
        let rr = record(RecordType::A, RecordClass::IN, &[192, 0, 2, 1]);

        assert_eq!(render(&rr, &[]).unwrap(), "\\# 4 c0000201");
    }

    #[test]
    fn render_foreign_class_as_opaque() {
        let data = b"\x03ns2\x00";
        let rr = record(RecordType::NS, RecordClass::Unknown(3), data);

        assert_eq!(render(&rr, data).unwrap(), "\\# 5 036e733200");
    }

    #[test]
    fn render_empty_payload() {
        let rr = record(RecordType::TXT, RecordClass::IN, &[]);

        assert_eq!(render(&rr, &[]).unwrap(), "\\# 0");
    }
}
