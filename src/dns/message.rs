use bytes::Bytes;

use crate::dns::{Header, ProtocolError, QuestionSection, ResourceRecord, HEADER_LEN};
use crate::parser;

/// Forward-only reader over one DNS message.
///
/// Sections are read in wire order: header, question, then one record per
/// call to [`Message::next_record`]. Asking for a later section reads the
/// earlier ones first. Names in the returned records must be decoded against
/// [`Message::buffer`], the whole message, since compression offsets count
/// from its first byte.
#[derive(Debug)]
pub struct Message {
    buf: Bytes,
    offset: usize,
    header: Option<Header>,
    question: Option<Option<QuestionSection>>,
}

impl Message {
    pub fn new(buf: Bytes) -> Self {
        Self {
            buf,
            offset: 0,
            header: None,
            question: None,
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Bytes read so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    fn remaining(&self) -> &[u8] {
        &self.buf[self.offset..]
    }

    pub fn header(&mut self) -> Result<Header, ProtocolError> {
        if let Some(header) = self.header {
            return Ok(header);
        }

        let (_, header) =
            parser::dns_header(&self.buf).map_err(|_| ProtocolError::Truncated("header"))?;
        self.offset = HEADER_LEN;
        self.header = Some(header);

        Ok(header)
    }

    /// Skips all `qdcount` questions and returns the first. Continuation
    /// messages of a zone transfer usually carry none.
    pub fn question(&mut self) -> Result<Option<QuestionSection>, ProtocolError> {
        let header = self.header()?;
        if let Some(question) = self.question {
            return Ok(question);
        }

        let mut first = None;
        for _ in 0..header.qd_count {
            let (_, question) = parser::dns_question(self.remaining())
                .map_err(|_| ProtocolError::Truncated("question"))?;
            self.offset += question.wire_len;
            first.get_or_insert(question);
        }
        self.question = Some(first);

        Ok(first)
    }

    /// Reads the next resource record, or `None` once the message is used up.
    /// Records are read until the buffer ends; the section counts are not
    /// consulted.
    pub fn next_record(&mut self) -> Result<Option<ResourceRecord>, ProtocolError> {
        self.question()?;

        let remaining = self.remaining();
        if remaining.is_empty() {
            return Ok(None);
        }
        let available = remaining.len();

        let (rest, fixed) = parser::record_header(remaining)
            .map_err(|_| ProtocolError::Truncated("resource record"))?;
        let declared = usize::from(fixed.data_len);
        let data = rest.get(..declared).ok_or(ProtocolError::RdataOverrun {
            declared,
            available: rest.len(),
        })?;

        let record = ResourceRecord {
            name: self.buf.slice_ref(fixed.name),
            record_type: fixed.record_type.into(),
            class: fixed.class.into(),
            ttl: fixed.ttl,
            data: self.buf.slice_ref(data),
        };

        let wire_len = record.wire_len();
        if wire_len >= available {
            self.offset = self.buf.len();
        } else {
            self.offset += wire_len;
        }

        Ok(Some(record))
    }
}
