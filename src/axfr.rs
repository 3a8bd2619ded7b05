use rand::Rng;

use std::io::{Read, Write};

use crate::dns::{DomainName, Message, ProtocolError, Rcode, RecordType, StandardQuery, Transport};
use crate::sink::{RecordSink, ZoneEntry};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    AwaitingFirstSoa,
    Transferring,
    Done,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub messages: usize,
    pub records: usize,
}

/// One AXFR exchange over a single connection.
///
/// The zone is delimited by its SOA record: the first one opens the transfer
/// and the next one closes it. Records are handed to the sink in wire order.
/// The closing SOA repeats the opening one and is not emitted; nothing after
/// it is read.
pub struct Session<S> {
    transport: Transport<S>,
    zone: DomainName,
    query_id: Option<u16>,
    state: State,
    summary: Summary,
}

impl<S: Read + Write> Session<S> {
    pub fn new(stream: S, zone: DomainName) -> Self {
        Self {
            transport: Transport::new(stream),
            zone,
            query_id: None,
            state: State::Start,
            summary: Summary::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Sends the AXFR query.
    pub fn start<R: Rng>(&mut self, rng: &mut R) -> Result<(), Error> {
        let query = StandardQuery::axfr(self.zone.clone(), rng);
        self.transport.send(&Vec::<u8>::from(&query))?;

        log::info!("Requested transfer of zone {} (id {}).", self.zone, query.header.id);
        self.query_id = Some(query.header.id);
        self.state = State::AwaitingFirstSoa;
        Ok(())
    }

    /// Reads and emits one message. A stream that ends before the closing SOA
    /// is a protocol error.
    pub fn process_next<K: RecordSink + ?Sized>(&mut self, sink: &mut K) -> Result<State, Error> {
        if self.state == State::Done {
            return Ok(State::Done);
        }

        let frame = self
            .transport
            .receive()?
            .ok_or(ProtocolError::UnterminatedTransfer)?;
        self.summary.messages += 1;

        let mut message = Message::new(frame);
        let header = message.header()?;
        if !header.is_response() {
            return Err(ProtocolError::NotAResponse(header.id).into());
        }
        if header.truncated() {
            log::warn!("Message {} has the TC bit set.", self.summary.messages);
        }
        if Some(header.id) != self.query_id {
            log::warn!(
                "Response id {} does not match query id {:?}.",
                header.id,
                self.query_id
            );
        }
        match header.response_code() {
            Rcode::NoError => {}
            rcode => return Err(ProtocolError::ServerError(rcode).into()),
        }

        let mut emitted = 0;
        while let Some(record) = message.next_record()? {
            if record.record_type == RecordType::SOA {
                match self.state {
                    State::Start | State::AwaitingFirstSoa => self.state = State::Transferring,
                    _ => {
                        self.state = State::Done;
                        break;
                    }
                }
            }

            let entry = ZoneEntry::decode(&record, message.buffer())?;
            sink.emit(&entry).map_err(Error::Sink)?;
            emitted += 1;
        }

        self.summary.records += emitted;
        log::debug!(
            "Message {} carried {} records, now {:?}.",
            self.summary.messages,
            emitted,
            self.state
        );
        Ok(self.state)
    }

    /// Runs the whole transfer and closes the connection.
    pub fn run<R: Rng, K: RecordSink + ?Sized>(
        mut self,
        rng: &mut R,
        sink: &mut K,
    ) -> Result<Summary, Error> {
        self.start(rng)?;
        while self.process_next(sink)? != State::Done {}

        log::info!(
            "Transfer of zone {} complete: {} records in {} messages.",
            self.zone,
            self.summary.records,
            self.summary.messages
        );
        Ok(self.summary)
    }

    pub fn into_inner(self) -> S {
        self.transport.into_inner()
    }
}
