//! DNS zone transfer (AXFR) client.
//!
//! [`dns`] holds the wire codec and the framed TCP transport, [`axfr`] drives
//! a transfer and [`sink`] receives the decoded records.

pub mod axfr;
pub mod dns;
pub mod parser;
pub mod settings;
pub mod sink;

pub use axfr::{Session, State, Summary};
pub use sink::{LineSink, ProcessSink, RecordSink, ZoneEntry};

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] dns::ProtocolError),
    #[error("record consumer failed: {0}")]
    Sink(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
