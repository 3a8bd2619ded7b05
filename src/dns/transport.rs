use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use std::io::{self, Read, Write};

use crate::dns::Codec;

const READ_CHUNK: usize = 4096;

/// Blocking, length-framed DNS message exchange over a byte stream.
pub struct Transport<S> {
    stream: S,
    codec: Codec,
    read_buf: BytesMut,
}

impl<S: Read + Write> Transport<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: Codec,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    pub fn send(&mut self, message: &[u8]) -> io::Result<()> {
        let mut frame = BytesMut::new();
        self.codec.encode(message, &mut frame)?;

        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        log::debug!("Sent DNS message of {} bytes.", message.len());
        Ok(())
    }

    /// Reads one whole message, retrying short reads until the frame is
    /// complete. `None` means the peer closed the stream between frames; a
    /// close in the middle of a frame is an `UnexpectedEof` error.
    pub fn receive(&mut self) -> io::Result<Option<Bytes>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(message) = self.codec.decode(&mut self.read_buf)? {
                return Ok(Some(message));
            }

            let read = match self.stream.read(&mut chunk) {
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };

            if read == 0 {
                if self.read_buf.is_empty() {
                    log::debug!("Peer closed the connection.");
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "connection closed with {} bytes of an unfinished frame",
                        self.read_buf.len()
                    ),
                ));
            }

            self.read_buf.extend_from_slice(&chunk[..read]);
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
