use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use std::io;

const LENGTH_PREFIX_LEN: usize = 2;

/// DNS over TCP framing: every message is preceded by its length as a
/// big-endian `u16`.
#[derive(Debug, Default)]
pub struct Codec;

impl Decoder for Codec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let len = usize::from(u16::from_be_bytes([buf[0], buf[1]]));
        if buf.len() < LENGTH_PREFIX_LEN + len {
            // not the whole message yet
            buf.reserve(LENGTH_PREFIX_LEN + len - buf.len());
            return Ok(None);
        }

        buf.advance(LENGTH_PREFIX_LEN);
        let message = buf.split_to(len).freeze();
        log::trace!("Unpacked DNS message of {} bytes.", len);

        Ok(Some(message))
    }
}

impl<'a> Encoder<&'a [u8]> for Codec {
    type Error = io::Error;

    fn encode(&mut self, message: &'a [u8], buf: &mut BytesMut) -> Result<(), io::Error> {
        let len = u16::try_from(message.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("DNS message of {} bytes does not fit a TCP frame", message.len()),
            )
        })?;

        buf.reserve(LENGTH_PREFIX_LEN + message.len());
        buf.put_u16(len);
        buf.put_slice(message);
        Ok(())
    }
}
