//! Tokio codec framing P10 lines.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};
use crate::message::Message;

/// Default maximum line length, including the terminator.
pub const DEFAULT_MAX_LEN: usize = 512;

/// Newline-delimited codec producing [`Message`]s.
///
/// Accepts `\n` or `\r\n` terminators. Blank lines are skipped. Outbound
/// messages are terminated with a single `\n`.
///
/// Lines that are over-long or carry no command are dropped and counted
/// rather than failing the stream; see [`P10Codec::take_discarded`]. Bytes
/// that are not UTF-8 are replaced. Only an unterminated line longer than
/// the limit is an error.
pub struct P10Codec {
    next_index: usize,
    max_len: usize,
    discarded: usize,
}

impl P10Codec {
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarded: 0,
        }
    }

    /// Number of lines dropped since the last call.
    pub fn take_discarded(&mut self) -> usize {
        std::mem::take(&mut self.discarded)
    }
}

impl Default for P10Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for P10Codec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();
                if src.len() > self.max_len {
                    let actual = src.len();
                    src.clear();
                    self.next_index = 0;
                    return Err(ProtocolError::LineTooLong {
                        actual,
                        limit: self.max_len,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                self.discarded += 1;
                continue;
            }

            let text = String::from_utf8_lossy(&line);
            if text.trim_end_matches(['\r', '\n']).trim().is_empty() {
                continue;
            }
            match text.parse() {
                Ok(msg) => return Ok(Some(msg)),
                Err(_) => self.discarded += 1,
            }
        }
    }
}

impl Encoder<Message> for P10Codec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<()> {
        let line = msg.to_string();
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
