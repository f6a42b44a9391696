//! Line-based codec for tokio.
//!
//! Inbound, the codec accumulates bytes and yields one complete message per
//! `\n`, with an optional preceding `\r` stripped along with the terminator.
//! Outbound, every [`Message`](crate::Message) is serialized and terminated
//! with `\r\n`.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::Message;

/// Codec that frames newline-terminated IRC lines.
pub struct LineCodec {
    /// Index of next byte to check for newline.
    next_index: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self { next_index: 0 }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        // Look for a newline starting from where the previous call left off.
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let mut line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            // Drop the `\n` and an optional preceding `\r`.
            line.truncate(line.len() - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            let line = String::from_utf8(line.to_vec()).map_err(|e| {
                ProtocolError::InvalidUtf8 {
                    byte_pos: e.utf8_error().valid_up_to(),
                    details: e.utf8_error().to_string(),
                }
            })?;

            Ok(Some(line))
        } else {
            // No complete line yet - remember where we stopped scanning.
            self.next_index = src.len();
            Ok(None)
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = msg.to_string();
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_bare_lf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("NICK alice\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("NICK alice".to_string()));
    }

    #[test]
    fn decode_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        // The rest of the line arrives in a second read.
        buf.extend_from_slice(b"token\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PING :token".to_string())
        );
    }

    #[test]
    fn decode_two_lines_in_one_read() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("NICK alice\r\nUSER alice 0 * :Alice A\r\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("NICK alice".into()));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("USER alice 0 * :Alice A".into())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        let msg = Message::new("PONG").trailing("irc.localhost");
        codec.encode(msg, &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :irc.localhost\r\n");
    }
}
