//! Line framing for the IRC protocol.
//!
//! Inbound lines end in `\n` with an optional preceding `\r`; outbound lines
//! are written with `\r\n`. Inbound bytes that are not valid UTF-8 are
//! replaced rather than rejected, since servers relay whatever clients send.

use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Longest inbound line accepted, including IRCv3 message tags.
pub const MAX_INBOUND_LINE: usize = 8191;

/// Errors that can occur while framing lines.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An inbound line exceeded [`MAX_INBOUND_LINE`] bytes.
    #[error("inbound line exceeds {0} bytes")]
    LineTooLong(usize),

    /// An outbound line contained CR, LF or NUL.
    #[error("outbound line contains a line break or NUL")]
    EmbeddedLineBreak,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// CRLF line codec.
#[derive(Debug, Clone)]
pub struct IrcCodec {
    max_length: usize,
}

impl IrcCodec {
    pub fn new() -> Self {
        IrcCodec {
            max_length: MAX_INBOUND_LINE,
        }
    }
}

impl Default for IrcCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for IrcCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, CodecError> {
        match buf.iter().position(|b| *b == b'\n') {
            Some(pos) if pos > self.max_length => Err(CodecError::LineTooLong(self.max_length)),
            Some(pos) => {
                let frame = buf.split_to(pos + 1);
                let line = &frame[..pos];
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                Ok(Some(String::from_utf8_lossy(line).into_owned()))
            }
            None if buf.len() > self.max_length => Err(CodecError::LineTooLong(self.max_length)),
            None => Ok(None),
        }
    }
}

impl Encoder<String> for IrcCodec {
    type Error = CodecError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), CodecError> {
        if line.contains(['\r', '\n', '\0']) {
            return Err(CodecError::EmbeddedLineBreak);
        }
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
    fn decodes_crlf_and_lf_lines() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(&b"PING :a\r\nPING :b\npartial"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :a".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :b".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"partial");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(&b"hi \xff\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("hi \u{fffd}".to_string())
        );
    }

    #[test]
    fn overlong_line_is_an_error() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from(vec![b'a'; MAX_INBOUND_LINE + 1].as_slice());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(CodecError::LineTooLong(MAX_INBOUND_LINE))
        ));
    }

    #[test]
    fn encodes_with_crlf() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("NICK gitbot".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"NICK gitbot\r\n");
    }

    #[test]
    fn refuses_to_encode_embedded_newline() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();
        let err = codec
            .encode("PRIVMSG #a :x\r\nQUIT".to_string(), &mut buf)
            .unwrap_err();
        assert!(matches!(err, CodecError::EmbeddedLineBreak));
        assert!(buf.is_empty());
    }
}
