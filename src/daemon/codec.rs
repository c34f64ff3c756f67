//! Hex length-prefixed framing for daemon messages
//!
//! Frame format:
//! ```text
//! +--------------------+------------------+
//! |  6 ASCII hex chars |  N bytes         |
//! |  (payload length)  |  (payload)       |
//! +--------------------+------------------+
//! ```
//!
//! The length counts encoded payload bytes. The payload is text in the
//! connection's [`Encoding`].

use std::fmt;
use std::io;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

/// Header size in bytes
pub const HEADER_LENGTH: usize = 6;

/// Largest payload a 6 digit header can announce
pub const MAX_PAYLOAD: usize = 0xFF_FFFF;

/// Text encoding used for payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8")]
    #[value(name = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    #[value(name = "latin-1")]
    Latin1,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, CodecError> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| CodecError::Decode(self)),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, CodecError> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| CodecError::Encode(self)))
                .collect(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
            _ => Err(format!("Unknown encoding: {}", s)),
        }
    }
}

/// Errors that can occur during codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid header: {0:?}")]
    BadHeader(String),

    #[error("Connection closed with {missing} payload bytes missing")]
    Truncated { missing: usize },

    #[error("Payload is not valid {0}")]
    Decode(Encoding),

    #[error("Payload cannot be encoded as {0}")]
    Encode(Encoding),

    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),
}

/// Parse a 6 digit hex header; zero-length payloads are rejected
pub fn parse_header(header: &[u8]) -> Result<usize, CodecError> {
    let text = String::from_utf8_lossy(header).into_owned();
    if header.len() != HEADER_LENGTH || !header.iter().all(u8::is_ascii_hexdigit) {
        return Err(CodecError::BadHeader(text));
    }
    match usize::from_str_radix(&text, 16) {
        Ok(0) | Err(_) => Err(CodecError::BadHeader(text)),
        Ok(len) => Ok(len),
    }
}

/// Codec for daemon frames
///
/// Decodes to raw payload bytes so that a payload in the wrong encoding is
/// reported by the protocol layer instead of tearing the connection down.
#[derive(Debug, Default)]
pub struct FrameCodec {
    encoding: Encoding,
    current_length: Option<usize>,
}

impl FrameCodec {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            current_length: None,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.current_length.is_none() {
            if src.len() < HEADER_LENGTH {
                return Ok(None);
            }
            let header = src.split_to(HEADER_LENGTH);
            self.current_length = Some(parse_header(&header)?);
        }

        let Some(length) = self.current_length else {
            return Ok(None);
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let payload = src.split_to(length).freeze();
        self.current_length = None;
        Ok(Some(payload))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        match self.current_length {
            Some(length) => Err(CodecError::Truncated {
                missing: length - src.len(),
            }),
            None if !src.is_empty() => Err(CodecError::BadHeader(
                String::from_utf8_lossy(src).into_owned(),
            )),
            None => Ok(None),
        }
    }
}

impl Encoder<&str> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = self.encoding.encode(item)?;
        if payload.len() > MAX_PAYLOAD {
            return Err(CodecError::MessageTooLarge(payload.len()));
        }

        dst.reserve(HEADER_LENGTH + payload.len());
        dst.put_slice(format!("{:06x}", payload.len()).as_bytes());
        dst.put_slice(&payload);
        Ok(())
    }
}

impl Encoder<String> for FrameCodec {
    type Error = CodecError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&str>::encode(self, item.as_str(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ping() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec.encode("ping", &mut buf).unwrap();
        assert_eq!(&buf[..], b"000004ping");
    }

    #[test]
    fn test_decode_waits_for_full_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"00000Apin"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"g {\"a\":1}");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], b"ping {\"a\":");
        assert_eq!(&buf[..], b"1}");
    }

    #[test]
    fn test_uppercase_and_lowercase_headers() {
        assert_eq!(parse_header(b"00001f").unwrap(), 31);
        assert_eq!(parse_header(b"00001F").unwrap(), 31);
    }

    #[test]
    fn test_bad_headers() {
        for header in [&b"000000"[..], &b"00x004"[..], &b"+00004"[..], &b"    04"[..]] {
            assert!(
                matches!(parse_header(header), Err(CodecError::BadHeader(_))),
                "{:?}",
                header
            );
        }
    }

    #[test]
    fn test_eof_mid_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"000010ping"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(CodecError::Truncated { missing: 12 })
        ));

        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"000"[..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(CodecError::BadHeader(_))
        ));

        let mut codec = FrameCodec::default();
        assert!(codec.decode_eof(&mut BytesMut::new()).unwrap().is_none());
    }

    #[test]
    fn test_latin1_length_counts_bytes() {
        let mut utf8 = FrameCodec::new(Encoding::Utf8);
        let mut latin1 = FrameCodec::new(Encoding::Latin1);
        let (mut a, mut b) = (BytesMut::new(), BytesMut::new());
        utf8.encode("é", &mut a).unwrap();
        latin1.encode("é", &mut b).unwrap();
        assert_eq!(&a[..6], b"000002");
        assert_eq!(&b[..], b"000001\xe9");
        assert_eq!(Encoding::Latin1.decode(&b[6..]).unwrap(), "é");
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        let mut codec = FrameCodec::new(Encoding::Latin1);
        assert!(matches!(
            codec.encode("€", &mut BytesMut::new()),
            Err(CodecError::Encode(Encoding::Latin1))
        ));
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("latin1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!(Encoding::Utf8.to_string(), "utf-8");
    }
}
