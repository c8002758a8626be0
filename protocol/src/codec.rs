//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Stream codec for server commands
//!
//! TCP does not preserve write boundaries, so a client may receive
//! `"Send Text\0Quit\0"` in a single read or a command split across two
//! reads. [`ControlCodec`] reassembles terminator-delimited frames and
//! classifies each one.

use crate::{MAX_PAYLOAD, ProtocolError, ServerCommand, TERMINATOR};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// A decoded frame from the server side of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// A recognized command
    Command(ServerCommand),
    /// Anything else; clients ignore these
    Unknown(Bytes),
}

impl ControlFrame {
    fn classify(frame: Bytes) -> Self {
        match ServerCommand::parse(&frame) {
            Some(command) => Self::Command(command),
            None => Self::Unknown(frame),
        }
    }
}

/// Codec splitting server traffic into [`ControlFrame`]s and encoding both
/// commands and client payloads
#[derive(Debug, Clone)]
pub struct ControlCodec {
    max_frame: usize,
}

impl Default for ControlCodec {
    fn default() -> Self {
        Self::new(MAX_PAYLOAD)
    }
}

impl ControlCodec {
    /// Create a codec that gives up on unterminated frames past `max_frame`
    pub fn new(max_frame: usize) -> Self {
        Self { max_frame }
    }

    /// Largest frame the codec buffers or encodes
    pub fn max_frame(&self) -> usize {
        self.max_frame
    }
}

impl Decoder for ControlCodec {
    type Item = ControlFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(position) = src.iter().position(|byte| *byte == TERMINATOR) {
            let frame = src.split_to(position + 1).freeze();
            return Ok(Some(ControlFrame::classify(frame)));
        }

        // Unterminated and oversized: flush it out as noise
        if src.len() > self.max_frame {
            return Ok(Some(ControlFrame::Unknown(src.split().freeze())));
        }

        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Ok(Some(ControlFrame::classify(src.split().freeze()))),
        }
    }
}

impl Encoder<ServerCommand> for ControlCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: ServerCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}

impl Encoder<Bytes> for ControlCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame {
            return Err(ProtocolError::PayloadTooLarge {
                size: item.len(),
                max: self.max_frame,
            });
        }
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut ControlCodec, buf: &mut BytesMut) -> Vec<ControlFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_decode_coalesced_commands() {
        let mut codec = ControlCodec::default();
        let mut buf = BytesMut::from(&b"Send Text\0Quit\0"[..]);

        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(
            frames,
            vec![
                ControlFrame::Command(ServerCommand::Start),
                ControlFrame::Command(ServerCommand::Quit),
            ]
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_split_command() {
        let mut codec = ControlCodec::default();
        let mut buf = BytesMut::from(&b"Send T"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"ext\0");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(ControlFrame::Command(ServerCommand::Start))
        );
    }

    #[test]
    fn test_decode_unknown_frame() {
        let mut codec = ControlCodec::default();
        let mut buf = BytesMut::from(&b"Hello\0Quit\0"[..]);

        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], ControlFrame::Unknown(Bytes::from_static(b"Hello\0")));
        assert_eq!(frames[1], ControlFrame::Command(ServerCommand::Quit));
    }

    #[test]
    fn test_decode_oversized_unterminated() {
        let mut codec = ControlCodec::new(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);

        match codec.decode(&mut buf).unwrap() {
            Some(ControlFrame::Unknown(frame)) => assert_eq!(frame.len(), 10),
            other => panic!("unexpected frame: {:?}", other),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_eof_unterminated_command() {
        let mut codec = ControlCodec::default();
        let mut buf = BytesMut::from(&b"Quit"[..]);

        assert_eq!(
            codec.decode_eof(&mut buf).unwrap(),
            Some(ControlFrame::Command(ServerCommand::Quit))
        );
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_encode_command_and_payload() {
        let mut codec = ControlCodec::default();
        let mut dst = BytesMut::new();

        codec.encode(ServerCommand::Start, &mut dst).unwrap();
        codec.encode(Bytes::from_static(b"hello"), &mut dst).unwrap();
        assert_eq!(&dst[..], b"Send Text\0hello");
    }

    #[test]
    fn test_encode_payload_too_large() {
        let mut codec = ControlCodec::new(4);
        let mut dst = BytesMut::new();

        let err = codec.encode(Bytes::from_static(b"hello"), &mut dst).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge { size: 5, max: 4 }));
        assert!(dst.is_empty());
    }
}
