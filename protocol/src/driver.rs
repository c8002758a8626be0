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

//! Protocol driver
//!
//! The driver owns the read buffer and turns one read on a ready socket into
//! a [`ReadOutcome`]. It never decides what happens to the connection; the
//! event loop does that from the outcome.

use crate::{MAX_PAYLOAD, ServerCommand};
use bytes::Bytes;
use std::io::{self, ErrorKind, Read, Write};
use tracing::trace;

/// Result of one read on a readable socket
#[derive(Debug)]
pub enum ReadOutcome {
    /// The peer sent a non-empty payload
    Payload(Bytes),
    /// The peer closed its side (zero-length read)
    PeerClosed,
    /// The read failed
    ReadError(io::Error),
    /// No more data is available for this readiness notification
    Drained,
}

/// Reads payloads and writes commands for the server side of a connection
#[derive(Debug)]
pub struct ProtocolDriver {
    buffer: Vec<u8>,
}

impl Default for ProtocolDriver {
    fn default() -> Self {
        Self::new(MAX_PAYLOAD)
    }
}

impl ProtocolDriver {
    /// Create a driver whose reads return at most `buffer_size` bytes
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer: vec![0; buffer_size.max(1)],
        }
    }

    /// Size of the read buffer
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Perform one read on a socket reported readable
    ///
    /// `EINTR` is retried; every other error is reported as
    /// [`ReadOutcome::ReadError`].
    pub fn on_readable<R: Read>(&mut self, reader: &mut R) -> ReadOutcome {
        loop {
            match reader.read(&mut self.buffer) {
                Ok(0) => return ReadOutcome::PeerClosed,
                Ok(n) => return ReadOutcome::Payload(Bytes::copy_from_slice(&self.buffer[..n])),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return ReadOutcome::Drained,
                Err(e) if e.kind() == ErrorKind::Interrupted => trace!("Read interrupted, retrying"),
                Err(e) => return ReadOutcome::ReadError(e),
            }
        }
    }

    /// Write a command to a socket
    pub fn send<W: Write>(&self, writer: &mut W, command: ServerCommand) -> io::Result<()> {
        trace!(%command, "Sending command");
        writer.write_all(command.as_bytes())?;
        writer.flush()
    }
}
