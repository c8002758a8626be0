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

//! Literal control commands

use std::fmt;

/// Terminator appended to every server command
pub const TERMINATOR: u8 = b'\0';

/// Invitation to send a payload, including its terminator
pub const START: &[u8] = b"Send Text\0";

/// Request to close the connection, including its terminator
pub const QUIT: &[u8] = b"Quit\0";

/// Largest payload a single read will return
pub const MAX_PAYLOAD: usize = 4096;

/// Commands the server sends to its clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerCommand {
    /// Invite the client to send its payload (`"Send Text"`)
    Start,
    /// Ask the client to close its connection and exit (`"Quit"`)
    Quit,
}

impl ServerCommand {
    /// The exact bytes written to the socket, terminator included
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Start => START,
            Self::Quit => QUIT,
        }
    }

    /// The command text without its terminator
    pub fn text(self) -> &'static str {
        match self {
            Self::Start => "Send Text",
            Self::Quit => "Quit",
        }
    }

    /// Match a frame against the command vocabulary
    ///
    /// The frame may or may not carry its terminator. Anything that is not an
    /// exact command yields `None`; clients ignore such content.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let frame = frame.strip_suffix(&[TERMINATOR]).unwrap_or(frame);
        [Self::Start, Self::Quit]
            .into_iter()
            .find(|command| command.text().as_bytes() == frame)
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Render a client payload for logging
///
/// Invalid UTF-8 is replaced, trailing terminators and line breaks are
/// dropped.
pub fn payload_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_end_matches(['\0', '\r', '\n'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lengths() {
        assert_eq!(ServerCommand::Start.as_bytes().len(), 10);
        assert_eq!(ServerCommand::Quit.as_bytes().len(), 5);
        assert_eq!(ServerCommand::Start.as_bytes().last(), Some(&TERMINATOR));
    }

    #[test]
    fn test_parse_with_and_without_terminator() {
        assert_eq!(ServerCommand::parse(b"Send Text\0"), Some(ServerCommand::Start));
        assert_eq!(ServerCommand::parse(b"Send Text"), Some(ServerCommand::Start));
        assert_eq!(ServerCommand::parse(b"Quit"), Some(ServerCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_near_misses() {
        assert_eq!(ServerCommand::parse(b"quit"), None);
        assert_eq!(ServerCommand::parse(b"Quit\0\0"), None);
        assert_eq!(ServerCommand::parse(b"Send"), None);
        assert_eq!(ServerCommand::parse(b""), None);
    }

    #[test]
    fn test_payload_text() {
        assert_eq!(payload_text(b"hello\n"), "hello");
        assert_eq!(payload_text(b"hello\0"), "hello");
        assert_eq!(payload_text(b"two\nlines\r\n"), "two\nlines");
        assert_eq!(payload_text(&[0x66, 0xff, 0x6f]), "f\u{fffd}o");
    }
}
