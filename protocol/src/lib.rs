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

//! # Parrot Protocol
//!
//! The wire vocabulary shared by the Parrot server and client.
//!
//! The protocol has exactly two control commands, both sent by the server as
//! fixed NUL-terminated byte strings, and one free-text payload sent by the
//! client in response to the first of them:
//!
//! ```text
//! server                              client
//!   | ---- "Send Text\0" (10 bytes) ---> |
//!   | <--- free text (<= 4096 bytes) --- |
//!   |              ...                   |
//!   | ---- "Quit\0" (5 bytes) ---------> |
//! ```
//!
//! - [`ServerCommand`] names the two commands and their literal bytes.
//! - [`ControlCodec`] is a `tokio_util` codec that splits a byte stream into
//!   commands, for peers that may receive several commands in one read.
//! - [`ProtocolDriver`] performs one non-blocking read on a ready socket and
//!   classifies the outcome for the server's event loop.
//!
//! # Example
//!
//! ```
//! use parrot_protocol::{ProtocolDriver, ReadOutcome};
//! use std::io::Cursor;
//!
//! let mut driver = ProtocolDriver::default();
//! let mut peer = Cursor::new(b"hello".to_vec());
//!
//! assert!(matches!(driver.on_readable(&mut peer), ReadOutcome::Payload(p) if &p[..] == b"hello"));
//! assert!(matches!(driver.on_readable(&mut peer), ReadOutcome::PeerClosed));
//! ```

mod codec;
mod command;
mod driver;
mod result;

pub use codec::{ControlCodec, ControlFrame};
pub use command::{MAX_PAYLOAD, QUIT, START, ServerCommand, TERMINATOR, payload_text};
pub use driver::{ProtocolDriver, ReadOutcome};
pub use result::{ProtocolError, ProtocolResult};
