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

//! Client error types

use parrot_protocol::ProtocolError;
use std::io;
use std::time::Duration;

/// Exit code of the client binary on any failure
pub const EXIT_FAILURE: u8 = 255;

/// Client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server did not accept in time
    #[error("Connection timeout after {0:?}")]
    ConnectTimeout(Duration),

    /// The server went silent
    #[error("No command from server within {0:?}")]
    IdleTimeout(Duration),

    /// Configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Codec error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Whether the server refused the connection
    pub fn is_refused(&self) -> bool {
        match self {
            Self::Io(e) | Self::Protocol(ProtocolError::Io(e)) => {
                e.kind() == io::ErrorKind::ConnectionRefused
            }
            _ => false,
        }
    }
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
