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

//! Error types for the Parrot server

use crate::ServerState;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Process exit code for a fatal setup failure
pub const EXIT_SETUP_FAILURE: u8 = 2;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created
    #[error("error on creating socket: {0}")]
    Socket(#[source] std::io::Error),

    /// The listening socket could not be bound
    #[error("error on binding socket to {address}: {source}")]
    Bind {
        /// Requested address
        address: SocketAddr,
        /// Underlying system error
        #[source]
        source: std::io::Error,
    },

    /// The listening socket could not start listening
    #[error("error on start listening: {0}")]
    Listen(#[source] std::io::Error),

    /// Other I/O error, e.g. while creating the poll instance
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration was rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The registry has no free slot
    #[error("Maximum connections ({0}) reached")]
    RegistryFull(usize),

    /// A lifecycle transition outside the legal path
    #[error("Illegal server transition from {from} to {to}")]
    IllegalTransition {
        /// Current state
        from: ServerState,
        /// Requested state
        to: ServerState,
    },
}

impl ServerError {
    /// Check if the error prevents the server from starting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServerError::Socket(_)
                | ServerError::Bind { .. }
                | ServerError::Listen(_)
                | ServerError::Io(_)
                | ServerError::InvalidConfig(_)
        )
    }

    /// Process exit code to report for this error
    pub fn exit_code(&self) -> u8 {
        EXIT_SETUP_FAILURE
    }
}
