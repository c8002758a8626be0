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

//! Server configuration

use crate::{Result, ServerError};
use parrot_protocol::MAX_PAYLOAD;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default number of concurrent clients
pub const DEFAULT_MAX_CLIENTS: usize = 5;

/// Default time between start and drain
pub const DEFAULT_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Largest accepted number of concurrent clients
///
/// Registry slots and poll events are allocated up front for every client.
pub const MAX_CLIENTS_LIMIT: usize = 4096;

/// Longest accepted shutdown deadline (one year)
pub const MAX_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Server configuration
///
/// Only the port is normally supplied by the caller; the listening address
/// is always loopback.
///
/// # Example
///
/// ```
/// use parrot_server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new(4000)
///     .with_max_clients(2)
///     .with_shutdown_deadline(Duration::from_secs(2));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent clients
    ///
    /// Also used as the listen backlog.
    pub max_clients: usize,

    /// Wall-clock time from start until the server drains
    ///
    /// The countdown is not reset by client activity.
    pub shutdown_deadline: Duration,

    /// Largest payload returned by a single read
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            max_clients: DEFAULT_MAX_CLIENTS,
            shutdown_deadline: DEFAULT_SHUTDOWN_DEADLINE,
            buffer_size: MAX_PAYLOAD,
        }
    }
}

impl ServerConfig {
    /// Create a configuration listening on loopback at `port`
    ///
    /// Port `0` lets the system pick a free port.
    pub fn new(port: u16) -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            ..Default::default()
        }
    }

    /// Set the maximum number of concurrent clients
    pub fn with_max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Set the shutdown deadline
    pub fn with_shutdown_deadline(mut self, deadline: Duration) -> Self {
        self.shutdown_deadline = deadline;
        self
    }

    /// Set the read buffer size
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.bind_address.ip().is_loopback() {
            return Err(ServerError::InvalidConfig(format!(
                "bind_address must be a loopback address, got {}",
                self.bind_address.ip()
            )));
        }

        if self.max_clients == 0 {
            return Err(ServerError::InvalidConfig(
                "max_clients must be greater than 0".to_string(),
            ));
        }

        if self.max_clients > MAX_CLIENTS_LIMIT {
            return Err(ServerError::InvalidConfig(format!(
                "max_clients must be at most {}, got {}",
                MAX_CLIENTS_LIMIT, self.max_clients
            )));
        }

        if self.shutdown_deadline > MAX_SHUTDOWN_DEADLINE {
            return Err(ServerError::InvalidConfig(format!(
                "shutdown_deadline must be at most {}s, got {}s",
                MAX_SHUTDOWN_DEADLINE.as_secs(),
                self.shutdown_deadline.as_secs()
            )));
        }

        if self.buffer_size == 0 {
            return Err(ServerError::InvalidConfig(
                "buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
