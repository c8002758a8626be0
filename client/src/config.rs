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

//! Client configuration

use crate::{ClientError, Result};
use bytes::Bytes;
use parrot_protocol::{MAX_PAYLOAD, TERMINATOR};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Clients only ever talk to a server on this host
pub const CLIENT_HOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Default time allowed for the TCP handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The reply sent for every `Send Text`, prefixed with `pid`
pub fn default_reply(pid: u32) -> Bytes {
    Bytes::from(format!(
        "{}: It's not pining, it's passed on! This parrot is no more! It has ceased to be!\n\
         It's expired and gone to meet its maker! This is a late parrot! It's a stiff!\n\
         Bereft of life, it rests in peace! If you hadn't nailed it to the perch, it\n\
         would be pushing up the daisies!\n\
         It's rung down the curtain and joined the choir invisible. This is an ex-parrot!\n",
        pid
    ))
}

/// Parrot client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server port on the loopback interface
    pub port: u16,

    /// Payload sent in answer to `Send Text`
    pub reply: Bytes,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Give up when the server stays silent this long (None waits forever)
    pub idle_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration for the server on `port`
    pub fn new(port: u16) -> Self {
        Self {
            port,
            reply: default_reply(std::process::id()),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: None,
        }
    }

    /// Set the reply payload
    pub fn with_reply(mut self, reply: impl Into<Bytes>) -> Self {
        self.reply = reply.into();
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Address of the server
    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((CLIENT_HOST, self.port))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ClientError::InvalidConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.reply.len() > MAX_PAYLOAD {
            return Err(ClientError::InvalidConfig(format!(
                "reply of {} bytes exceeds the {} byte limit",
                self.reply.len(),
                MAX_PAYLOAD
            )));
        }

        if self.reply.contains(&TERMINATOR) {
            return Err(ClientError::InvalidConfig(
                "reply must not contain a NUL byte".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
