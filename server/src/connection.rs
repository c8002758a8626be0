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

//! Registered client connection

use crate::{ConnectionId, ConnectionState, Slot};
use mio::net::TcpStream;
use std::net::SocketAddr;
use std::time::Instant;

/// A client connection owned by the registry
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    id: ConnectionId,
    peer_addr: SocketAddr,
    state: ConnectionState,
    created_at: Instant,
    bytes_received: u64,
    payloads_received: u64,
}

impl Connection {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream, id: ConnectionId, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            id,
            peer_addr,
            state: ConnectionState::Greeted,
            created_at: Instant::now(),
            bytes_received: 0,
            payloads_received: 0,
        }
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Get the protocol state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the underlying stream
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Record a received payload
    pub fn record_payload(&mut self, len: usize) {
        self.bytes_received += len as u64;
        self.payloads_received += 1;
        self.state = ConnectionState::Responded;
    }

    /// Mark the connection as being closed by the server
    pub fn begin_closing(&mut self) {
        self.state = ConnectionState::Closing;
    }

    /// Snapshot for handlers, tagged with the slot it occupies
    pub fn info(&self, slot: Slot) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            slot,
            peer_addr: self.peer_addr,
            state: self.state,
            created_at: self.created_at,
            bytes_received: self.bytes_received,
            payloads_received: self.payloads_received,
        }
    }
}

/// Connection information snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Registry slot
    pub slot: Slot,
    /// Peer address
    pub peer_addr: SocketAddr,
    /// Protocol state
    pub state: ConnectionState,
    /// When the connection was accepted
    pub created_at: Instant,
    /// Total payload bytes received
    pub bytes_received: u64,
    /// Number of payloads received
    pub payloads_received: u64,
}
