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

//! Server metrics
//!
//! Every event is counted twice: in the `metrics` facade for whatever
//! recorder the process installs, and in plain fields that [`Server::run`]
//! returns as a [`MetricsSnapshot`].
//!
//! [`Server::run`]: crate::Server::run

use metrics::{counter, gauge};
use std::time::{Duration, Instant};

/// Server metrics owned by the event loop
#[derive(Debug)]
pub struct ServerMetrics {
    // Connection counts
    total_connections: u64,
    active_connections: u64,
    peer_closed: u64,
    deferred_accepts: u64,

    // Throughput
    payloads_received: u64,
    bytes_received: u64,

    // Drain
    quits_sent: u64,
    quits_failed: u64,

    // Errors
    accept_errors: u64,
    read_errors: u64,
    write_errors: u64,
    wait_errors: u64,

    started_at: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_connections: 0,
            active_connections: 0,
            peer_closed: 0,
            deferred_accepts: 0,
            payloads_received: 0,
            bytes_received: 0,
            quits_sent: 0,
            quits_failed: 0,
            accept_errors: 0,
            read_errors: 0,
            write_errors: 0,
            wait_errors: 0,
            started_at: Instant::now(),
        }
    }

    // Connection tracking

    /// Record a connection being registered
    pub fn connection_opened(&mut self) {
        self.total_connections += 1;
        self.active_connections += 1;
        counter!("parrot.connections.accepted").increment(1);
        gauge!("parrot.connections.active").increment(1.0);
    }

    /// Record a connection leaving the registry
    pub fn connection_closed(&mut self) {
        self.active_connections = self.active_connections.saturating_sub(1);
        gauge!("parrot.connections.active").decrement(1.0);
    }

    /// Record an orderly close by the peer
    pub fn peer_closed(&mut self) {
        self.peer_closed += 1;
        counter!("parrot.connections.peer_closed").increment(1);
    }

    /// Record that accepting was paused because the registry is full
    pub fn accept_deferred(&mut self) {
        self.deferred_accepts += 1;
        counter!("parrot.accept.deferred").increment(1);
    }

    // Throughput

    /// Record a payload read from a client
    pub fn payload_received(&mut self, bytes: usize) {
        self.payloads_received += 1;
        self.bytes_received += bytes as u64;
        counter!("parrot.payloads.received").increment(1);
        counter!("parrot.bytes.received").increment(bytes as u64);
    }

    // Drain

    /// Record a `Quit` written during drain
    pub fn quit_sent(&mut self) {
        self.quits_sent += 1;
        counter!("parrot.quit.sent").increment(1);
    }

    /// Record a `Quit` that could not be written
    pub fn quit_failed(&mut self) {
        self.quits_failed += 1;
        counter!("parrot.quit.failed").increment(1);
    }

    // Errors

    /// Record a failed accept
    pub fn accept_error(&mut self) {
        self.accept_errors += 1;
        counter!("parrot.errors.accept").increment(1);
    }

    /// Record a failed read
    pub fn read_error(&mut self) {
        self.read_errors += 1;
        counter!("parrot.errors.read").increment(1);
    }

    /// Record a failed `Send Text` write
    pub fn write_error(&mut self) {
        self.write_errors += 1;
        counter!("parrot.errors.write").increment(1);
    }

    /// Record a failed wait on the multiplexer
    pub fn wait_error(&mut self) {
        self.wait_errors += 1;
        counter!("parrot.errors.wait").increment(1);
    }

    /// Get the current number of active connections
    pub fn active_connections(&self) -> u64 {
        self.active_connections
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections,
            active_connections: self.active_connections,
            peer_closed: self.peer_closed,
            deferred_accepts: self.deferred_accepts,
            payloads_received: self.payloads_received,
            bytes_received: self.bytes_received,
            quits_sent: self.quits_sent,
            quits_failed: self.quits_failed,
            accept_errors: self.accept_errors,
            read_errors: self.read_errors,
            write_errors: self.write_errors,
            wait_errors: self.wait_errors,
            uptime: self.started_at.elapsed(),
        }
    }
}

/// A snapshot of server metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Connections registered since start
    pub total_connections: u64,
    /// Connections currently registered
    pub active_connections: u64,
    /// Connections closed by their peer
    pub peer_closed: u64,
    /// Times accepting was paused at capacity
    pub deferred_accepts: u64,
    /// Payloads received
    pub payloads_received: u64,
    /// Payload bytes received
    pub bytes_received: u64,
    /// `Quit` commands written
    pub quits_sent: u64,
    /// `Quit` commands that failed
    pub quits_failed: u64,
    /// Failed accepts
    pub accept_errors: u64,
    /// Failed reads
    pub read_errors: u64,
    /// Failed writes
    pub write_errors: u64,
    /// Failed waits
    pub wait_errors: u64,
    /// Time since the metrics were created
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Number of `Quit` attempts made during drain
    pub fn quit_attempts(&self) -> u64 {
        self.quits_sent + self.quits_failed
    }

    /// Calculate total error count
    pub fn total_errors(&self) -> u64 {
        self.accept_errors + self.read_errors + self.write_errors + self.wait_errors
    }
}
