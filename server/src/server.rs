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

//! Event loop and shutdown controller
//!
//! [`Server`] owns every descriptor. One thread runs [`Server::run`], which
//! alternates between a bounded wait on the [`Multiplexer`] and handling
//! what became ready:
//!
//! ```text
//! Listening ──run()──▶ Running ──deadline──▶ Draining ──▶ Terminated
//!                       │   ▲
//!                       └───┘ accept / read
//! ```
//!
//! Within one iteration, pending connections are accepted before ready
//! clients are read, and a connection accepted in an iteration is not read
//! until the next one.

use crate::clock::{Clock, Deadline, SystemClock};
use crate::multiplexer::{LISTENER, ReadySet, WaitOutcome, slot_token};
use crate::{
    Connection, ConnectionId, ConnectionRegistry, DisconnectReason, MetricsSnapshot, Multiplexer,
    NoopHandler, Result, ServerConfig, ServerError, ServerHandler, ServerMetrics, ServerState,
    Slot,
};
use mio::net::{TcpListener, TcpStream};
use parrot_protocol::{ProtocolDriver, ReadOutcome, ServerCommand, payload_text};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Longest single wait on the multiplexer
///
/// The deadline is re-checked against the clock at least this often, which
/// keeps injected clocks usable.
pub const MAX_WAIT_SLICE: Duration = Duration::from_millis(250);

/// Wait before retrying `accept` after a resource error
///
/// Readiness is edge-triggered, so connections left in the backlog do not
/// wake the loop again on their own.
pub const ACCEPT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Most unread input discarded per connection while draining
pub const DRAIN_DISCARD_LIMIT: usize = 64 * 1024;

/// Single-threaded select-style server
///
/// # Example
///
/// ```no_run
/// use parrot_server::{Server, ServerConfig};
/// use std::time::Duration;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::new(4000)
///         .with_max_clients(2)
///         .with_shutdown_deadline(Duration::from_secs(2));
///
///     let mut server = Server::bind(config)?;
///     let report = server.run()?;
///     println!("served {} clients", report.total_connections);
///     Ok(())
/// }
/// ```
pub struct Server<C: Clock = SystemClock> {
    config: ServerConfig,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    multiplexer: Multiplexer,
    registry: ConnectionRegistry<Connection>,
    driver: ProtocolDriver,
    handler: Box<dyn ServerHandler>,
    metrics: ServerMetrics,
    clock: C,
    state: ServerState,
    accepting: bool,
    retry_accept: bool,
    next_id: u64,
}

impl Server<SystemClock> {
    /// Create, bind and listen on the configured loopback address
    ///
    /// Any failure here is fatal; see [`ServerError::is_fatal`].
    pub fn bind(config: ServerConfig) -> Result<Self> {
        Self::bind_with_clock(config, SystemClock)
    }
}

impl<C: Clock> Server<C> {
    /// Like [`Server::bind`], measuring the deadline with `clock`
    pub fn bind_with_clock(config: ServerConfig, clock: C) -> Result<Self> {
        config.validate()?;

        let mut listener = open_listener(&config)?;
        let local_addr = listener.local_addr()?;

        let mut multiplexer = Multiplexer::new(config.max_clients + 1)?;
        multiplexer.watch(&mut listener, LISTENER)?;

        info!(
            address = %local_addr,
            max_clients = config.max_clients,
            deadline = ?config.shutdown_deadline,
            "Waiting clients..."
        );

        Ok(Self {
            registry: ConnectionRegistry::new(config.max_clients),
            driver: ProtocolDriver::new(config.buffer_size),
            config,
            listener: Some(listener),
            local_addr,
            multiplexer,
            handler: Box::new(NoopHandler),
            metrics: ServerMetrics::new(),
            clock,
            state: ServerState::Listening,
            accepting: true,
            retry_accept: false,
            next_id: 1,
        })
    }

    /// Replace the event handler
    pub fn with_handler(mut self, handler: impl ServerHandler) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Run until the deadline drains the server
    ///
    /// Returns the final metrics. Calling `run` a second time fails with
    /// [`ServerError::IllegalTransition`].
    pub fn run(&mut self) -> Result<MetricsSnapshot> {
        self.transition(ServerState::Running)?;
        let deadline = Deadline::after(self.clock.now(), self.config.shutdown_deadline);

        loop {
            let now = self.clock.now();
            if deadline.is_exhausted(now) {
                break;
            }
            let remaining = deadline.remaining(now);
            let slice = if self.retry_accept {
                ACCEPT_RETRY_INTERVAL
            } else {
                MAX_WAIT_SLICE
            };

            let ready = match self.multiplexer.wait(remaining.min(slice)) {
                WaitOutcome::Ready(ready) => ready,
                WaitOutcome::TimedOut => {
                    trace!(?remaining, "Wait timed out");
                    ReadySet::default()
                }
                WaitOutcome::Interrupted => {
                    trace!("Wait interrupted, retrying");
                    ReadySet::default()
                }
                WaitOutcome::Failed(e) => {
                    self.metrics.wait_error();
                    error!(error = %e, "server: couldn't select client -> {}", e);
                    ReadySet::default()
                }
            };
            if !ready.is_empty() || self.retry_accept {
                self.dispatch(&ready);
            }
        }

        self.transition(ServerState::Draining)?;
        self.drain();
        self.transition(ServerState::Terminated)?;

        info!(
            total_connections = self.metrics.snapshot().total_connections,
            "Server terminated"
        );
        Ok(self.metrics.snapshot())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the lifecycle state
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Get the number of registered connections
    pub fn connection_count(&self) -> usize {
        self.registry.count()
    }

    /// Get the number of watched descriptors, listener included
    pub fn watched_count(&self) -> usize {
        self.multiplexer.watched_count()
    }

    /// Whether the listener is currently watched
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Get a snapshot of the metrics so far
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    fn transition(&mut self, next: ServerState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ServerError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, "Server state change");
        self.state = next;
        Ok(())
    }

    fn next_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn dispatch(&mut self, ready: &ReadySet) {
        let fresh = if ready.listener_ready() || self.retry_accept {
            self.retry_accept = false;
            self.accept_pending()
        } else {
            Vec::new()
        };

        for slot in ready.client_slots() {
            if !fresh.contains(&slot) {
                self.service(slot);
            }
        }
    }

    /// Accept until the backlog is empty or the registry is full
    fn accept_pending(&mut self) -> Vec<Slot> {
        let mut fresh = Vec::new();

        loop {
            if self.registry.is_full() {
                self.pause_accepting();
                break;
            }
            let Some(listener) = self.listener.as_mut() else {
                break;
            };

            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    if let Some(slot) = self.register(stream, peer_addr) {
                        fresh.push(slot);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if is_per_connection_accept_error(e.kind()) => {
                    self.metrics.accept_error();
                    warn!(error = %e, "server: couldn't accept client -> {}", e);
                }
                Err(e) => {
                    // Out of descriptors or memory; the backlog is retried
                    // on the next iteration without waiting for a new edge
                    self.metrics.accept_error();
                    self.retry_accept = true;
                    warn!(error = %e, "server: couldn't accept client -> {}", e);
                    break;
                }
            }
        }

        fresh
    }

    /// Register, watch and greet a freshly accepted stream
    fn register(&mut self, stream: TcpStream, peer_addr: SocketAddr) -> Option<Slot> {
        let id = self.next_connection_id();
        let slot = match self.registry.add(Connection::new(stream, id, peer_addr)) {
            Ok(slot) => slot,
            Err(e) => {
                warn!(connection_id = %id, "server: couldn't register client -> {}", e);
                return None;
            }
        };
        let conn = self.registry.get_mut(slot)?;

        if let Err(e) = self.multiplexer.watch(conn.stream_mut(), slot_token(slot)) {
            self.metrics.accept_error();
            error!(connection_id = %id, %slot, "server: couldn't watch client -> {}", e);
            self.registry.remove(slot);
            return None;
        }
        self.metrics.connection_opened();
        info!(connection_id = %id, %slot, peer_addr = %peer_addr, "server: incoming connection");

        if let Err(e) = self.driver.send(conn.stream_mut(), ServerCommand::Start) {
            self.metrics.write_error();
            warn!(
                connection_id = %id,
                %slot,
                "server: couldn't start talking with client -> {}", e
            );
            self.remove(slot, DisconnectReason::WriteFailed(e.kind()));
            return None;
        }

        let info = conn.info(slot);
        self.handler.on_connect(&info);
        Some(slot)
    }

    /// Read everything a ready client has sent
    fn service(&mut self, slot: Slot) {
        loop {
            let Some(conn) = self.registry.get_mut(slot) else {
                return;
            };

            match self.driver.on_readable(conn.stream_mut()) {
                ReadOutcome::Payload(payload) => {
                    conn.record_payload(payload.len());
                    let info = conn.info(slot);
                    self.metrics.payload_received(payload.len());
                    debug!(
                        connection_id = %info.id,
                        %slot,
                        bytes = payload.len(),
                        "server: received {}",
                        payload_text(&payload)
                    );
                    self.handler.on_payload(&info, &payload);
                }
                ReadOutcome::Drained => return,
                ReadOutcome::PeerClosed => {
                    self.metrics.peer_closed();
                    info!(connection_id = %conn.id(), %slot, "server: client closed its connection");
                    self.remove(slot, DisconnectReason::PeerClosed);
                    return;
                }
                ReadOutcome::ReadError(e) => {
                    self.metrics.read_error();
                    warn!(
                        connection_id = %conn.id(),
                        %slot,
                        "server: couldn't read from client -> {}", e
                    );
                    self.remove(slot, DisconnectReason::ReadFailed(e.kind()));
                    return;
                }
            }
        }
    }

    /// Unwatch, unregister and close the connection in `slot`
    fn remove(&mut self, slot: Slot, reason: DisconnectReason) {
        let Some(mut conn) = self.registry.remove(slot) else {
            return;
        };
        if let Err(e) = self.multiplexer.unwatch(conn.stream_mut(), slot_token(slot)) {
            warn!(connection_id = %conn.id(), %slot, "server: couldn't unwatch client -> {}", e);
        }
        self.metrics.connection_closed();
        self.handler.on_disconnect(&conn.info(slot), reason);
        debug!(connection_id = %conn.id(), %slot, ?reason, "Connection removed");
        drop(conn);

        self.resume_accepting();
    }

    fn pause_accepting(&mut self) {
        if !self.accepting {
            return;
        }
        if let Some(listener) = self.listener.as_mut() {
            if let Err(e) = self.multiplexer.unwatch(listener, LISTENER) {
                warn!("server: couldn't pause accepting -> {}", e);
            }
        }
        self.accepting = false;
        self.metrics.accept_deferred();
        info!(
            max_clients = self.registry.capacity(),
            "Capacity reached, pausing accept"
        );
    }

    fn resume_accepting(&mut self) {
        if self.accepting || self.state != ServerState::Running || self.registry.is_full() {
            return;
        }
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        // Re-registering reports connections that queued up while paused
        match self.multiplexer.watch(listener, LISTENER) {
            Ok(()) => {
                self.accepting = true;
                info!("Slot freed, resuming accept");
            }
            Err(e) => error!("server: couldn't resume accepting -> {}", e),
        }
    }

    /// Send `Quit` to everyone, then close every descriptor
    fn drain(&mut self) {
        info!(
            connections = self.registry.count(),
            "Deadline reached, asking clients to quit"
        );

        let driver = &self.driver;
        let metrics = &mut self.metrics;
        let handler = &mut self.handler;
        self.registry.for_each_mut(|slot, conn| {
            conn.begin_closing();
            let delivered = match driver.send(conn.stream_mut(), ServerCommand::Quit) {
                Ok(()) => {
                    metrics.quit_sent();
                    true
                }
                Err(e) => {
                    metrics.quit_failed();
                    warn!(connection_id = %conn.id(), %slot, "server: couldn't quit client -> {}", e);
                    false
                }
            };
            handler.on_quit(&conn.info(slot), delivered);
        });

        for (slot, mut conn) in self.registry.drain() {
            if let Err(e) = self.multiplexer.unwatch(conn.stream_mut(), slot_token(slot)) {
                warn!(connection_id = %conn.id(), %slot, "server: couldn't unwatch client -> {}", e);
            }
            close_gracefully(&mut self.driver, &mut conn);
            self.metrics.connection_closed();
            self.handler
                .on_disconnect(&conn.info(slot), DisconnectReason::Shutdown);
        }

        if let Some(mut listener) = self.listener.take() {
            if let Err(e) = self.multiplexer.unwatch(&mut listener, LISTENER) {
                warn!("server: couldn't unwatch listener -> {}", e);
            }
        }
        self.accepting = false;
    }
}

impl<C: Clock> std::fmt::Debug for Server<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("state", &self.state)
            .field("connection_count", &self.connection_count())
            .field("accepting", &self.accepting)
            .finish()
    }
}

/// Create the listening socket
///
/// Each system call maps to its own error so the cause of a fatal setup
/// failure is reported precisely.
fn open_listener(config: &ServerConfig) -> Result<TcpListener> {
    let address = config.bind_address;
    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))
        .map_err(ServerError::Socket)?;
    socket
        .set_reuse_address(true)
        .map_err(ServerError::Socket)?;
    socket
        .bind(&address.into())
        .map_err(|source| ServerError::Bind { address, source })?;
    socket
        .listen(config.max_clients as i32)
        .map_err(ServerError::Listen)?;
    socket.set_nonblocking(true).map_err(ServerError::Socket)?;
    Ok(TcpListener::from_std(socket.into()))
}

/// Accept errors that concern only the connection being accepted
fn is_per_connection_accept_error(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::PermissionDenied
    )
}

/// Half-close after `Quit` and discard unread input
///
/// Closing a socket with unread data makes the kernel send a reset, which
/// can destroy the `Quit` still in flight. At most [`DRAIN_DISCARD_LIMIT`]
/// bytes are discarded. Returns the number of bytes discarded.
fn close_gracefully(driver: &mut ProtocolDriver, conn: &mut Connection) -> usize {
    if let Err(e) = conn.stream_mut().shutdown(Shutdown::Write) {
        debug!(connection_id = %conn.id(), error = %e, "Half-close failed");
        return 0;
    }
    let mut discarded = 0;
    while discarded < DRAIN_DISCARD_LIMIT {
        let ReadOutcome::Payload(payload) = driver.on_readable(conn.stream_mut()) else {
            break;
        };
        discarded += payload.len();
    }
    if discarded > 0 {
        debug!(
            connection_id = %conn.id(),
            bytes = discarded,
            "Discarded input received after deadline"
        );
    }
    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::thread;
    use tracing_test::traced_test;

    fn config(deadline: Duration) -> ServerConfig {
        ServerConfig::new(0).with_shutdown_deadline(deadline)
    }

    #[test]
    fn test_bind_leaves_server_listening() {
        let server = Server::bind(config(Duration::ZERO)).unwrap();
        assert_eq!(server.state(), ServerState::Listening);
        assert_eq!(server.watched_count(), 1);
        assert!(server.is_accepting());
        assert_eq!(server.connection_count(), 0);
        assert_ne!(server.local_addr().port(), 0);
    }

    #[test]
    fn test_zero_deadline_drains_immediately() {
        let mut server = Server::bind(config(Duration::ZERO)).unwrap();
        let report = server.run().unwrap();

        assert_eq!(report.total_connections, 0);
        assert_eq!(server.state(), ServerState::Terminated);
        assert_eq!(server.watched_count(), 0);
        assert!(!server.is_accepting());
    }

    #[test]
    fn test_transitions_are_checked() {
        let mut server = Server::bind(config(Duration::ZERO)).unwrap();
        let err = server.transition(ServerState::Terminated).unwrap_err();
        assert!(matches!(err, ServerError::IllegalTransition { .. }));
        assert_eq!(server.state(), ServerState::Listening);
    }

    fn read_all(stream: std::net::TcpStream) -> thread::JoinHandle<Vec<u8>> {
        thread::spawn(move || {
            let mut stream = stream;
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        })
    }

    #[test]
    fn test_accept_error_classification() {
        assert!(is_per_connection_accept_error(ErrorKind::ConnectionAborted));
        assert!(is_per_connection_accept_error(ErrorKind::ConnectionReset));
        assert!(!is_per_connection_accept_error(ErrorKind::OutOfMemory));
        assert!(!is_per_connection_accept_error(ErrorKind::Other));
    }

    #[test]
    fn test_backlog_is_retried_without_new_readiness() {
        let mut server = Server::bind(config(Duration::from_millis(600))).unwrap();
        let addr = server.local_addr();

        // Clients queue up while no readiness can be reported, as after an
        // accept that failed for lack of descriptors
        if let Some(listener) = server.listener.as_mut() {
            server.multiplexer.unwatch(listener, LISTENER).unwrap();
        }
        let readers: Vec<_> = (0..2)
            .map(|_| read_all(std::net::TcpStream::connect(addr).unwrap()))
            .collect();
        server.retry_accept = true;

        let report = server.run().unwrap();
        assert_eq!(report.total_connections, 2);
        assert_eq!(report.quits_sent, 2);
        for reader in readers {
            assert_eq!(reader.join().unwrap(), b"Send Text\0Quit\0");
        }
    }

    #[test]
    fn test_drain_discard_is_bounded() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut peer = std::net::TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, peer_addr) = listener.accept().unwrap();
        accepted.set_nonblocking(true).unwrap();
        let mut conn = Connection::new(
            TcpStream::from_std(accepted),
            ConnectionId::new(1),
            peer_addr,
        );

        // A peer that never stops writing
        let flood = thread::spawn(move || {
            let chunk = [b'x'; 16 * 1024];
            while peer.write_all(&chunk).is_ok() {}
        });
        thread::sleep(Duration::from_millis(100));

        let mut driver = ProtocolDriver::new(4096);
        let discarded = close_gracefully(&mut driver, &mut conn);
        assert!(discarded > 0);
        assert!(discarded < DRAIN_DISCARD_LIMIT + driver.buffer_size());

        drop(conn);
        flood.join().unwrap();
    }

    #[traced_test]
    #[test]
    fn test_drain_is_logged() {
        let mut server = Server::bind(config(Duration::from_millis(500))).unwrap();
        let addr = server.local_addr();

        let client = thread::spawn(move || {
            let mut stream = std::net::TcpStream::connect(addr).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).unwrap();
            received
        });

        let report = server.run().unwrap();
        assert_eq!(report.quits_sent, 1);
        assert_eq!(client.join().unwrap(), b"Send Text\0Quit\0");

        assert!(logs_contain("server: incoming connection"));
        assert!(logs_contain("Deadline reached, asking clients to quit"));
        assert!(logs_contain("Server terminated"));
    }
}
