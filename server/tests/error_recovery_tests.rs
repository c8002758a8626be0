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

//! Setup failures and per-connection error isolation

use parrot_server::{
    ConnectionInfo, DisconnectReason, EXIT_SETUP_FAILURE, START, Server, ServerConfig,
    ServerError, ServerHandler, Slot,
};
use socket2::Socket;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Handler that keeps connect and disconnect snapshots
#[derive(Clone, Default)]
struct Lifecycle {
    connected: Arc<Mutex<Vec<ConnectionInfo>>>,
    disconnected: Arc<Mutex<Vec<(ConnectionInfo, DisconnectReason)>>>,
}

impl Lifecycle {
    fn wait_for_disconnects(&self, count: usize) -> Vec<(ConnectionInfo, DisconnectReason)> {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(3) {
            let disconnected = self.disconnected.lock().unwrap();
            if disconnected.len() >= count {
                return disconnected.clone();
            }
            drop(disconnected);
            thread::sleep(Duration::from_millis(10));
        }
        panic!("timed out waiting for {} disconnects", count);
    }
}

impl ServerHandler for Lifecycle {
    fn on_connect(&mut self, info: &ConnectionInfo) {
        self.connected.lock().unwrap().push(*info);
    }

    fn on_disconnect(&mut self, info: &ConnectionInfo, reason: DisconnectReason) {
        self.disconnected.lock().unwrap().push((*info, reason));
    }
}

fn greeted(addr: std::net::SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = vec![0u8; START.len()];
    stream.read_exact(&mut buf).unwrap();
    assert_eq!(buf, START);
    stream
}

#[test]
fn test_port_in_use_is_fatal() {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let err = Server::bind(ServerConfig::new(port)).unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), EXIT_SETUP_FAILURE);
}

#[test]
fn test_invalid_config_is_rejected_before_binding() {
    let err = Server::bind(ServerConfig::new(0).with_max_clients(0)).unwrap_err();
    assert!(matches!(err, ServerError::InvalidConfig(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_reset_peer_is_isolated() {
    let handler = Lifecycle::default();
    let config = ServerConfig::new(0).with_shutdown_deadline(Duration::from_secs(1));
    let mut server = Server::bind(config).unwrap().with_handler(handler.clone());
    let addr = server.local_addr();
    let handle = thread::spawn(move || server.run());

    let survivor = greeted(addr);
    let victim = greeted(addr);

    // Linger of zero turns close into a reset
    let victim = Socket::from(victim);
    victim.set_linger(Some(Duration::ZERO)).unwrap();
    drop(victim);

    let disconnected = handler.wait_for_disconnects(1);
    assert!(matches!(
        disconnected[0].1,
        DisconnectReason::ReadFailed(ErrorKind::ConnectionReset)
    ));

    let mut survivor = survivor;
    let mut rest = Vec::new();
    survivor.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"Quit\0");

    let report = handle.join().unwrap().unwrap();
    assert_eq!(report.read_errors, 1);
    assert_eq!(report.quits_sent, 1);
    assert_eq!(report.total_connections, 2);
}

#[test]
fn test_slot_is_reused_after_disconnect() {
    let handler = Lifecycle::default();
    let config = ServerConfig::new(0)
        .with_max_clients(1)
        .with_shutdown_deadline(Duration::from_secs(1));
    let mut server = Server::bind(config).unwrap().with_handler(handler.clone());
    let addr = server.local_addr();
    let handle = thread::spawn(move || server.run());

    let first = greeted(addr);
    drop(first);
    handler.wait_for_disconnects(1);

    let mut second = greeted(addr);
    second.write_all(b"again").unwrap();

    let mut rest = Vec::new();
    second.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"Quit\0");
    handle.join().unwrap().unwrap();

    let connected = handler.connected.lock().unwrap();
    assert_eq!(connected.len(), 2);
    assert_eq!(connected[0].slot, Slot::new(0));
    assert_eq!(connected[1].slot, Slot::new(0));
    assert_ne!(connected[0].id, connected[1].id);
}
