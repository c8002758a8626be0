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

//! Helpers for end-to-end tests that run a server and real clients together

use parrot_server::{CallbackHandler, MetricsSnapshot, Result, Server, ServerConfig};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// A server running its event loop on a dedicated thread
#[derive(Debug)]
pub struct RunningServer {
    addr: SocketAddr,
    handle: JoinHandle<Result<MetricsSnapshot>>,
}

impl RunningServer {
    /// Bind according to `config` and start the event loop
    pub fn spawn(config: ServerConfig, handler: CallbackHandler) -> Result<Self> {
        let mut server = Server::bind(config)?.with_handler(handler);
        let addr = server.local_addr();
        let handle = thread::spawn(move || server.run());
        Ok(Self { addr, handle })
    }

    /// Address the server listens on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Port the server listens on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the drain to finish
    pub fn join(self) -> thread::Result<Result<MetricsSnapshot>> {
        self.handle.join()
    }
}

/// Handler that keeps the text of every payload it sees
pub fn payload_collector() -> (CallbackHandler, Arc<Mutex<Vec<String>>>) {
    let payloads = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&payloads);
    let handler = CallbackHandler {
        on_payload: Some(Box::new(move |_, payload| {
            if let Ok(mut payloads) = sink.lock() {
                payloads.push(parrot_protocol::payload_text(payload));
            }
        })),
        ..Default::default()
    };
    (handler, payloads)
}
