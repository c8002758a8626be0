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

//! # Parrot Server
//!
//! A single-threaded TCP server that multiplexes up to a fixed number of
//! clients over one readiness wait, greets each of them with `Send Text`,
//! logs whatever they answer, and after a fixed wall-clock deadline tells
//! every remaining client to `Quit` before closing all descriptors.
//!
//! # Architecture
//!
//! ```text
//! Server (event loop, lifecycle, drain)
//!     ├── Multiplexer        mio::Poll + watched token set
//!     ├── ConnectionRegistry fixed-capacity arena of Connection
//!     └── ProtocolDriver     one read → Payload | PeerClosed | ReadError
//! ```
//!
//! There is no locking: the thread that calls [`Server::run`] owns every
//! socket and all bookkeeping.
//!
//! # Example
//!
//! ```no_run
//! use parrot_server::{CallbackHandler, Server, ServerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handler = CallbackHandler {
//!         on_payload: Some(Box::new(|info, payload| {
//!             println!("{}: {}", info.id, String::from_utf8_lossy(payload));
//!         })),
//!         ..Default::default()
//!     };
//!
//!     let mut server = Server::bind(ServerConfig::new(4000))?.with_handler(handler);
//!     server.run()?;
//!     Ok(())
//! }
//! ```

mod clock;
mod config;
mod connection;
mod error;
mod handler;
mod metrics;
mod multiplexer;
mod registry;
mod server;
mod types;

pub use clock::{Clock, Deadline, ManualClock, SystemClock};
pub use config::{
    DEFAULT_MAX_CLIENTS, DEFAULT_SHUTDOWN_DEADLINE, MAX_CLIENTS_LIMIT, MAX_SHUTDOWN_DEADLINE,
    ServerConfig,
};
pub use connection::{Connection, ConnectionInfo};
pub use error::{EXIT_SETUP_FAILURE, Result, ServerError};
pub use handler::{CallbackHandler, DisconnectReason, NoopHandler, ServerHandler};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use multiplexer::{LISTENER, Multiplexer, ReadySet, WaitOutcome, slot_token};
pub use registry::ConnectionRegistry;
pub use server::{ACCEPT_RETRY_INTERVAL, DRAIN_DISCARD_LIMIT, MAX_WAIT_SLICE, Server};
pub use types::{ConnectionId, ConnectionState, ServerState, Slot};

pub use parrot_protocol::{MAX_PAYLOAD, QUIT, START, ServerCommand};
