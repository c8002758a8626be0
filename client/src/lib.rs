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

//! # Parrot Client
//!
//! Async client for the parrot protocol. It connects to a server on the
//! loopback interface, answers every `Send Text` with a reply payload and
//! stops when the server says `Quit` or closes the connection.
//!
//! Commands are NUL-terminated, and TCP may deliver several of them in one
//! read or split one across reads, so the client decodes them with
//! [`parrot_protocol::ControlCodec`] rather than trusting read boundaries.
//!
//! ## Quick Start
//!
//! ```no_run
//! use parrot_client::{ClientConfig, ProtocolClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(4000).with_reply("Polly wants a cracker");
//!     let report = ProtocolClient::new(config).run().await?;
//!     assert!(report.quit_received);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;

pub use client::{ClientReport, ProtocolClient};
pub use config::{CLIENT_HOST, ClientConfig, DEFAULT_CONNECT_TIMEOUT, default_reply};
pub use error::{ClientError, EXIT_FAILURE, Result};
