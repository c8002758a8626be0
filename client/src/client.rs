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

//! Protocol client
//!
//! [`ProtocolClient`] answers every `Send Text` with its configured reply
//! and stops when told to `Quit` or when the server closes the connection.

use crate::{ClientConfig, ClientError, Result};
use futures::{SinkExt, StreamExt};
use parrot_protocol::{ControlCodec, ControlFrame, ServerCommand, payload_text};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// What happened during one conversation with the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientReport {
    /// Recognized commands received
    pub commands_seen: u64,
    /// Replies written
    pub replies_sent: u64,
    /// Replies that could not be written
    pub reply_failures: u64,
    /// Unrecognized frames that were ignored
    pub unknown_frames: u64,
    /// Whether the conversation ended with `Quit`
    pub quit_received: bool,
}

/// Parrot protocol client
///
/// # Example
///
/// ```no_run
/// use parrot_client::{ClientConfig, ProtocolClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ProtocolClient::new(ClientConfig::new(4000));
///     let report = client.run().await?;
///     println!("replied {} times", report.replies_sent);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProtocolClient {
    config: ClientConfig,
}

impl ProtocolClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect to the server and converse until `Quit` or EOF
    pub async fn run(&self) -> Result<ClientReport> {
        self.config.validate()?;
        let address = self.config.address();
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ClientError::ConnectTimeout(self.config.connect_timeout))??;

        info!(%address, "client: connected");
        self.converse(stream).await
    }

    /// Converse over an already established stream
    pub async fn converse<S>(&self, io: S) -> Result<ClientReport>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(io, ControlCodec::default());
        let mut report = ClientReport::default();

        loop {
            let next = match self.config.idle_timeout {
                Some(limit) => timeout(limit, framed.next())
                    .await
                    .map_err(|_| ClientError::IdleTimeout(limit))?,
                None => framed.next().await,
            };

            let Some(frame) = next else {
                info!("client: server closed the connection");
                break;
            };

            match frame? {
                ControlFrame::Command(ServerCommand::Start) => {
                    report.commands_seen += 1;
                    info!("client: received request send text");
                    match framed.send(self.config.reply.clone()).await {
                        Ok(()) => report.replies_sent += 1,
                        Err(e) => {
                            report.reply_failures += 1;
                            warn!("client: write error -> {}", e);
                        }
                    }
                }
                ControlFrame::Command(ServerCommand::Quit) => {
                    report.commands_seen += 1;
                    report.quit_received = true;
                    info!("client: received request to quit");
                    break;
                }
                ControlFrame::Unknown(frame) => {
                    report.unknown_frames += 1;
                    debug!(bytes = frame.len(), "client: ignoring {:?}", payload_text(&frame));
                }
            }
        }

        Ok(report)
    }
}
