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

//! Parrot client binary
//!
//! ## Usage
//!
//! ```bash
//! parrot-client 4000
//! ```
//!
//! Exits with `255` when the port is missing or the conversation fails.

use clap::Parser;
use clap::error::ErrorKind;
use parrot_client::{ClientConfig, EXIT_FAILURE, ProtocolClient};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parrot-client")]
#[command(about = "Connects to a parrot server on loopback and answers its requests")]
struct Cli {
    /// Server port on 127.0.0.1
    port: u16,

    /// Reply text instead of the default
    #[arg(long)]
    reply: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_FAILURE),
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pid = std::process::id();
    let mut config = ClientConfig::new(cli.port);
    if let Some(reply) = cli.reply {
        config = config.with_reply(reply);
    }

    info!("client({}): running...", pid);
    let result = ProtocolClient::new(config).run().await;
    info!("client({}): stopping...", pid);

    match result {
        Ok(report) => {
            info!(
                commands = report.commands_seen,
                replies = report.replies_sent,
                quit = report.quit_received,
                "client({}): done", pid
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("client({}): {}", pid, e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
