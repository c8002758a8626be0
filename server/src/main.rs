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

//! Parrot server binary
//!
//! ## Usage
//!
//! ```bash
//! parrot-server 4000
//! parrot-server 4000 --max-clients 2 --deadline 2
//! ```
//!
//! Exits with `1` when the port is missing or invalid and with `2` when the
//! listening socket cannot be set up.

use clap::Parser;
use clap::error::ErrorKind;
use parrot_protocol::payload_text;
use parrot_server::{CallbackHandler, DEFAULT_MAX_CLIENTS, Server, ServerConfig};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code for a missing or invalid port argument
const EXIT_BAD_ARGUMENT: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "parrot-server")]
#[command(about = "Greets loopback clients, prints their replies and tells them to quit after a deadline")]
struct Cli {
    /// Port to listen on (loopback only)
    port: u16,

    /// Maximum number of concurrent clients
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS)]
    max_clients: usize,

    /// Seconds from start until clients are told to quit
    #[arg(long, default_value_t = 5)]
    deadline: u64,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_BAD_ARGUMENT),
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::new(cli.port)
        .with_max_clients(cli.max_clients)
        .with_shutdown_deadline(Duration::from_secs(cli.deadline));

    // Replies go to stdout, diagnostics to the log
    let handler = CallbackHandler {
        on_payload: Some(Box::new(|_, payload| println!("{}", payload_text(payload)))),
        ..Default::default()
    };

    let mut server = match Server::bind(config) {
        Ok(server) => server.with_handler(handler),
        Err(e) => {
            error!("server: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    match server.run() {
        Ok(report) => {
            info!(
                total_connections = report.total_connections,
                payloads = report.payloads_received,
                quits_sent = report.quits_sent,
                quits_failed = report.quits_failed,
                "server: done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("server: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
