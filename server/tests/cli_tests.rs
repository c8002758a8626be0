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

//! Exit codes of the `parrot-server` binary

use std::net::TcpListener;
use std::process::{Command, Output};

fn parrot_server(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parrot-server"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_missing_port_exits_1() {
    assert_eq!(parrot_server(&[]).status.code(), Some(1));
}

#[test]
fn test_invalid_port_exits_1() {
    assert_eq!(parrot_server(&["notaport"]).status.code(), Some(1));
    assert_eq!(parrot_server(&["70000"]).status.code(), Some(1));
}

#[test]
fn test_port_in_use_exits_2() {
    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port().to_string();

    assert_eq!(parrot_server(&[&port]).status.code(), Some(2));
}

#[test]
fn test_out_of_range_options_exit_2() {
    let output = parrot_server(&["0", "--max-clients", "2147483647"]);
    assert_eq!(output.status.code(), Some(2));

    let output = parrot_server(&["0", "--deadline", "18446744073709551615"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_drain_exits_0() {
    let output = parrot_server(&["0", "--deadline", "0"]);
    assert!(output.status.success());
}

#[test]
fn test_help_exits_0() {
    let output = parrot_server(&["--help"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--max-clients"));
}
