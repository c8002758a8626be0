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

//! Exit codes of the `parrot-client` binary

use std::io::{Read, Write};
use std::net::TcpListener;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

fn parrot_client(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parrot-client"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_missing_port_exits_255() {
    assert_eq!(parrot_client(&[]).status.code(), Some(255));
}

#[test]
fn test_port_zero_exits_255() {
    assert_eq!(parrot_client(&["0"]).status.code(), Some(255));
}

#[test]
fn test_refused_connection_exits_255() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    drop(listener);

    assert_eq!(parrot_client(&[&port]).status.code(), Some(255));
}

#[test]
fn test_conversation_exits_0() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(b"Send Text\0").unwrap();
        let mut reply = [0u8; 6];
        stream.read_exact(&mut reply).unwrap();
        stream.write_all(b"Quit\0").unwrap();
        reply
    });

    let output = parrot_client(&[&port, "--reply", "squawk"]);
    assert!(output.status.success());
    assert_eq!(&server.join().unwrap(), b"squawk");
}
