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

//! Handler traits and implementations for the Parrot server

use crate::ConnectionInfo;
use std::io;

/// Why a connection left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer closed its side
    PeerClosed,
    /// Reading from the peer failed
    ReadFailed(io::ErrorKind),
    /// Writing `Send Text` to the peer failed
    WriteFailed(io::ErrorKind),
    /// The server drained after its deadline
    Shutdown,
}

/// Server event handler trait
///
/// All methods run on the event loop thread and have default
/// implementations that do nothing. They must not block.
///
/// # Example
///
/// ```
/// use parrot_server::{ConnectionInfo, ServerHandler};
///
/// struct Printer;
///
/// impl ServerHandler for Printer {
///     fn on_payload(&mut self, info: &ConnectionInfo, payload: &[u8]) {
///         println!("{}: {}", info.id, String::from_utf8_lossy(payload));
///     }
/// }
/// ```
pub trait ServerHandler: Send + 'static {
    /// Called after a connection is registered and greeted
    fn on_connect(&mut self, _info: &ConnectionInfo) {}

    /// Called for every payload read from a client
    fn on_payload(&mut self, _info: &ConnectionInfo, _payload: &[u8]) {}

    /// Called once per connection during drain, after the `Quit` attempt
    fn on_quit(&mut self, _info: &ConnectionInfo, _delivered: bool) {}

    /// Called when a connection is removed from the registry
    fn on_disconnect(&mut self, _info: &ConnectionInfo, _reason: DisconnectReason) {}
}

/// Handler that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl ServerHandler for NoopHandler {}

type InfoCallback = Box<dyn FnMut(&ConnectionInfo) + Send + 'static>;
type PayloadCallback = Box<dyn FnMut(&ConnectionInfo, &[u8]) + Send + 'static>;
type QuitCallback = Box<dyn FnMut(&ConnectionInfo, bool) + Send + 'static>;
type DisconnectCallback = Box<dyn FnMut(&ConnectionInfo, DisconnectReason) + Send + 'static>;

/// Callback-based handler implementation
///
/// # Example
///
/// ```
/// use parrot_server::CallbackHandler;
///
/// let handler = CallbackHandler {
///     on_payload: Some(Box::new(|info, payload| {
///         println!("{} says {}", info.id, String::from_utf8_lossy(payload));
///     })),
///     ..Default::default()
/// };
/// ```
#[derive(Default)]
pub struct CallbackHandler {
    /// Called on connection establishment
    pub on_connect: Option<InfoCallback>,
    /// Called on every payload
    pub on_payload: Option<PayloadCallback>,
    /// Called on every quit attempt
    pub on_quit: Option<QuitCallback>,
    /// Called on removal
    pub on_disconnect: Option<DisconnectCallback>,
}

impl ServerHandler for CallbackHandler {
    fn on_connect(&mut self, info: &ConnectionInfo) {
        if let Some(f) = self.on_connect.as_mut() {
            f(info);
        }
    }

    fn on_payload(&mut self, info: &ConnectionInfo, payload: &[u8]) {
        if let Some(f) = self.on_payload.as_mut() {
            f(info, payload);
        }
    }

    fn on_quit(&mut self, info: &ConnectionInfo, delivered: bool) {
        if let Some(f) = self.on_quit.as_mut() {
            f(info, delivered);
        }
    }

    fn on_disconnect(&mut self, info: &ConnectionInfo, reason: DisconnectReason) {
        if let Some(f) = self.on_disconnect.as_mut() {
            f(info, reason);
        }
    }
}

impl std::fmt::Debug for CallbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandler")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_payload", &self.on_payload.is_some())
            .field("on_quit", &self.on_quit.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .finish()
    }
}
