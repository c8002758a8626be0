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

//! Readiness multiplexer
//!
//! Thin wrapper over [`mio::Poll`] that also remembers which tokens are
//! watched, so "registered exactly once" can be checked instead of assumed.
//! Client sockets use their slot index as token; the listener uses
//! [`LISTENER`].

use crate::Slot;
use mio::event::Source;
use mio::{Events, Interest, Poll, Token};
use std::collections::HashSet;
use std::io::{self, ErrorKind};
use std::time::Duration;
use tracing::trace;

/// Token of the listening socket
pub const LISTENER: Token = Token(usize::MAX);

/// Token of the client socket registered in `slot`
pub fn slot_token(slot: Slot) -> Token {
    Token(slot.index())
}

/// Tokens reported ready by a single wait
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadySet {
    tokens: Vec<Token>,
}

impl ReadySet {
    /// Build a ready set from explicit tokens
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Whether `token` is ready
    pub fn contains(&self, token: Token) -> bool {
        self.tokens.contains(&token)
    }

    /// Whether the listener has pending connections
    pub fn listener_ready(&self) -> bool {
        self.contains(LISTENER)
    }

    /// Client slots that are ready, in report order
    pub fn client_slots(&self) -> Vec<Slot> {
        self.tokens
            .iter()
            .filter(|token| **token != LISTENER)
            .map(|Token(index)| Slot::new(*index))
            .collect()
    }

    /// Number of ready tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing is ready
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Why a wait returned
#[derive(Debug)]
pub enum WaitOutcome {
    /// At least one watched descriptor is readable
    Ready(ReadySet),
    /// The timeout elapsed with nothing ready
    TimedOut,
    /// A signal interrupted the wait; not a timeout
    Interrupted,
    /// The wait itself failed
    Failed(io::Error),
}

/// Watches descriptors for readability
#[derive(Debug)]
pub struct Multiplexer {
    poll: Poll,
    events: Events,
    watched: HashSet<Token>,
}

impl Multiplexer {
    /// Create a multiplexer that reports up to `event_capacity` events per wait
    pub fn new(event_capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(event_capacity.max(1)),
            watched: HashSet::new(),
        })
    }

    /// Start watching `source` for readability under `token`
    ///
    /// Watching a token twice is rejected with `AlreadyExists`.
    pub fn watch<S>(&mut self, source: &mut S, token: Token) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        if self.watched.contains(&token) {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("token {} is already watched", token.0),
            ));
        }
        self.poll
            .registry()
            .register(source, token, Interest::READABLE)?;
        self.watched.insert(token);
        trace!(token = token.0, "Watching descriptor");
        Ok(())
    }

    /// Stop watching `source`
    ///
    /// Unwatching a token that is not watched does nothing.
    pub fn unwatch<S>(&mut self, source: &mut S, token: Token) -> io::Result<()>
    where
        S: Source + ?Sized,
    {
        if !self.watched.remove(&token) {
            return Ok(());
        }
        trace!(token = token.0, "Unwatching descriptor");
        self.poll.registry().deregister(source)
    }

    /// Whether `token` is currently watched
    pub fn is_watching(&self, token: Token) -> bool {
        self.watched.contains(&token)
    }

    /// Number of watched descriptors
    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Block until something is readable or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> WaitOutcome {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) if self.events.is_empty() => WaitOutcome::TimedOut,
            Ok(()) => WaitOutcome::Ready(ReadySet::from_tokens(
                self.events.iter().map(|event| event.token()),
            )),
            Err(e) if e.kind() == ErrorKind::Interrupted => WaitOutcome::Interrupted,
            Err(e) => WaitOutcome::Failed(e),
        }
    }
}
