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

//! Core types for the Parrot server

use std::fmt;

/// Index of an occupied entry in the [`ConnectionRegistry`](crate::ConnectionRegistry)
///
/// Slots are reused once freed, so a slot names a connection only while that
/// connection is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    /// Create a slot from its index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the underlying index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// Unique identifier for a connection (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Protocol state of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `Send Text` has been written, no payload received yet
    Greeted,
    /// At least one payload has been received
    Responded,
    /// `Quit` is being delivered during drain
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greeted => write!(f, "greeted"),
            Self::Responded => write!(f, "responded"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

/// Lifecycle of the server
///
/// The only legal path is `Listening → Running → Draining → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Socket bound and listening, event loop not started
    Listening,
    /// Accepting connections and servicing clients
    Running,
    /// Deadline exhausted, `Quit` broadcast in progress
    Draining,
    /// All descriptors closed
    Terminated,
}

impl ServerState {
    /// Whether `self → next` is a legal transition
    pub fn can_transition_to(self, next: ServerState) -> bool {
        matches!(
            (self, next),
            (Self::Listening, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Terminated)
        )
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listening => write!(f, "listening"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}
