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

//! Wall-clock deadline
//!
//! The shutdown deadline is fixed once when the event loop starts. Before
//! every wait the loop asks the [`Deadline`] how much time is left; the wait
//! primitive is never trusted to count down on the loop's behalf.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock: Send + 'static {
    /// Current instant
    fn now(&self) -> Instant;
}

/// The monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give the
/// other to the server.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Instant) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Furthest a deadline is placed when the requested one is not representable
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// A fixed point in time after which the server drains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    /// Deadline `duration` after `now`
    ///
    /// A duration too large for the platform's `Instant` saturates to a
    /// deadline far in the future instead of overflowing.
    pub fn after(now: Instant, duration: Duration) -> Self {
        let expires_at = now
            .checked_add(duration)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self { expires_at }
    }

    /// When the deadline expires
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left at `now`, zero once expired
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Whether the deadline has passed at `now`
    pub fn is_exhausted(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}
