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

//! Connection registry
//!
//! A fixed-capacity arena with an explicit free list. `add` and `remove` are
//! O(1), freed slots are reused, and removing a vacant slot is a no-op so
//! duplicate cleanup paths cannot corrupt the bookkeeping.
//!
//! The registry is pure bookkeeping. The server pairs every `add`/`remove`
//! with the matching multiplexer `watch`/`unwatch`.

use crate::{Result, ServerError, Slot};

/// Fixed-capacity table of registered connections
#[derive(Debug)]
pub struct ConnectionRegistry<T> {
    entries: Vec<Option<T>>,
    free: Vec<usize>,
    count: usize,
}

impl<T> ConnectionRegistry<T> {
    /// Create an empty registry with room for `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            // Popped from the back, so the lowest index is handed out first
            free: (0..capacity).rev().collect(),
            count: 0,
        }
    }

    /// Register an entry, returning its slot
    ///
    /// Fails with [`ServerError::RegistryFull`] when every slot is occupied.
    pub fn add(&mut self, value: T) -> Result<Slot> {
        let index = self
            .free
            .pop()
            .ok_or(ServerError::RegistryFull(self.capacity()))?;
        debug_assert!(self.entries[index].is_none());
        self.entries[index] = Some(value);
        self.count += 1;
        Ok(Slot::new(index))
    }

    /// Remove the entry in `slot`
    ///
    /// Returns `None` without side effects if the slot is already vacant or
    /// out of range.
    pub fn remove(&mut self, slot: Slot) -> Option<T> {
        let value = self.entries.get_mut(slot.index())?.take()?;
        self.free.push(slot.index());
        self.count -= 1;
        Some(value)
    }

    /// Get the entry in `slot`
    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.entries.get(slot.index())?.as_ref()
    }

    /// Get the entry in `slot` mutably
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.entries.get_mut(slot.index())?.as_mut()
    }

    /// Check whether `slot` is occupied
    pub fn contains(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Visit every registered entry in slot order
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(Slot, &T),
    {
        for (slot, value) in self.iter() {
            visitor(slot, value);
        }
    }

    /// Visit every registered entry mutably in slot order
    pub fn for_each_mut<F>(&mut self, mut visitor: F)
    where
        F: FnMut(Slot, &mut T),
    {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Some(value) = entry {
                visitor(Slot::new(index), value);
            }
        }
    }

    /// Iterate over registered entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|value| (Slot::new(index), value)))
    }

    /// Snapshot of the occupied slots
    pub fn slots(&self) -> Vec<Slot> {
        self.iter().map(|(slot, _)| slot).collect()
    }

    /// Remove every entry, returning them in slot order
    pub fn drain(&mut self) -> Vec<(Slot, T)> {
        let drained: Vec<(Slot, T)> = self
            .entries
            .iter_mut()
            .enumerate()
            .filter_map(|(index, entry)| entry.take().map(|value| (Slot::new(index), value)))
            .collect();
        self.free = (0..self.capacity()).rev().collect();
        self.count = 0;
        drained
    }

    /// Number of registered entries
    pub fn count(&self) -> usize {
        self.count
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Whether no further entry can be added
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
