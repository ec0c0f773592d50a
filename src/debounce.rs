//! Keyed debounce timers.
//!
//! Timers are plain deadlines. Nothing fires on its own: the owner's event
//! loop calls [`Debouncer::take_due`] with the current time and sleeps until
//! [`Debouncer::next_deadline`] otherwise.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

/// Identifies one scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Timer {
    handle: TimerHandle,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Debouncer<K> {
    timers: HashMap<K, Timer>,
    next_handle: u64,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Schedule (or reschedule) the timer for `key`.
    ///
    /// A previous timer for the same key is replaced and its handle becomes
    /// invalid.
    pub fn schedule(&mut self, key: K, deadline: Instant) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.timers.insert(key, Timer { handle, deadline });
        handle
    }

    /// Clear the timer for `key`. Returns its handle if one was pending.
    pub fn cancel(&mut self, key: &K) -> Option<TimerHandle> {
        self.timers.remove(key).map(|t| t.handle)
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.timers.contains_key(key)
    }

    /// True if `key` has a timer whose deadline is at or before `now`.
    pub fn is_due(&self, key: &K, now: Instant) -> bool {
        self.timers.get(key).is_some_and(|t| t.deadline <= now)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, TimerHandle, K)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(k, t)| (t.deadline, t.handle, k.clone()))
            .collect();
        // Handle order breaks deadline ties by scheduling order.
        due.sort_by_key(|(deadline, handle, _)| (*deadline, *handle));
        for (_, _, key) in &due {
            self.timers.remove(key);
        }
        due.into_iter().map(|(_, _, k)| k).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }
}

impl<K: Eq + Hash + Clone> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}
