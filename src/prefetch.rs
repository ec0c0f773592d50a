//! Debounced, at-most-once prefetch of full pattern resources.
//!
//! ## Record states
//!
//! ```text
//! Idle --request--> Pending(timer) --timer fires--> Prefetching --Ok--> Prefetched
//!                   Pending --cancel--> Idle        Prefetching --Err--> Idle
//! ```
//!
//! `Prefetched` is terminal. Requests for a `Pending`, `Prefetching` or
//! `Prefetched` record are no-ops, so there is never more than one timer and
//! never more than one load in flight per pattern.
//!
//! Prefetching is advisory: load failures are logged and forgotten, never
//! returned to the caller.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::catalog::PatternId;
use crate::clock::Clock;
use crate::debounce::{Debouncer, TimerHandle};
use crate::loader::{LoadRequest, ResourceLoadError};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchState {
    Idle,
    Pending(TimerHandle),
    Prefetching,
    Prefetched,
}

pub struct PrefetchCoordinator<C> {
    clock: C,
    default_delay: Duration,
    timers: Debouncer<PatternId>,
    records: HashMap<PatternId, PrefetchState>,
    prefetched: usize,
}

impl<C: Clock> PrefetchCoordinator<C> {
    pub fn new(clock: C, default_delay: Duration) -> Self {
        Self {
            clock,
            default_delay,
            timers: Debouncer::new(),
            records: HashMap::new(),
            prefetched: 0,
        }
    }

    /// Schedule a prefetch of `id` after the default debounce delay.
    ///
    /// Returns true if a timer was scheduled.
    pub fn request_prefetch(&mut self, id: &PatternId) -> bool {
        self.request_prefetch_after(id, self.default_delay)
    }

    pub fn request_prefetch_after(&mut self, id: &PatternId, delay: Duration) -> bool {
        let state = self.state(id);
        if state != PrefetchState::Idle {
            debug!("prefetch: {id} already {state:?}, ignoring request");
            return false;
        }
        let handle = self.timers.schedule(id.clone(), self.clock.now() + delay);
        debug!(
            "prefetch: {id} pending (timer {}, delay={}ms)",
            handle.get(),
            delay.as_millis()
        );
        self.records.insert(id.clone(), PrefetchState::Pending(handle));
        true
    }

    /// Cancel a pending (not yet fired) prefetch. In-flight loads are left
    /// alone. Returns true if a timer was cleared.
    ///
    /// A timer whose deadline has passed counts as fired even if `poll` has
    /// not run yet: the cancel is refused and the next `poll` starts the load.
    pub fn cancel_prefetch(&mut self, id: &PatternId) -> bool {
        if !matches!(self.state(id), PrefetchState::Pending(_)) {
            return false;
        }
        if self.timers.is_due(id, self.clock.now()) {
            debug!("prefetch: {id} timer already due, not cancelling");
            return false;
        }
        if let Some(handle) = self.timers.cancel(id) {
            debug!("prefetch: {id} cancelled (timer {})", handle.get());
        }
        self.records.insert(id.clone(), PrefetchState::Idle);
        true
    }

    /// Fire every timer that is due and return the loads to start.
    pub fn poll(&mut self) -> Vec<LoadRequest> {
        let now = self.clock.now();
        let due = self.timers.take_due(now);
        let mut requests = Vec::with_capacity(due.len());
        for id in due {
            debug!("prefetch: {id} timer fired, loading");
            self.records.insert(id.clone(), PrefetchState::Prefetching);
            requests.push(LoadRequest::Full(id));
        }
        requests
    }

    /// Record the result of a full load started by [`poll`](Self::poll).
    pub fn complete(&mut self, id: &PatternId, result: Result<(), ResourceLoadError>) {
        if self.state(id) != PrefetchState::Prefetching {
            debug!("prefetch: ignoring completion for {id} (not prefetching)");
            return;
        }
        match result {
            Ok(()) => {
                self.records.insert(id.clone(), PrefetchState::Prefetched);
                self.prefetched += 1;
                info!("prefetch: {id} prefetched ({} total)", self.prefetched);
            }
            Err(e) => {
                warn!("prefetch: {id} failed: {e}");
                self.records.insert(id.clone(), PrefetchState::Idle);
            }
        }
    }

    pub fn state(&self, id: &PatternId) -> PrefetchState {
        self.records
            .get(id)
            .copied()
            .unwrap_or(PrefetchState::Idle)
    }

    pub fn is_prefetched(&self, id: &PatternId) -> bool {
        self.state(id) == PrefetchState::Prefetched
    }

    pub fn is_prefetching(&self, id: &PatternId) -> bool {
        self.state(id) == PrefetchState::Prefetching
    }

    pub fn is_pending(&self, id: &PatternId) -> bool {
        matches!(self.state(id), PrefetchState::Pending(_))
    }

    pub fn prefetched_count(&self) -> usize {
        self.prefetched
    }

    /// Number of full loads started and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.records
            .values()
            .filter(|s| **s == PrefetchState::Prefetching)
            .count()
    }

    /// When the event loop next needs to call [`poll`](Self::poll).
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::loader::LoadRequest;

    fn pid(s: &str) -> PatternId {
        s.parse().unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn coordinator() -> (ManualClock, PrefetchCoordinator<ManualClock>) {
        let clock = ManualClock::new();
        let c = PrefetchCoordinator::new(clock.clone(), DEFAULT_DEBOUNCE);
        (clock, c)
    }

    #[test]
    fn timer_fires_after_debounce() {
        let (clock, mut c) = coordinator();
        let id = pid("builder");
        assert!(c.request_prefetch(&id));
        assert!(c.is_pending(&id));

        clock.advance(ms(199));
        assert!(c.poll().is_empty());

        clock.advance(ms(1));
        assert_eq!(c.poll(), vec![LoadRequest::Full(id.clone())]);
        assert!(c.is_prefetching(&id));

        c.complete(&id, Ok(()));
        assert!(c.is_prefetched(&id));
        assert_eq!(c.prefetched_count(), 1);
    }

    #[test]
    fn double_request_schedules_one_timer_and_one_load() {
        let (clock, mut c) = coordinator();
        let id = pid("adapter");
        assert!(c.request_prefetch(&id));
        assert!(!c.request_prefetch(&id));

        clock.advance(ms(500));
        assert_eq!(c.poll().len(), 1);
        assert!(!c.request_prefetch(&id), "no second load while prefetching");
        assert!(c.poll().is_empty());
    }

    #[test]
    fn cancel_before_debounce_prevents_load() {
        let (clock, mut c) = coordinator();
        let id = pid("singleton");
        c.request_prefetch(&id);
        clock.advance(ms(50));
        assert!(c.cancel_prefetch(&id));
        assert_eq!(c.state(&id), PrefetchState::Idle);

        clock.advance(ms(1000));
        assert!(c.poll().is_empty());
        assert_eq!(c.state(&id), PrefetchState::Idle);
    }

    #[test]
    fn cancel_after_deadline_still_loads() {
        let (clock, mut c) = coordinator();
        let id = pid("singleton");
        c.request_prefetch(&id);
        clock.advance(ms(250));
        assert!(!c.cancel_prefetch(&id));
        assert_eq!(c.poll(), vec![LoadRequest::Full(id.clone())]);
        assert!(c.is_prefetching(&id));
    }

    #[test]
    fn cancel_does_not_touch_in_flight_or_done() {
        let (clock, mut c) = coordinator();
        let id = pid("composite");
        c.request_prefetch(&id);
        clock.advance(ms(200));
        c.poll();
        assert!(!c.cancel_prefetch(&id));
        assert!(c.is_prefetching(&id));

        c.complete(&id, Ok(()));
        assert!(!c.cancel_prefetch(&id));
        assert!(c.is_prefetched(&id));
    }

    #[test]
    fn prefetched_is_never_refetched() {
        let (clock, mut c) = coordinator();
        let id = pid("observer");
        c.request_prefetch(&id);
        clock.advance(ms(200));
        assert_eq!(c.poll().len(), 1);
        c.complete(&id, Ok(()));

        assert!(!c.request_prefetch(&id));
        clock.advance(ms(1000));
        assert!(c.poll().is_empty());
        assert_eq!(c.state(&id), PrefetchState::Prefetched);
        assert_eq!(c.prefetched_count(), 1);
    }

    #[test]
    fn failure_returns_to_idle_and_can_retry() {
        let (clock, mut c) = coordinator();
        let id = pid("mediator");
        c.request_prefetch(&id);
        clock.advance(ms(200));
        c.poll();
        c.complete(&id, Err(ResourceLoadError::NotFound { id: id.clone() }));
        assert_eq!(c.state(&id), PrefetchState::Idle);
        assert_eq!(c.prefetched_count(), 0);

        assert!(c.request_prefetch(&id));
    }

    #[test]
    fn failure_of_one_id_leaves_others_alone() {
        let (clock, mut c) = coordinator();
        let a = pid("strategy");
        let b = pid("state");
        c.request_prefetch(&a);
        c.request_prefetch(&b);
        clock.advance(ms(200));
        assert_eq!(c.poll().len(), 2);
        c.complete(&a, Err(ResourceLoadError::Io { id: a.clone(), message: "stalled".into() }));
        c.complete(&b, Ok(()));
        assert_eq!(c.state(&a), PrefetchState::Idle);
        assert!(c.is_prefetched(&b));
    }

    #[test]
    fn stray_completion_is_ignored() {
        let (_clock, mut c) = coordinator();
        let id = pid("visitor");
        c.complete(&id, Ok(()));
        assert_eq!(c.state(&id), PrefetchState::Idle);
        assert_eq!(c.prefetched_count(), 0);
    }

    #[test]
    fn custom_delay_and_next_deadline() {
        let (clock, mut c) = coordinator();
        let start = clock.now();
        c.request_prefetch_after(&pid("bridge"), ms(20));
        c.request_prefetch(&pid("proxy"));
        assert_eq!(c.next_deadline(), Some(start + ms(20)));

        clock.advance(ms(20));
        assert_eq!(c.poll(), vec![LoadRequest::Full(pid("bridge"))]);
        assert_eq!(c.next_deadline(), Some(start + ms(200)));
    }

    #[test]
    fn unknown_ids_are_idle() {
        let (_clock, c) = coordinator();
        let id = pid("interpreter");
        assert_eq!(c.state(&id), PrefetchState::Idle);
        assert!(!c.is_prefetched(&id));
        assert!(!c.is_prefetching(&id));
    }
}
