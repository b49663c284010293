//! Cancellable timers and edit debouncing
//!
//! Time is always passed in, so these work under any event loop (and in
//! tests) without sleeping.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Pending one-shot timers, each carrying an action
#[derive(Debug)]
pub struct Timers<A> {
    next_id: u64,
    pending: Vec<(TimerHandle, Instant, A)>,
}

impl<A> Timers<A> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push((handle, now + delay, action));
        handle
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _, _)| *h != handle);
        self.pending.len() != before
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline, _)| *deadline).min()
    }

    /// Remove and return every action due at `now`, earliest first
    pub fn expire(&mut self, now: Instant) -> Vec<A> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, deadline, _)| *deadline <= now);
        self.pending = pending;
        due.sort_by_key(|(handle, deadline, _)| (*deadline, handle.0));
        due.into_iter().map(|(_, _, action)| action).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<A> Default for Timers<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Coalesces bursts of triggers into one action after a quiet period
///
/// Each trigger cancels the pending one and restarts the delay, so only the
/// latest action ever runs.
#[derive(Debug)]
pub struct Debouncer<A> {
    timers: Timers<A>,
    delay: Duration,
    pending: Option<TimerHandle>,
}

impl<A> Debouncer<A> {
    pub fn new(delay: Duration) -> Self {
        Self {
            timers: Timers::new(),
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Applies from the next trigger on
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn trigger(&mut self, now: Instant, action: A) {
        if let Some(handle) = self.pending.take() {
            self.timers.cancel(handle);
        }
        self.pending = Some(self.timers.schedule(now, self.delay, action));
    }

    /// The pending action, if its quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<A> {
        let action = self.timers.expire(now).pop()?;
        self.pending = None;
        Some(action)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.timers.cancel(handle);
        }
    }
}
