use std::collections::HashSet;

use super::event::{TimerEvent, TimerId};
use super::time::Generation;

/// Owns the session generation and the set of timers still worth firing.
///
/// The JoinHandles themselves live in the driver; this only decides which
/// arrivals are still valid.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    generation: Generation,
    pending_timers: HashSet<TimerId>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    /// Starts a new generation. Every timer and callback stamped with the
    /// previous one becomes a no-op.
    pub fn invalidate(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.pending_timers.clear();
        self.generation
    }

    pub fn arm(&mut self, id: TimerId) {
        self.pending_timers.insert(id);
    }

    pub fn disarm(&mut self, id: TimerId) -> bool {
        self.pending_timers.remove(&id)
    }

    /// Consumes a fired timer. False if it belongs to an old generation or
    /// was cancelled after being scheduled.
    pub fn admit(&mut self, timer: &TimerEvent) -> bool {
        self.is_current(timer.generation) && self.pending_timers.remove(&timer.id)
    }

    pub fn pending(&self) -> usize {
        self.pending_timers.len()
    }
}
