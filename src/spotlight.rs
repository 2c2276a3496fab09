//! Scheduled end of the post-bloom spotlight.
//!
//! The host drives time: it calls [`SpotlightSchedule::fire_due`] from its
//! timer or frame callback with the current instant, and every idea whose
//! spotlight has elapsed gets its `is_new` flag cleared.

use std::time::{Duration, Instant};

use log::debug;

use crate::idea_store::IdeaStore;
use crate::random_source::RandomSource;
use crate::slot_storage::SlotStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingClear {
    id: String,
    due: Instant,
}

#[derive(Debug, Clone)]
pub struct SpotlightSchedule {
    delay: Duration,
    pending: Vec<PendingClear>,
}

impl SpotlightSchedule {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: Vec::new() }
    }

    /// Queues the flag clear for `id`. Scheduling the same id twice keeps
    /// only the later deadline.
    pub fn schedule(&mut self, id: impl Into<String>, now: Instant) -> Instant {
        let id = id.into();
        let due = now + self.delay;
        self.pending.retain(|entry| entry.id != id);
        debug!("Spotlight for '{}' ends in {:?}", id, self.delay);
        self.pending.push(PendingClear { id, due });
        due
    }

    /// Clears every idea whose deadline is at or before `now` and returns
    /// their ids. Ideas that vanished in the meantime are skipped by the
    /// store.
    pub fn fire_due<S: SlotStorage, R: RandomSource>(
        &mut self,
        now: Instant,
        store: &mut IdeaStore<S, R>,
    ) -> Vec<String> {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|entry| entry.due <= now);
        self.pending = waiting;

        due.into_iter()
            .map(|entry| {
                store.clear_new_flag(&entry.id);
                entry.id
            })
            .collect()
    }

    /// Earliest pending deadline, for hosts that arm a single timer.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|entry| entry.due).min()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
