//! Simulation time: a second-scale timeline with a calendar epoch.
//!
//! All timestamps and `clock.now()` are in **simulation seconds**. Time 0 is
//! mapped to a real calendar date via [`SimulationClock::with_epoch`]. The
//! timeline advances by popping the next scheduled event; same-timestamp
//! events fire in the order they were *scheduled*, not by event kind — the
//! `seq` tiebreaker on [`Event`] exists for exactly that, per the ordering
//! guarantee in the kernel's design.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::route::Direction;

/// The discrete kinds of callback the kernel can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SimulationStarted,
    PassengerArrival,
    DispatchTick,
    VehicleArrival,
    VehicleDeparture,
    KpiSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    /// A passenger-generator firing at a given stop/direction.
    Stop {
        direction: Direction,
        stop_index: usize,
    },
    /// A dispatcher's self-scheduled tick for a direction.
    Dispatch { direction: Direction },
    /// A callback targeting a specific bus entity.
    Bus(Entity),
}

/// Simulation event. `timestamp` is in **seconds** of simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
    /// Monotone insertion counter; breaks ties between events scheduled at
    /// the same timestamp by firing the one scheduled first (wall-clock
    /// scheduling order, not event kind).
    seq: u64,
    /// Set by [`SimulationClock::cancel`]; skipped silently when dequeued.
    cancelled: bool,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by timestamp, then by insertion sequence (earlier wins).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Opaque cancellation handle for a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle(u64);

/// Simulation clock: a time-ordered priority queue of callbacks, advancing
/// strictly forward. Time 0 maps to a real calendar date via `epoch`.
#[derive(Debug, Resource)]
pub struct SimulationClock {
    now: u64,
    epoch: chrono::NaiveDate,
    events: BinaryHeap<Event>,
    next_seq: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            now: 0,
            epoch: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid default epoch"),
            events: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl SimulationClock {
    /// Clock with time 0 mapped to the given calendar date.
    pub fn with_epoch(epoch: chrono::NaiveDate) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn epoch(&self) -> chrono::NaiveDate {
        self.epoch
    }

    /// Seconds-from-midnight on the simulation date, modulo one day.
    pub fn time_of_day(&self) -> u64 {
        self.now % 86_400
    }

    /// Enqueue `kind` at `now + delay`. `delay` is in seconds.
    pub fn schedule(
        &mut self,
        delay: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> EventHandle {
        self.schedule_at(self.now + delay, kind, subject)
    }

    /// Enqueue `kind` at an absolute simulation second. `t` must be `>= now`.
    pub fn schedule_at(
        &mut self,
        t: u64,
        kind: EventKind,
        subject: Option<EventSubject>,
    ) -> EventHandle {
        debug_assert!(t >= self.now, "cannot schedule an event in the past");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp: t,
            kind,
            subject,
            seq,
            cancelled: false,
        });
        EventHandle(seq)
    }

    /// Idempotent cancellation: a cancelled event is a no-op when dequeued.
    /// `handle` need not still be present in the queue.
    pub fn cancel(&mut self, handle: EventHandle) {
        // BinaryHeap has no efficient in-place lookup; rebuild skipping the
        // match. This is rare enough (explicit cancellation, not the common
        // path) that an O(n) rebuild is the right trade-off here.
        let mut rebuilt = BinaryHeap::with_capacity(self.events.len());
        for mut ev in self.events.drain() {
            if ev.seq == handle.0 {
                ev.cancelled = true;
            }
            rebuilt.push(ev);
        }
        self.events = rebuilt;
    }

    /// Pop the next non-cancelled event, advancing `now` to its timestamp.
    pub fn pop_next(&mut self) -> Option<Event> {
        loop {
            let ev = self.events.pop()?;
            self.now = ev.timestamp;
            if !ev.cancelled {
                return Some(ev);
            }
        }
    }

    /// Timestamp of the next non-cancelled event, without popping it.
    pub fn next_event_time(&self) -> Option<u64> {
        self.events.iter().filter(|e| !e.cancelled).map(|e| e.timestamp).min()
    }

    pub fn is_empty(&self) -> bool {
        self.next_event_time().is_none()
    }

    pub fn pending_event_count(&self) -> usize {
        self.events.iter().filter(|e| !e.cancelled).count()
    }

    /// Advance `now` to `t_end` without firing anything. Used by
    /// `run_until` when the queue is empty or the next event is beyond the
    /// requested horizon.
    pub fn advance_to(&mut self, t_end: u64) {
        if t_end > self.now {
            self.now = t_end;
        }
    }
}
