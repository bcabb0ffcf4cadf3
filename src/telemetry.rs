//! Event sink (§4.7): the typed domain-event union and the trait any
//! consumer implements to receive it.

use bevy_ecs::prelude::{Entity, Resource};

use crate::route::{Direction, StopId};

/// The internal event taxonomy (§6.3). `bus_failure` is reserved for a
/// future traffic-interface-fault notification and is not emitted by
/// anything in this crate yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DomainEvent {
    BusDispatch {
        bus: Entity,
        direction: Direction,
        time: u64,
        h_assigned: u64,
    },
    BusArrival {
        bus: Entity,
        stop: StopId,
        stop_index: usize,
        time: u64,
        scheduled_time: Option<u64>,
    },
    BusDeparture {
        bus: Entity,
        stop: StopId,
        stop_index: usize,
        time: u64,
        dwell_secs: f64,
        boarded: u32,
        alighted: u32,
        load: i64,
    },
    PassengerArrival {
        passenger: Entity,
        stop: StopId,
        direction: Direction,
        time: u64,
    },
    PassengerBoarded {
        passenger: Entity,
        bus: Entity,
        time: u64,
    },
    PassengerAlighted {
        passenger: Entity,
        bus: Entity,
        time: u64,
    },
    PassengerDenied {
        passenger: Entity,
        bus: Entity,
        time: u64,
        requeued: bool,
    },
    HeadwayAdjust {
        bus: Entity,
        stop: StopId,
        time: u64,
        tau_hold: f64,
    },
    #[allow(dead_code)]
    BusFailure {
        bus: Entity,
        time: u64,
        reason: &'static str,
    },
}

/// Anything that can receive domain events as they're emitted. Expected not
/// to block the kernel; an unbounded in-memory buffer (as in
/// [`SimEventLog`]) is the simplest compliant implementation.
pub trait EventSink: Send + Sync {
    fn emit(&mut self, event: DomainEvent);
}

/// Default in-memory sink: an append-only log in kernel emission order.
#[derive(Debug, Default, Resource)]
pub struct SimEventLog {
    events: Vec<DomainEvent>,
}

impl SimEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for SimEventLog {
    fn emit(&mut self, event: DomainEvent) {
        self.events.push(event);
    }
}
