//! Passenger and bus components.
//!
//! Passengers and buses are both ECS entities; this module only holds their
//! component data and the small state-machine/mobility enums attached to
//! them. The behaviour that mutates this state (boarding walks, dwell
//! computation, dispatch) lives in [`crate::stop_ops`] and [`crate::dispatch`].

use std::collections::HashMap;

use bevy_ecs::prelude::{Component, Entity, Resource};

use crate::route::{Direction, StopId};

/// Fleet-wide vehicle defaults (§6.4): capacity and the wheelchair cap.
#[derive(Debug, Clone, Copy, Resource)]
pub struct VehicleConfig {
    pub capacity: i64,
    pub max_wheelchair: i64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            capacity: 75,
            max_wheelchair: 1,
        }
    }
}

/// A passenger's mobility status. Wheelchair users cost more capacity and
/// take longer to board/alight (§4.4 constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mobility {
    Regular,
    Wheelchair,
}

impl Mobility {
    /// Capacity units consumed while onboard: 1 for a regular rider, 2 for
    /// a wheelchair user.
    pub fn capacity_cost(self) -> i64 {
        match self {
            Mobility::Regular => 1,
            Mobility::Wheelchair => 2,
        }
    }

    pub fn is_wheelchair(self) -> bool {
        matches!(self, Mobility::Wheelchair)
    }
}

/// A waiting or boarded rider.
#[derive(Debug, Clone, Copy, Component)]
pub struct Passenger {
    pub direction: Direction,
    pub origin: StopId,
    pub origin_index: usize,
    pub destination: StopId,
    /// Simulation time (seconds) this passenger's arrival event fired.
    pub arrival_time: u64,
    pub mobility: Mobility,
    /// Probability this passenger rejoins the queue after a denial, rather
    /// than giving up and leaving.
    pub requeue_probability: f64,
}

/// A bus's position in its own life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Created but not yet handed to the traffic interface.
    Idle,
    /// Travelling toward `toward_index`.
    EnRoute { toward_index: usize },
    /// Stopped at `stop_index`, serving alighting/boarding (and possibly a
    /// holding delay) before departing.
    Dwelling { stop_index: usize },
    /// Processed its terminal stop; no further callbacks will fire for it.
    Finished,
}

/// Bus identity, route binding, capacity, and current state-machine state.
#[derive(Debug, Clone, Component)]
pub struct Bus {
    pub trip_id: u64,
    pub direction: Direction,
    pub capacity: i64,
    pub state: BusState,
    /// Headway assigned by the dispatcher at dispatch time. Frozen for the
    /// life of this bus — never recomputed after dispatch.
    pub h_assigned: Option<u64>,
}

impl Bus {
    pub fn new(trip_id: u64, direction: Direction, capacity: i64) -> Self {
        Self {
            trip_id,
            direction,
            capacity,
            state: BusState::Idle,
            h_assigned: None,
        }
    }
}

/// Onboard passenger set and its cached aggregate counts. Kept separate from
/// [`Bus`] so boarding/alighting systems can query it without touching
/// state-machine fields.
#[derive(Debug, Clone, Component, Default)]
pub struct BusManifest {
    onboard: Vec<Entity>,
    load: i64,
    wheelchair_count: i64,
}

impl BusManifest {
    pub fn load(&self) -> i64 {
        self.load
    }

    pub fn wheelchair_count(&self) -> i64 {
        self.wheelchair_count
    }

    pub fn onboard(&self) -> &[Entity] {
        &self.onboard
    }

    /// Whether a passenger with the given mobility can board given
    /// `capacity` and `max_wheelchair`.
    pub fn can_board(&self, mobility: Mobility, capacity: i64, max_wheelchair: i64) -> bool {
        if self.load + mobility.capacity_cost() > capacity {
            return false;
        }
        if mobility.is_wheelchair() && self.wheelchair_count + 1 > max_wheelchair {
            return false;
        }
        true
    }

    pub fn board(&mut self, passenger: Entity, mobility: Mobility) {
        self.onboard.push(passenger);
        self.load += mobility.capacity_cost();
        if mobility.is_wheelchair() {
            self.wheelchair_count += 1;
        }
    }

    /// Removes `passenger` from the onboard set, decrementing the cached
    /// counts by `mobility`'s cost. No-op if `passenger` is not onboard.
    pub fn alight(&mut self, passenger: Entity, mobility: Mobility) {
        if let Some(pos) = self.onboard.iter().position(|&e| e == passenger) {
            self.onboard.remove(pos);
            self.load -= mobility.capacity_cost();
            if mobility.is_wheelchair() {
                self.wheelchair_count -= 1;
            }
        }
    }
}

/// Per-bus timing history: when it departed each stop it has already
/// served, plus the dispatch bookkeeping the holding controller and
/// telemetry both need.
#[derive(Debug, Clone, Component)]
pub struct BusTiming {
    pub dispatch_time: u64,
    /// Monotone counter assigned at dispatch; breaks ties between buses
    /// dispatched at the identical simulation second (§9 Open Question).
    pub dispatch_seq: u64,
    departures_by_stop: HashMap<usize, u64>,
    pub last_arrival_time: Option<u64>,
}

impl BusTiming {
    pub fn new(dispatch_time: u64, dispatch_seq: u64) -> Self {
        Self {
            dispatch_time,
            dispatch_seq,
            departures_by_stop: HashMap::new(),
            last_arrival_time: None,
        }
    }

    pub fn record_departure(&mut self, stop_index: usize, t: u64) {
        self.departures_by_stop.insert(stop_index, t);
    }

    pub fn departure_at(&self, stop_index: usize) -> Option<u64> {
        self.departures_by_stop.get(&stop_index).copied()
    }
}

/// Staged between a bus's arrival and departure at one stop: the alight
/// and board walks already ran, and `dwell_secs` (including any holding)
/// is waiting for the `VehicleDeparture` callback to apply it.
#[derive(Debug, Clone, Copy, Component)]
pub struct PendingDeparture {
    pub stop_index: usize,
    pub boarded: u32,
    pub alighted: u32,
    pub dwell_secs: f64,
}

/// Optional pre-assigned per-stop schedule, used by the timetable
/// dispatcher's buses to report scheduled vs. actual arrival/departure.
#[derive(Debug, Clone, Component)]
pub struct BusSchedule {
    pub scheduled_arrivals: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_rejects_over_capacity() {
        let mut m = BusManifest::default();
        let e = Entity::from_raw(0);
        assert!(m.can_board(Mobility::Regular, 1, 1));
        m.board(e, Mobility::Regular);
        assert!(!m.can_board(Mobility::Regular, 1, 1));
    }

    #[test]
    fn manifest_enforces_wheelchair_cap() {
        let mut m = BusManifest::default();
        let a = Entity::from_raw(0);
        assert!(m.can_board(Mobility::Wheelchair, 10, 1));
        m.board(a, Mobility::Wheelchair);
        assert!(!m.can_board(Mobility::Wheelchair, 10, 1));
        assert!(m.can_board(Mobility::Regular, 10, 1));
    }

    #[test]
    fn manifest_alight_restores_capacity() {
        let mut m = BusManifest::default();
        let e = Entity::from_raw(0);
        m.board(e, Mobility::Wheelchair);
        assert_eq!(m.load(), 2);
        m.alight(e, Mobility::Wheelchair);
        assert_eq!(m.load(), 0);
        assert_eq!(m.wheelchair_count(), 0);
    }

    #[test]
    fn timing_tracks_per_stop_departure() {
        let mut timing = BusTiming::new(0, 0);
        timing.record_departure(2, 500);
        assert_eq!(timing.departure_at(2), Some(500));
        assert_eq!(timing.departure_at(3), None);
    }
}
