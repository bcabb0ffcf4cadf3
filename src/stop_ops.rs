//! Dwell-time mechanics at a stop (§4.4): the alight walk, the board walk,
//! and the dwell-time rule combining them.
//!
//! These are plain functions over explicit collections, not bevy systems,
//! so they can be exercised directly in tests; `systems::vehicle_arrival`
//! adapts them to ECS queries.

use std::collections::{HashMap, VecDeque};

use bevy_ecs::prelude::{Entity, Resource};
use rand::Rng;

use crate::ecs::{Bus, BusManifest, Mobility, Passenger};
use crate::route::{RouteConfig, StopId};

/// Per-passenger service-time constants (§4.4 defaults).
#[derive(Debug, Clone, Copy, Resource)]
pub struct DwellConstants {
    pub regular_board_secs: f64,
    pub regular_alight_secs: f64,
    pub wheelchair_board_secs: f64,
    pub wheelchair_alight_secs: f64,
}

impl Default for DwellConstants {
    fn default() -> Self {
        Self {
            regular_board_secs: 2.0,
            regular_alight_secs: 1.0,
            wheelchair_board_secs: 45.0,
            wheelchair_alight_secs: 45.0,
        }
    }
}

impl DwellConstants {
    fn board_time(&self, mobility: Mobility) -> f64 {
        match mobility {
            Mobility::Regular => self.regular_board_secs,
            Mobility::Wheelchair => self.wheelchair_board_secs,
        }
    }

    fn alight_time(&self, mobility: Mobility) -> f64 {
        match mobility {
            Mobility::Regular => self.regular_alight_secs,
            Mobility::Wheelchair => self.wheelchair_alight_secs,
        }
    }
}

/// `alight(bus)`: removes every onboard passenger whose destination is
/// `stop` (or every passenger, if `is_terminus`). Returns the alighted
/// entities and the accumulated alighting time.
pub fn alight(
    manifest: &mut BusManifest,
    passengers: &HashMap<Entity, Passenger>,
    stop: StopId,
    is_terminus: bool,
    constants: &DwellConstants,
) -> (Vec<Entity>, f64) {
    let mut alighted = Vec::new();
    let mut total_time = 0.0;
    for entity in manifest.onboard().to_vec() {
        let passenger = passengers
            .get(&entity)
            .expect("onboard passenger must have component data");
        if is_terminus || passenger.destination == stop {
            manifest.alight(entity, passenger.mobility);
            total_time += constants.alight_time(passenger.mobility);
            alighted.push(entity);
        }
    }
    (alighted, total_time)
}

/// A passenger turned away at the door: denied because capacity (or the
/// wheelchair cap) was exhausted. `requeued` records whether its
/// requeue-propensity draw kept it in the queue.
#[derive(Debug, Clone, Copy)]
pub struct Denial {
    pub passenger: Entity,
    pub requeued: bool,
}

pub struct BoardOutcome {
    pub boarded: Vec<Entity>,
    pub denied: Vec<Denial>,
    pub board_time_secs: f64,
}

/// `board(bus)`: walks `queue` head-to-tail, admitting passengers that fit
/// and whose destination is still reachable. Denied passengers rejoin the
/// front of `queue` (preserving their position) with probability
/// `passenger.requeue_probability`, else they are dropped for good.
pub fn board<R: Rng + ?Sized>(
    manifest: &mut BusManifest,
    queue: &mut VecDeque<Entity>,
    passengers: &HashMap<Entity, Passenger>,
    route: &RouteConfig,
    stop_index: usize,
    capacity: i64,
    max_wheelchair: i64,
    constants: &DwellConstants,
    rng: &mut R,
) -> BoardOutcome {
    let mut boarded = Vec::new();
    let mut denied = Vec::new();
    let mut requeue_front = VecDeque::new();
    let mut board_time_secs = 0.0;

    while let Some(entity) = queue.pop_front() {
        let passenger = passengers
            .get(&entity)
            .expect("queued passenger must have component data");
        debug_assert!(
            route.remaining_stops_include(stop_index, passenger.destination),
            "passenger destination not reachable by the boarding bus"
        );

        if manifest.can_board(passenger.mobility, capacity, max_wheelchair) {
            manifest.board(entity, passenger.mobility);
            board_time_secs += constants.board_time(passenger.mobility);
            boarded.push(entity);
        } else {
            let requeued = rng.gen::<f64>() < passenger.requeue_probability;
            if requeued {
                requeue_front.push_back(entity);
            }
            denied.push(Denial { passenger: entity, requeued });
        }
    }

    for entity in requeue_front.into_iter().rev() {
        queue.push_front(entity);
    }

    BoardOutcome {
        boarded,
        denied,
        board_time_secs,
    }
}

/// Dwell time = alight time + board time (sequential door operations; see
/// the grounding ledger's Open Question decision). Holding, if any, is
/// added on top by the dispatch holding controller, not here.
pub fn dwell_time(alight_time_secs: f64, board_time_secs: f64) -> f64 {
    alight_time_secs + board_time_secs
}

/// Whether `stop_index` is the terminus for `bus`'s direction on `route`.
pub fn is_terminus_stop(route: &RouteConfig, bus: &Bus, stop_index: usize) -> bool {
    debug_assert_eq!(route.direction, bus.direction);
    route.is_terminus(stop_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Direction;
    use rand::rngs::mock::StepRng;

    fn passenger(direction: Direction, destination: StopId, mobility: Mobility, p_requeue: f64) -> Passenger {
        Passenger {
            direction,
            origin: StopId(0),
            origin_index: 0,
            destination,
            arrival_time: 0,
            mobility,
            requeue_probability: p_requeue,
        }
    }

    #[test]
    fn alight_removes_matching_destination_only() {
        let mut manifest = BusManifest::default();
        let a = Entity::from_raw(0);
        let b = Entity::from_raw(1);
        manifest.board(a, Mobility::Regular);
        manifest.board(b, Mobility::Regular);
        let mut passengers = HashMap::new();
        passengers.insert(a, passenger(Direction::Outbound, StopId(2), Mobility::Regular, 0.0));
        passengers.insert(b, passenger(Direction::Outbound, StopId(5), Mobility::Regular, 0.0));

        let (alighted, time) = alight(&mut manifest, &passengers, StopId(2), false, &DwellConstants::default());
        assert_eq!(alighted, vec![a]);
        assert_eq!(time, 1.0);
        assert_eq!(manifest.load(), 1);
    }

    #[test]
    fn terminus_alights_everyone() {
        let mut manifest = BusManifest::default();
        let a = Entity::from_raw(0);
        manifest.board(a, Mobility::Wheelchair);
        let mut passengers = HashMap::new();
        passengers.insert(a, passenger(Direction::Outbound, StopId(9), Mobility::Wheelchair, 0.0));

        let (alighted, time) = alight(&mut manifest, &passengers, StopId(0), true, &DwellConstants::default());
        assert_eq!(alighted, vec![a]);
        assert_eq!(time, 45.0);
    }

    #[test]
    fn capacity_cap_denies_overflow_and_respects_requeue() {
        let route = RouteConfig::new(
            Direction::Outbound,
            (0..4).map(StopId).collect(),
            vec![100.0, 100.0, 100.0],
            Default::default(),
        )
        .unwrap();
        let mut manifest = BusManifest::default();
        let mut queue = VecDeque::new();
        let mut passengers = HashMap::new();
        for i in 0..3u32 {
            let e = Entity::from_raw(i);
            queue.push_back(e);
            passengers.insert(e, passenger(Direction::Outbound, StopId(3), Mobility::Regular, 1.0));
        }
        let mut rng = StepRng::new(0, 1);
        let outcome = board(
            &mut manifest,
            &mut queue,
            &passengers,
            &route,
            0,
            2,
            1,
            &DwellConstants::default(),
            &mut rng,
        );
        assert_eq!(outcome.boarded.len(), 2);
        assert_eq!(outcome.denied.len(), 1);
        assert!(outcome.denied[0].requeued);
        assert_eq!(queue.len(), 1, "requeued passenger rejoins the queue");
    }

    #[test]
    fn wheelchair_cap_denies_second_wheelchair() {
        let route = RouteConfig::new(
            Direction::Outbound,
            (0..4).map(StopId).collect(),
            vec![100.0, 100.0, 100.0],
            Default::default(),
        )
        .unwrap();
        let mut manifest = BusManifest::default();
        let mut queue = VecDeque::new();
        let mut passengers = HashMap::new();
        let w1 = Entity::from_raw(0);
        let w2 = Entity::from_raw(1);
        let reg = Entity::from_raw(2);
        for &(e, mob) in &[(w1, Mobility::Wheelchair), (w2, Mobility::Wheelchair), (reg, Mobility::Regular)] {
            queue.push_back(e);
            passengers.insert(e, passenger(Direction::Outbound, StopId(3), mob, 0.0));
        }
        let mut rng = StepRng::new(0, 1);
        let outcome = board(
            &mut manifest,
            &mut queue,
            &passengers,
            &route,
            0,
            10,
            1,
            &DwellConstants::default(),
            &mut rng,
        );
        assert_eq!(outcome.boarded, vec![w1, reg]);
        assert_eq!(outcome.denied.len(), 1);
        assert_eq!(outcome.denied[0].passenger, w2);
    }

    #[test]
    fn dwell_time_is_sum_of_alight_and_board() {
        assert_eq!(dwell_time(3.0, 4.0), 7.0);
    }
}
