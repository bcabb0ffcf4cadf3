//! Passenger generator (§4.3): one self-rescheduling process per
//! `(stop, direction)`.

use bevy_ecs::prelude::Resource;
use rand::Rng;

use crate::clock::SimulationClock;
use crate::demand::DemandModel;
use crate::distributions::{sample_destination_index, ExponentialInterArrival, InterArrivalDistribution};
use crate::ecs::{Mobility, Passenger};
use crate::route::{Direction, RouteConfig};

/// Tunables for a generator instance (§6.4 passenger-model config).
#[derive(Debug, Clone, Copy, Resource)]
pub struct GeneratorConfig {
    /// Below this rate (passengers/sec), a firing is treated as "no demand"
    /// and the generator backs off instead of drawing an inter-arrival.
    pub epsilon: f64,
    /// Back-off delay applied when demand is below `epsilon`.
    pub backoff_secs: u64,
    pub wheelchair_probability: f64,
    pub requeue_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            backoff_secs: 60,
            wheelchair_probability: 0.01,
            requeue_probability: 0.5,
        }
    }
}

/// What a generator firing should do next: back off, reschedule with no
/// passenger created (destination draw had zero mass), or spawn a
/// passenger and reschedule.
#[derive(Debug, Clone, Copy)]
pub enum GeneratorAction {
    BackOff { delay_secs: u64 },
    NoPassenger { next_delay_secs: u64 },
    Spawn { passenger: Passenger, next_delay_secs: u64 },
}

/// Runs one firing of the generator at `(direction, stop_index)` and
/// decides what happens next. Pure with respect to the RNG passed in —
/// callers own scheduling the resulting delay and, for `Spawn`, creating
/// the entity and pushing it onto the stop queue.
pub fn generate_tick<R: Rng + ?Sized>(
    demand: &DemandModel,
    clock: &SimulationClock,
    route: &RouteConfig,
    direction: Direction,
    stop_index: usize,
    config: &GeneratorConfig,
    rng: &mut R,
) -> GeneratorAction {
    let lambda = demand.rate(clock, direction, stop_index);
    if lambda <= config.epsilon {
        return GeneratorAction::BackOff {
            delay_secs: config.backoff_secs,
        };
    }

    let delay_secs = ExponentialInterArrival
        .sample_delay(lambda, rng)
        .round()
        .max(0.0) as u64;

    let destination_index = demand
        .destination_weights(clock, direction)
        .and_then(|weights| sample_destination_index(weights, stop_index, rng));

    match destination_index {
        None => GeneratorAction::NoPassenger {
            next_delay_secs: delay_secs,
        },
        Some(destination_index) => {
            let mobility = if rng.gen::<f64>() < config.wheelchair_probability {
                Mobility::Wheelchair
            } else {
                Mobility::Regular
            };
            let passenger = Passenger {
                direction,
                origin: route.stops[stop_index],
                origin_index: stop_index,
                destination: route.stops[destination_index],
                arrival_time: clock.now(),
                mobility,
                requeue_probability: config.requeue_probability,
            };
            GeneratorAction::Spawn {
                passenger,
                next_delay_secs: delay_secs,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::Daypart;
    use crate::route::StopId;
    use chrono::NaiveDate;
    use rand::rngs::mock::StepRng;
    use std::collections::HashSet;

    fn route() -> RouteConfig {
        RouteConfig::new(
            Direction::Outbound,
            (0..4).map(StopId).collect(),
            vec![100.0, 100.0, 100.0],
            HashSet::new(),
        )
        .unwrap()
    }

    #[test]
    fn zero_demand_backs_off() {
        let demand = DemandModel::default();
        let clock = SimulationClock::with_epoch(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let mut rng = StepRng::new(0, 1);
        let action = generate_tick(&demand, &clock, &route(), Direction::Outbound, 0, &GeneratorConfig::default(), &mut rng);
        assert!(matches!(action, GeneratorAction::BackOff { delay_secs: 60 }));
    }

    #[test]
    fn terminal_origin_generates_no_passenger() {
        let mut demand = DemandModel::default();
        demand
            .arrival_rates
            .set(Direction::Outbound, 3, 1, 4, Daypart::Night, 1.0);
        demand
            .weights
            .set(Direction::Outbound, 1, 4, Daypart::Night, vec![1.0, 1.0, 1.0, 1.0]);
        let clock = SimulationClock::with_epoch(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let mut rng = StepRng::new(1, 1);
        let action = generate_tick(&demand, &clock, &route(), Direction::Outbound, 3, &GeneratorConfig::default(), &mut rng);
        assert!(matches!(action, GeneratorAction::NoPassenger { .. }));
    }

    #[test]
    fn demand_present_spawns_passenger_beyond_origin() {
        let mut demand = DemandModel::default();
        demand
            .arrival_rates
            .set(Direction::Outbound, 0, 1, 4, Daypart::Night, 1.0);
        demand
            .weights
            .set(Direction::Outbound, 1, 4, Daypart::Night, vec![1.0, 1.0, 1.0, 1.0]);
        let clock = SimulationClock::with_epoch(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let mut rng = StepRng::new(2, 1);
        let action = generate_tick(&demand, &clock, &route(), Direction::Outbound, 0, &GeneratorConfig::default(), &mut rng);
        match action {
            GeneratorAction::Spawn { passenger, .. } => {
                assert!(passenger.destination.0 > 0);
                assert_eq!(passenger.origin_index, 0);
            }
            other => panic!("expected Spawn, got {other:?}"),
        }
    }
}
