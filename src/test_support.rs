//! Test helpers for common test setup across integration-style tests.
//!
//! This module provides a minimal, deterministic [`World`] for tests that
//! need a complete scenario rather than hand-wiring individual resources.

use std::collections::HashSet;

use bevy_ecs::prelude::World;
use chrono::NaiveDate;

use crate::runner::initialize_simulation;
use crate::scenario::{build_scenario, DispatchPolicy, ScenarioParams};

/// A four-stop corridor shared by tests that need a fixed, readable route.
pub const TEST_STOPS: [(u32, &str); 4] = [(0, "A"), (1, "B"), (2, "C"), (3, "D")];
pub const TEST_DISTANCES_M: [f64; 3] = [500.0, 500.0, 500.0];
pub const TEST_SEED: u64 = 42;

fn test_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid test epoch")
}

/// Scenario parameters for [`TEST_STOPS`] with a fixed-interval dispatcher
/// and no monitored stops. Callers needing adaptive headway or a timetable
/// should start from this and call `.with_dispatch_policy(..)`.
pub fn test_scenario_params() -> ScenarioParams {
    ScenarioParams {
        route_id: "T1".to_string(),
        outbound_stops: TEST_STOPS.iter().map(|(id, abbr)| (*id, abbr.to_string())).collect(),
        distances_m: TEST_DISTANCES_M.to_vec(),
        monitored: HashSet::new(),
        dispatch_policy: DispatchPolicy::FixedInterval {
            default_interval_secs: 600,
            peak_interval_secs: None,
            off_peak_interval_secs: None,
        },
        seed: TEST_SEED,
        epoch: test_epoch(),
        ..ScenarioParams::default()
    }
}

/// Builds a [`World`] with a complete, deterministic test scenario already
/// wired in, with the bootstrap `SimulationStarted` event scheduled but not
/// yet fired. Callers typically follow with
/// [`crate::runner::run_until_empty`] or [`crate::runner::run_for`].
pub fn build_test_world() -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut world = World::new();
    build_scenario(&mut world, test_scenario_params()).expect("test scenario should be valid");
    initialize_simulation(&mut world);
    world
}

/// Builds a [`World`] from caller-supplied params, for tests that need a
/// non-default scenario but still want the standard init sequence.
pub fn build_test_world_with(params: ScenarioParams) -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut world = World::new();
    build_scenario(&mut world, params).expect("test scenario should be valid");
    initialize_simulation(&mut world);
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as Set;

    use bevy_ecs::prelude::Entity;
    use chrono::{Datelike, Weekday};

    use crate::clock::SimulationClock;
    use crate::demand::{Daypart, DemandModel};
    use crate::ecs::BusManifest;
    use crate::route::Direction;
    use crate::runner::run_for;
    use crate::telemetry::{DomainEvent, SimEventLog};

    #[test]
    fn test_world_advances_without_panicking() {
        let mut world = build_test_world();
        run_for(&mut world, 3600, 10_000);
        assert!(world.resource::<SimulationClock>().now() >= 3600);
    }

    fn iso_weekday(date: NaiveDate) -> u32 {
        match date.weekday() {
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
            Weekday::Sun => 7,
        }
    }

    /// Demand dense enough that a few hours of simulated time reliably
    /// boards and alights passengers at every stop, for tests that need
    /// real passenger traffic rather than an idle scenario.
    fn dense_demand() -> DemandModel {
        let mut demand = DemandModel::default();
        let date = test_epoch();
        let month = date.month();
        let weekday = iso_weekday(date);
        let dayparts = [Daypart::MorningPeak, Daypart::Midday, Daypart::EveningPeak, Daypart::Night];
        for direction in [Direction::Outbound, Direction::Inbound] {
            for stop_index in 0..TEST_STOPS.len() - 1 {
                for daypart in dayparts {
                    demand.arrival_rates.set(direction, stop_index, month, weekday, daypart, 0.02);
                }
            }
            for daypart in dayparts {
                demand
                    .weights
                    .set(direction, month, weekday, daypart, vec![1.0; TEST_STOPS.len()]);
            }
        }
        demand
    }

    fn demand_world(seed: u64) -> World {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut world = World::new();
        let params = test_scenario_params().with_seed(seed);
        build_scenario(&mut world, params).expect("test scenario should be valid");
        world.insert_resource(dense_demand());
        initialize_simulation(&mut world);
        world
    }

    #[test]
    fn identical_seed_produces_identical_event_log() {
        let mut world_a = demand_world(TEST_SEED);
        run_for(&mut world_a, 4 * 3600, 100_000);
        let mut world_b = demand_world(TEST_SEED);
        run_for(&mut world_b, 4 * 3600, 100_000);

        assert_eq!(
            world_a.resource::<SimEventLog>().events(),
            world_b.resource::<SimEventLog>().events()
        );
    }

    #[test]
    fn every_boarded_passenger_eventually_alights_or_stays_onboard() {
        let mut world = demand_world(TEST_SEED);
        run_for(&mut world, 4 * 3600, 100_000);

        let mut boarded: Set<Entity> = Set::new();
        let mut alighted: Set<Entity> = Set::new();
        for event in world.resource::<SimEventLog>().events() {
            match event {
                DomainEvent::PassengerBoarded { passenger, .. } => {
                    boarded.insert(*passenger);
                }
                DomainEvent::PassengerAlighted { passenger, .. } => {
                    alighted.insert(*passenger);
                }
                _ => {}
            }
        }
        assert!(!boarded.is_empty(), "scenario produced no boardings to check");

        let mut onboard_now: Set<Entity> = Set::new();
        let mut query = world.query::<&BusManifest>();
        for manifest in query.iter(&world) {
            onboard_now.extend(manifest.onboard().iter().copied());
        }

        let unaccounted: Vec<Entity> = boarded
            .difference(&alighted)
            .filter(|p| !onboard_now.contains(*p))
            .copied()
            .collect();
        assert!(
            unaccounted.is_empty(),
            "boarded passengers neither alighted nor still onboard: {unaccounted:?}"
        );
    }
}
