//! Scenario setup: wires every resource a run needs into a fresh [`World`].

use std::collections::{HashMap, HashSet};

use bevy_ecs::prelude::World;
use chrono::NaiveDate;

use crate::clock::SimulationClock;
use crate::demand::{DemandModel, Daypart};
use crate::dispatch::{
    AdaptiveHeadwayDispatcher, DispatchRegistry, Dispatcher, Dispatchers, FixedIntervalDispatcher,
    HoldingConfig, TimetableDispatcher,
};
use crate::ecs::VehicleConfig;
use crate::error::SetupError;
use crate::generator::GeneratorConfig;
use crate::profiling::EventMetrics;
use crate::route::{Direction, RouteConfig, Routes, StopQueues, StopRegistry};
use crate::runner::{KpiConfig, SimRng, SimulationEndTime};
use crate::stop_ops::DwellConstants;
use crate::telemetry::SimEventLog;
use crate::telemetry_export::StopVisitLog;
use crate::traffic::{SimulatedTraffic, TrafficResource};

/// Which dispatch policy governs both directions of a scenario. Per-direction
/// overrides are not modeled; a real deployment can always call
/// [`build_scenario`] and then swap [`Dispatchers`] by hand for a direction
/// that needs a different policy.
#[derive(Debug, Clone)]
pub enum DispatchPolicy {
    Timetable { outbound: Vec<u64>, inbound: Vec<u64> },
    FixedInterval {
        default_interval_secs: u64,
        /// Overrides `default_interval_secs` during `MorningPeak`/`EveningPeak`.
        peak_interval_secs: Option<u64>,
        /// Overrides `default_interval_secs` during `Midday`/`Night`.
        off_peak_interval_secs: Option<u64>,
    },
    AdaptiveHeadway {
        beta_target: f64,
        h_min_secs: u64,
        h_max_secs: u64,
    },
}

/// Parameters for building a scenario. Mirrors one physical corridor served
/// in both directions by the same stop list in reverse.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub route_id: String,
    pub outbound_stops: Vec<(u32, String)>,
    pub distances_m: Vec<f64>,
    pub monitored: HashSet<usize>,
    pub vehicle: VehicleConfig,
    pub dwell: DwellConstants,
    pub generator: GeneratorConfig,
    pub traffic: SimulatedTraffic,
    pub holding: HoldingConfig,
    pub dispatch_policy: DispatchPolicy,
    /// Random seed for reproducibility.
    pub seed: u64,
    pub epoch: NaiveDate,
    /// Simulation end time in seconds. When set, [`crate::runner::run_until`]
    /// stops once the next event would fire at or after this timestamp.
    pub simulation_end_secs: Option<u64>,
    /// Whether to schedule periodic `KpiSnapshot` events (§6.4 `enable_kpi`).
    pub enable_kpi: bool,
    /// Interval, in seconds, between `KpiSnapshot` events when enabled
    /// (§6.4 `kpi_export_interval`).
    pub kpi_export_interval_secs: u64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            route_id: "R1".to_string(),
            outbound_stops: vec![],
            distances_m: vec![],
            monitored: HashSet::new(),
            vehicle: VehicleConfig::default(),
            dwell: DwellConstants::default(),
            generator: GeneratorConfig::default(),
            traffic: SimulatedTraffic::default(),
            holding: HoldingConfig::default(),
            dispatch_policy: DispatchPolicy::FixedInterval {
                default_interval_secs: 600,
                peak_interval_secs: None,
                off_peak_interval_secs: None,
            },
            seed: 0,
            epoch: NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid default epoch"),
            simulation_end_secs: None,
            enable_kpi: false,
            kpi_export_interval_secs: 900,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_simulation_end_secs(mut self, end_secs: u64) -> Self {
        self.simulation_end_secs = Some(end_secs);
        self
    }

    pub fn with_dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.dispatch_policy = policy;
        self
    }
}

fn boxed_dispatcher(
    policy: &DispatchPolicy,
    direction: Direction,
    vehicle: &VehicleConfig,
    holding: HoldingConfig,
    monitored: &HashSet<usize>,
) -> Result<Box<dyn Dispatcher>, SetupError> {
    match policy {
        DispatchPolicy::Timetable { outbound, inbound } => {
            let departures = match direction {
                Direction::Outbound => outbound.clone(),
                Direction::Inbound => inbound.clone(),
            };
            let _ = holding; // timetable dispatcher has no holding knobs of its own; it always uses the trait default.
            Ok(Box::new(TimetableDispatcher::new(departures)?))
        }
        DispatchPolicy::FixedInterval { default_interval_secs, peak_interval_secs, off_peak_interval_secs } => {
            let mut by_daypart = HashMap::new();
            if let Some(peak) = peak_interval_secs {
                by_daypart.insert(Daypart::MorningPeak, *peak);
                by_daypart.insert(Daypart::EveningPeak, *peak);
            }
            if let Some(off_peak) = off_peak_interval_secs {
                by_daypart.insert(Daypart::Midday, *off_peak);
                by_daypart.insert(Daypart::Night, *off_peak);
            }
            Ok(Box::new(FixedIntervalDispatcher::new(by_daypart, *default_interval_secs, holding)))
        }
        DispatchPolicy::AdaptiveHeadway { beta_target, h_min_secs, h_max_secs } => {
            if *h_min_secs > *h_max_secs {
                log::error!("scenario setup failed: h_min ({h_min_secs}) must be <= h_max ({h_max_secs})");
                return Err(SetupError::HeadwayBoundsInverted { h_min: *h_min_secs, h_max: *h_max_secs });
            }
            Ok(Box::new(AdaptiveHeadwayDispatcher::new(
                monitored.clone(),
                *beta_target,
                vehicle.capacity,
                *h_min_secs,
                *h_max_secs,
                holding,
            )))
        }
    }
}

/// Builds a complete scenario: both directions' routes (the inbound
/// direction is the outbound stop list reversed, sharing the same
/// [`crate::route::StopId`]s), the stop registry, demand model, dispatch
/// policy, and every ambient resource the kernel callbacks read.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<(), SetupError> {
    use crate::route::StopId;

    if params.vehicle.capacity <= 0 {
        log::error!("scenario setup failed: vehicle capacity must be positive, got {}", params.vehicle.capacity);
        return Err(SetupError::NonPositiveCapacity(params.vehicle.capacity));
    }

    let stop_ids: Vec<StopId> = params.outbound_stops.iter().map(|(id, _)| StopId(*id)).collect();
    let mut registry = StopRegistry::new();
    for (id, abbreviation) in &params.outbound_stops {
        registry.insert(crate::route::StopDef { id: StopId(*id), abbreviation: abbreviation.clone() });
    }
    world.insert_resource(registry);

    let outbound_route = RouteConfig::new(
        Direction::Outbound,
        stop_ids.clone(),
        params.distances_m.clone(),
        params.monitored.clone(),
    )?
    .with_route_id(params.route_id.clone());

    let mut inbound_stops = stop_ids.clone();
    inbound_stops.reverse();
    let mut inbound_distances = params.distances_m.clone();
    inbound_distances.reverse();
    let inbound_monitored: HashSet<usize> = params
        .monitored
        .iter()
        .map(|&i| stop_ids.len() - 1 - i)
        .collect();
    let inbound_route = RouteConfig::new(Direction::Inbound, inbound_stops, inbound_distances, inbound_monitored)?
        .with_route_id(params.route_id.clone());

    let stop_count = stop_ids.len();
    world.insert_resource(Routes { outbound: outbound_route, inbound: inbound_route });
    world.insert_resource(StopQueues::new(stop_count, stop_count));

    world.insert_resource(DemandModel::default());
    world.insert_resource(params.generator);
    world.insert_resource(params.dwell);
    world.insert_resource(params.vehicle);
    world.insert_resource(TrafficResource(Box::new(params.traffic)));

    let outbound_dispatcher = boxed_dispatcher(&params.dispatch_policy, Direction::Outbound, &params.vehicle, params.holding, &params.monitored)?;
    let inbound_monitored: HashSet<usize> = params.monitored.iter().map(|&i| stop_count - 1 - i).collect();
    let inbound_dispatcher = boxed_dispatcher(&params.dispatch_policy, Direction::Inbound, &params.vehicle, params.holding, &inbound_monitored)?;
    world.insert_resource(Dispatchers::new(outbound_dispatcher, inbound_dispatcher));
    world.insert_resource(DispatchRegistry::new());

    world.insert_resource(SimEventLog::new());
    world.insert_resource(EventMetrics::new());
    world.insert_resource(StopVisitLog::new());
    world.insert_resource(SimRng::seeded(params.seed));

    if let Some(end_secs) = params.simulation_end_secs {
        world.insert_resource(SimulationEndTime(end_secs));
    }

    world.insert_resource(KpiConfig {
        enabled: params.enable_kpi,
        interval_secs: params.kpi_export_interval_secs,
    });

    world.insert_resource(SimulationClock::with_epoch(params.epoch));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::StopId as RouteStopId;

    fn simple_params() -> ScenarioParams {
        ScenarioParams {
            outbound_stops: vec![
                (0, "A".into()),
                (1, "B".into()),
                (2, "C".into()),
                (3, "D".into()),
            ],
            distances_m: vec![500.0, 500.0, 500.0],
            monitored: HashSet::from([0, 1]),
            ..ScenarioParams::default()
        }
    }

    #[test]
    fn build_scenario_populates_both_directions() {
        let mut world = World::new();
        build_scenario(&mut world, simple_params()).unwrap();
        let routes = world.resource::<Routes>();
        assert_eq!(routes.outbound.stops, vec![RouteStopId(0), RouteStopId(1), RouteStopId(2), RouteStopId(3)]);
        assert_eq!(routes.inbound.stops, vec![RouteStopId(3), RouteStopId(2), RouteStopId(1), RouteStopId(0)]);
        assert!(world.get_resource::<StopQueues>().is_some());
        assert!(world.get_resource::<Dispatchers>().is_some());
    }

    #[test]
    fn build_scenario_mirrors_monitored_indices_for_inbound() {
        let mut world = World::new();
        build_scenario(&mut world, simple_params()).unwrap();
        // outbound monitors {0,1}; reversed route of len 4 mirrors to {3,2}
        let dispatchers = world.resource::<Dispatchers>();
        // Indirect check: inbound dispatcher must exist and be usable.
        assert!(dispatchers.get(Direction::Inbound).next_departure_time().is_none());
    }

    #[test]
    fn build_scenario_rejects_non_positive_capacity() {
        let mut world = World::new();
        let params = ScenarioParams { vehicle: VehicleConfig { capacity: 0, max_wheelchair: 1 }, ..simple_params() };
        let err = build_scenario(&mut world, params).unwrap_err();
        assert_eq!(err, crate::error::SetupError::NonPositiveCapacity(0));
    }

    #[test]
    fn build_scenario_rejects_inverted_headway_bounds() {
        let mut world = World::new();
        let params = ScenarioParams {
            dispatch_policy: DispatchPolicy::AdaptiveHeadway { beta_target: 0.85, h_min_secs: 600, h_max_secs: 300 },
            ..simple_params()
        };
        let err = build_scenario(&mut world, params).unwrap_err();
        assert_eq!(err, crate::error::SetupError::HeadwayBoundsInverted { h_min: 600, h_max: 300 });
    }

    #[test]
    fn fixed_interval_peak_override_reaches_the_dispatcher() {
        let mut world = World::new();
        let params = ScenarioParams {
            dispatch_policy: DispatchPolicy::FixedInterval {
                default_interval_secs: 900,
                peak_interval_secs: Some(300),
                off_peak_interval_secs: None,
            },
            ..simple_params()
        };
        build_scenario(&mut world, params).unwrap();
        let demand = DemandModel::default();
        let mut clock = SimulationClock::with_epoch(simple_params().epoch);
        clock.advance_to(7 * 3600); // morning peak
        let route = world.resource::<Routes>().outbound.clone();
        let decision = world
            .resource_mut::<Dispatchers>()
            .get_mut(Direction::Outbound)
            .on_dispatch_tick(&demand, &clock, &route, Direction::Outbound);
        assert_eq!(decision.h_assigned, Some(300));
    }
}
