//! Simulation runner: advances the clock and routes each popped event to the
//! callback that owns its [`EventKind`].
//!
//! Unlike a schedule built from `run_if`-gated bevy systems, each callback
//! here is a plain `fn(&mut World, ...)` that reads its `EventSubject`
//! payload directly — the adaptive dispatcher and holding controller need
//! several resources and components in a data-dependent sequence
//! (`resource_scope` nesting) that doesn't map cleanly onto bevy's
//! parallel-system model, so the runner dispatches by a straight match on
//! `event.kind` instead of building a `Schedule`.

use bevy_ecs::prelude::{Resource, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::dispatch::Dispatchers;
use crate::route::{Direction, Routes};
use crate::systems::{dispatch_tick, passenger_arrival, vehicle_arrival, vehicle_departure};

/// The kernel's sole source of randomness (§4.1: "the kernel must accept a
/// deterministic random source as input"). One seeded generator shared by
/// every stochastic draw in a run.
#[derive(Debug, Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Simulation horizon, in seconds. When present, [`run_until`] and
/// [`run_until_empty`] stop processing once the next event would fire at or
/// after this timestamp.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTime(pub u64);

/// Periodic KPI rollup configuration (§6.4 `enable_kpi`/`kpi_export_interval`).
#[derive(Debug, Clone, Copy, Resource)]
pub struct KpiConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

fn dispatch_event(world: &mut World, kind: EventKind, subject: Option<EventSubject>) {
    let now = world.resource::<SimulationClock>().now();
    log::debug!("dispatching {kind:?} at t={now} (subject={subject:?})");

    match (kind, subject) {
        (EventKind::PassengerArrival, Some(EventSubject::Stop { direction, stop_index })) => {
            passenger_arrival::fire(world, direction, stop_index);
        }
        (EventKind::DispatchTick, Some(EventSubject::Dispatch { direction })) => {
            dispatch_tick::fire(world, direction);
        }
        (EventKind::VehicleArrival, Some(EventSubject::Bus(bus))) => {
            vehicle_arrival::fire(world, bus);
        }
        (EventKind::VehicleDeparture, Some(EventSubject::Bus(bus))) => {
            vehicle_departure::fire(world, bus);
        }
        (EventKind::SimulationStarted, _) => {
            log::info!("simulation started at t=0, epoch={}", world.resource::<SimulationClock>().epoch());
            seed_initial_events(world);
            fire_kpi_snapshot(world);
        }
        (EventKind::KpiSnapshot, _) => fire_kpi_snapshot(world),
        (kind, subject) => {
            debug_assert!(false, "event {kind:?} fired with an incompatible subject {subject:?}");
        }
    }
}

/// Logs a one-line rollup of [`crate::profiling::EventMetrics`] and
/// reschedules itself after [`KpiConfig::interval_secs`], if enabled.
fn fire_kpi_snapshot(world: &mut World) {
    let Some(config) = world.get_resource::<KpiConfig>().copied() else {
        return;
    };
    if !config.enabled {
        return;
    }

    let now = world.resource::<SimulationClock>().now();
    let metrics = world.resource::<crate::profiling::EventMetrics>();
    log::info!(
        "kpi snapshot t={now}: dispatched={} boarded={} alighted={} denied={}",
        metrics.buses_dispatched,
        metrics.passengers_boarded,
        metrics.passengers_alighted,
        metrics.passengers_denied
    );

    world.resource_mut::<SimulationClock>().schedule(config.interval_secs, EventKind::KpiSnapshot, None);
}

/// Schedules the first `PassengerArrival` generator tick for every
/// non-terminal stop (a terminus never originates a trip) and the first
/// `DispatchTick` for each direction's dispatcher, both at time 0.
fn seed_initial_events(world: &mut World) {
    let now = world.resource::<SimulationClock>().now();

    for direction in [Direction::Outbound, Direction::Inbound] {
        let stop_count = world.resource::<Routes>().get(direction).stop_count();
        for stop_index in 0..stop_count.saturating_sub(1) {
            world.resource_mut::<SimulationClock>().schedule_at(
                now,
                EventKind::PassengerArrival,
                Some(EventSubject::Stop { direction, stop_index }),
            );
        }

        let initial_delay = world.resource::<Dispatchers>().get(direction).initial_delay_secs();
        world.resource_mut::<SimulationClock>().schedule(
            initial_delay,
            EventKind::DispatchTick,
            Some(EventSubject::Dispatch { direction }),
        );
    }
}

/// Schedules the bootstrap `SimulationStarted` event at time 0. Call after
/// [`crate::scenario::build_scenario`] and before draining the clock.
pub fn initialize_simulation(world: &mut World) {
    world
        .resource_mut::<SimulationClock>()
        .schedule_at(0, EventKind::SimulationStarted, None);
}

/// Runs one simulation step: pops the next non-cancelled event and routes it
/// to its callback. Returns `false` if the clock is empty or the next event
/// is at or past [`SimulationEndTime`].
pub fn run_next_event(world: &mut World) -> bool {
    let stop_at = world.get_resource::<SimulationEndTime>().map(|e| e.0);
    let next_ts = world.resource::<SimulationClock>().next_event_time();
    if let (Some(end), Some(ts)) = (stop_at, next_ts) {
        if ts >= end {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    dispatch_event(world, event.kind, event.subject);
    true
}

/// Runs steps until the clock empties or `max_steps` is reached. Returns the
/// number of steps executed.
pub fn run_until_empty(world: &mut World, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world) {
        steps += 1;
    }
    log::info!("simulation ended at t={}, {steps} events processed", world.resource::<SimulationClock>().now());
    steps
}

/// Runs steps until the clock's next event would fire at or after
/// `t_end`, then advances `now` to `t_end` without firing anything further.
/// Returns the number of steps executed.
pub fn run_until(world: &mut World, t_end: u64, max_steps: usize) -> usize {
    world.insert_resource(SimulationEndTime(t_end));
    let mut steps = 0;
    while steps < max_steps {
        let next_ts = world.resource::<SimulationClock>().next_event_time();
        match next_ts {
            Some(ts) if ts < t_end => {
                if !run_next_event(world) {
                    break;
                }
                steps += 1;
            }
            _ => break,
        }
    }
    world.remove_resource::<SimulationEndTime>();
    world.resource_mut::<SimulationClock>().advance_to(t_end);
    log::info!("simulation ended at t={t_end}, {steps} events processed");
    steps
}

/// Runs for `duration` seconds of simulation time from `now`. Convenience
/// wrapper over [`run_until`].
pub fn run_for(world: &mut World, duration_secs: u64, max_steps: usize) -> usize {
    let t_end = world.resource::<SimulationClock>().now() + duration_secs;
    run_until(world, t_end, max_steps)
}
