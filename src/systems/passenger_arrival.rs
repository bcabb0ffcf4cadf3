//! Reacts to a `PassengerArrival` kernel callback for one `(direction,
//! stop_index)` generator (§4.3).

use bevy_ecs::prelude::{Mut, World};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::demand::DemandModel;
use crate::generator::{generate_tick, GeneratorAction, GeneratorConfig};
use crate::profiling::EventMetrics;
use crate::route::{Direction, Routes, StopQueues};
use crate::runner::SimRng;
use crate::telemetry::{DomainEvent, EventSink, SimEventLog};

pub fn fire(world: &mut World, direction: Direction, stop_index: usize) {
    let action = world.resource_scope(|world, mut rng: Mut<SimRng>| {
        let demand = world.resource::<DemandModel>();
        let clock = world.resource::<SimulationClock>();
        let routes = world.resource::<Routes>();
        let config = world.resource::<GeneratorConfig>();
        generate_tick(demand, clock, routes.get(direction), direction, stop_index, config, &mut rng.0)
    });

    let next_delay = match action {
        GeneratorAction::BackOff { delay_secs } => delay_secs,
        GeneratorAction::NoPassenger { next_delay_secs } => next_delay_secs,
        GeneratorAction::Spawn { passenger, next_delay_secs } => {
            let now = world.resource::<SimulationClock>().now();
            let entity = world.spawn(passenger).id();
            world.resource_mut::<StopQueues>().push(direction, stop_index, entity);
            world.resource_mut::<EventMetrics>().passengers_generated += 1;
            world.resource_mut::<SimEventLog>().emit(DomainEvent::PassengerArrival {
                passenger: entity,
                stop: passenger.origin,
                direction,
                time: now,
            });
            next_delay_secs
        }
    };

    world.resource_mut::<SimulationClock>().schedule(
        next_delay,
        EventKind::PassengerArrival,
        Some(EventSubject::Stop { direction, stop_index }),
    );
}
