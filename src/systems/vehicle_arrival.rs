//! Reacts to a `VehicleArrival` kernel callback (§4.5): run the alight/board
//! walks, evaluate the holding controller, and schedule departure.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Mut, World};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::dispatch::{DispatchRegistry, Dispatchers};
use crate::ecs::{Bus, BusManifest, BusSchedule, BusState, BusTiming, Passenger, PendingDeparture, VehicleConfig};
use crate::profiling::EventMetrics;
use crate::route::{Routes, StopQueues};
use crate::runner::SimRng;
use crate::stop_ops::{self, DwellConstants};
use crate::telemetry::{DomainEvent, EventSink, SimEventLog};

pub fn fire(world: &mut World, bus: Entity) {
    let (direction, stop_index, h_assigned) = {
        let b = world.get::<Bus>(bus).expect("arriving bus must exist");
        let stop_index = match b.state {
            BusState::EnRoute { toward_index } => toward_index,
            other => unreachable!("VehicleArrival fired for a bus not EnRoute: {other:?}"),
        };
        (b.direction, stop_index, b.h_assigned)
    };

    let now = world.resource::<SimulationClock>().now();
    let route = world.resource::<Routes>().get(direction).clone();
    let stop = route.stops[stop_index];
    let is_terminus = route.is_terminus(stop_index);
    let scheduled_arrival = world
        .get::<BusSchedule>(bus)
        .and_then(|s| s.scheduled_arrivals.get(stop_index).copied());

    if let Some(mut timing) = world.get_mut::<BusTiming>(bus) {
        timing.last_arrival_time = Some(now);
    }
    world.resource_mut::<SimEventLog>().emit(DomainEvent::BusArrival {
        bus,
        stop,
        stop_index,
        time: now,
        scheduled_time: scheduled_arrival,
    });

    let dwell_constants = *world.resource::<DwellConstants>();
    let vehicle_config = *world.resource::<VehicleConfig>();

    let onboard: Vec<Entity> = world.get::<BusManifest>(bus).unwrap().onboard().to_vec();
    let mut passengers: HashMap<Entity, Passenger> = HashMap::new();
    for &e in &onboard {
        passengers.insert(e, *world.get::<Passenger>(e).expect("onboard entity must be a passenger"));
    }

    let (alighted, alight_time) = {
        let mut manifest = world.get_mut::<BusManifest>(bus).unwrap();
        stop_ops::alight(&mut manifest, &passengers, stop, is_terminus, &dwell_constants)
    };
    for &e in &alighted {
        world.resource_mut::<EventMetrics>().passengers_alighted += 1;
        world
            .resource_mut::<SimEventLog>()
            .emit(DomainEvent::PassengerAlighted { passenger: e, bus, time: now });
    }
    for &e in &alighted {
        world.despawn(e);
    }

    let queued: Vec<Entity> = world
        .resource::<StopQueues>()
        .queue(direction, stop_index)
        .iter()
        .copied()
        .collect();
    for &e in &queued {
        passengers.insert(e, *world.get::<Passenger>(e).expect("queued entity must be a passenger"));
    }

    let capacity = world.get::<Bus>(bus).unwrap().capacity;
    let (boarded, denied, board_time) = world.resource_scope(|world, mut rng: Mut<SimRng>| {
        world.resource_scope(|world, mut queues: Mut<StopQueues>| {
            let queue = queues.queue_mut(direction, stop_index);
            let mut manifest = world.get_mut::<BusManifest>(bus).unwrap();
            let outcome = stop_ops::board(
                &mut manifest,
                queue,
                &passengers,
                &route,
                stop_index,
                capacity,
                vehicle_config.max_wheelchair,
                &dwell_constants,
                &mut rng.0,
            );
            (outcome.boarded, outcome.denied, outcome.board_time_secs)
        })
    });

    for &e in &boarded {
        world.resource_mut::<EventMetrics>().passengers_boarded += 1;
        world
            .resource_mut::<SimEventLog>()
            .emit(DomainEvent::PassengerBoarded { passenger: e, bus, time: now });
    }
    for denial in &denied {
        if denial.requeued {
            world.resource_mut::<EventMetrics>().passengers_denied_and_requeued += 1;
        } else {
            world.despawn(denial.passenger);
        }
        world.resource_mut::<EventMetrics>().passengers_denied += 1;
        world.resource_mut::<SimEventLog>().emit(DomainEvent::PassengerDenied {
            passenger: denial.passenger,
            bus,
            time: now,
            requeued: denial.requeued,
        });
    }

    let mut tau_hold = 0.0;
    if !is_terminus && stop_index > 0 {
        if let Some(h) = h_assigned {
            let dispatch_seq = world.get::<BusTiming>(bus).unwrap().dispatch_seq;
            let preceding = world.resource::<DispatchRegistry>().preceding(direction, dispatch_seq);
            match preceding.and_then(|prev_bus| {
                world
                    .get::<BusTiming>(prev_bus)
                    .and_then(|t| t.departure_at(stop_index))
            }) {
                None => {
                    world.resource_mut::<EventMetrics>().skipped_holds_no_predecessor += 1;
                    log::warn!(
                        "bus {bus:?} at stop {stop_index} has no preceding bus's departure recorded yet, skipping hold"
                    );
                }
                Some(t_prev) => {
                    tau_hold = world
                        .resource::<Dispatchers>()
                        .get(direction)
                        .request_hold(h, now, Some(t_prev));
                    if tau_hold > 0.0 {
                        world.resource_mut::<EventMetrics>().holds_applied += 1;
                        world.resource_mut::<SimEventLog>().emit(DomainEvent::HeadwayAdjust {
                            bus,
                            stop,
                            time: now,
                            tau_hold,
                        });
                    } else {
                        world.resource_mut::<EventMetrics>().suppressed_holds += 1;
                    }
                }
            }
        }
    }

    let dwell_secs = stop_ops::dwell_time(alight_time, board_time) + tau_hold;
    world.entity_mut(bus).insert(PendingDeparture {
        stop_index,
        boarded: boarded.len() as u32,
        alighted: alighted.len() as u32,
        dwell_secs,
    });

    world.resource_mut::<SimulationClock>().schedule(
        dwell_secs.round().max(0.0) as u64,
        EventKind::VehicleDeparture,
        Some(EventSubject::Bus(bus)),
    );
}
