//! Reacts to a `DispatchTick` kernel callback (§4.6): decide whether to
//! inject a new bus and when to tick again.

use bevy_ecs::prelude::World;

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::demand::DemandModel;
use crate::dispatch::{DispatchRegistry, Dispatchers};
use crate::ecs::{Bus, BusManifest, BusSchedule, BusState, BusTiming, VehicleConfig};
use crate::profiling::EventMetrics;
use crate::route::{Direction, Routes};
use crate::telemetry::{DomainEvent, EventSink, SimEventLog};
use crate::traffic::TrafficResource;

pub fn fire(world: &mut World, direction: Direction) {
    let decision = world.resource_scope(|world, mut dispatchers: bevy_ecs::prelude::Mut<Dispatchers>| {
        let demand = world.resource::<DemandModel>();
        let clock = world.resource::<SimulationClock>();
        let route = world.resource::<Routes>().get(direction).clone();
        dispatchers.get_mut(direction).on_dispatch_tick(demand, clock, &route, direction)
    });

    if world.resource::<Dispatchers>().get(direction).last_tick_was_zero_demand() {
        world.resource_mut::<EventMetrics>().zero_demand_dispatches += 1;
        log::warn!("dispatch tick for {direction:?} hit the zero-demand guard, no bus injected");
    }

    if let Some(h_assigned) = decision.h_assigned {
        let now = world.resource::<SimulationClock>().now();
        let capacity = world.resource::<VehicleConfig>().capacity;

        let bus_entity = world.spawn(Bus::new(0, direction, capacity)).id();
        let dispatch_seq = world.resource_mut::<DispatchRegistry>().register(direction, bus_entity, now);
        let schedule = planned_schedule(world, direction, now);
        world.entity_mut(bus_entity).insert((
            BusManifest::default(),
            BusTiming::new(now, dispatch_seq),
            schedule,
        ));
        {
            let mut bus = world.get_mut::<Bus>(bus_entity).unwrap();
            bus.h_assigned = Some(h_assigned);
            bus.trip_id = dispatch_seq;
            bus.state = BusState::EnRoute { toward_index: 0 };
        }

        world.resource_mut::<EventMetrics>().buses_dispatched += 1;
        world.resource_mut::<SimEventLog>().emit(DomainEvent::BusDispatch {
            bus: bus_entity,
            direction,
            time: now,
            h_assigned,
        });
        log::info!("dispatched bus {bus_entity:?} on {direction:?} at t={now}, h_assigned={h_assigned}");

        world.resource_mut::<SimulationClock>().schedule(
            0,
            EventKind::VehicleArrival,
            Some(EventSubject::Bus(bus_entity)),
        );
    }

    if let Some(delay) = decision.next_tick_delay_secs {
        world.resource_mut::<SimulationClock>().schedule(
            delay,
            EventKind::DispatchTick,
            Some(EventSubject::Dispatch { direction }),
        );
    }
}

/// Projects a planned arrival time for every stop on `direction`'s route,
/// assuming a zero-dwell run from `dispatch_time` at the traffic
/// interface's current travel times. Gives [`crate::telemetry_export::StopVisitRecord`]
/// a `scheduled_arrival_secs` baseline to compare actuals against for every
/// dispatch policy, not only a timetable's own known departures.
fn planned_schedule(world: &World, direction: Direction, dispatch_time: u64) -> BusSchedule {
    let route = world.resource::<Routes>().get(direction).clone();
    let traffic = world.resource::<TrafficResource>();

    let mut scheduled_arrivals = Vec::with_capacity(route.stop_count());
    scheduled_arrivals.push(dispatch_time);
    let mut t = dispatch_time as f64;
    for stop_index in 0..route.stop_count().saturating_sub(1) {
        t += traffic.travel_time(&route, stop_index, t.round().max(0.0) as u64).max(0.0);
        scheduled_arrivals.push(t.round() as u64);
    }

    BusSchedule { scheduled_arrivals }
}
