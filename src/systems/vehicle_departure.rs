//! Reacts to a `VehicleDeparture` kernel callback: apply the staged dwell,
//! emit the departure event and stop-visit record, and either retire the
//! bus at its terminus or schedule its next arrival.

use bevy_ecs::prelude::{Entity, World};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::demand::DemandModel;
use crate::ecs::{Bus, BusManifest, BusSchedule, BusState, BusTiming, PendingDeparture};
use crate::route::{Routes, StopRegistry};
use crate::telemetry::{DomainEvent, EventSink, SimEventLog};
use crate::telemetry_export::{StopVisitLog, StopVisitRecord};
use crate::traffic::TrafficResource;

pub fn fire(world: &mut World, bus: Entity) {
    let pending = world
        .entity_mut(bus)
        .take::<PendingDeparture>()
        .expect("VehicleDeparture fired for a bus with no staged departure");

    let now = world.resource::<SimulationClock>().now();
    let (direction, h_assigned) = {
        let b = world.get::<Bus>(bus).expect("departing bus must exist");
        (b.direction, b.h_assigned)
    };

    let route = world.resource::<Routes>().get(direction).clone();
    let stop = route.stops[pending.stop_index];
    let is_terminus = route.is_terminus(pending.stop_index);

    let dwell_secs = pending.dwell_secs;
    let departure_time = now;
    if let Some(mut timing) = world.get_mut::<BusTiming>(bus) {
        timing.record_departure(pending.stop_index, departure_time);
    }

    let (load, wheelchair_count) = {
        let manifest = world.get::<BusManifest>(bus).expect("departing bus must have a manifest");
        (manifest.load(), manifest.wheelchair_count())
    };

    world.resource_mut::<SimEventLog>().emit(DomainEvent::BusDeparture {
        bus,
        stop,
        stop_index: pending.stop_index,
        time: departure_time,
        dwell_secs,
        boarded: pending.boarded,
        alighted: pending.alighted,
        load,
    });

    let arrival_time = world
        .get::<BusTiming>(bus)
        .and_then(|t| t.last_arrival_time)
        .unwrap_or(departure_time);
    let trip_id = world.get::<Bus>(bus).map(|b| b.trip_id).unwrap_or_default();
    let abbreviation = world.resource::<StopRegistry>().abbreviation(stop);
    let date = world.resource::<DemandModel>().date_at(world.resource::<SimulationClock>());
    let daypart = world
        .resource::<DemandModel>()
        .dayparts
        .daypart_for(arrival_time % 86_400);

    // Scheduled dwell is modeled as zero, so the planned arrival at this stop
    // doubles as the planned departure.
    let scheduled_time = world
        .get::<BusSchedule>(bus)
        .and_then(|s| s.scheduled_arrivals.get(pending.stop_index).copied());

    let record = StopVisitRecord {
        operating_date: date,
        weekday: iso_weekday(date),
        daypart: format!("{daypart:?}"),
        route_id: route.route_id.clone(),
        direction: format!("{direction:?}"),
        trip_id,
        stop_abbreviation: abbreviation,
        sequence: pending.stop_index,
        scheduled_arrival_secs: scheduled_time,
        actual_arrival_secs: arrival_time,
        scheduled_departure_secs: scheduled_time,
        actual_departure_secs: departure_time,
        dwell_secs,
        boarding: pending.boarded,
        alighting: pending.alighted,
        load,
        wheelchair_count,
        distance_to_next_m: route.distance_to_next(pending.stop_index).unwrap_or(0.0),
        distance_remaining_m: route.distance_remaining(pending.stop_index),
    };
    world.resource_mut::<StopVisitLog>().push(record);

    if is_terminus {
        if let Some(mut b) = world.get_mut::<Bus>(bus) {
            b.state = BusState::Finished;
        }
        return;
    }

    let raw_travel_secs = world
        .resource::<TrafficResource>()
        .travel_time(&route, pending.stop_index, departure_time);

    if !raw_travel_secs.is_finite() || raw_travel_secs < 0.0 {
        log::error!(
            "traffic interface fault for bus {bus:?} leaving stop index {}: travel_time returned {raw_travel_secs}, treating bus as gone",
            pending.stop_index
        );
        if let Some(mut b) = world.get_mut::<Bus>(bus) {
            b.state = BusState::Finished;
        }
        return;
    }

    let travel_secs = raw_travel_secs.round() as u64;
    let next_index = pending.stop_index + 1;
    if let Some(mut b) = world.get_mut::<Bus>(bus) {
        b.state = BusState::EnRoute { toward_index: next_index };
        b.h_assigned = h_assigned;
    }

    world.resource_mut::<SimulationClock>().schedule(
        travel_secs,
        EventKind::VehicleArrival,
        Some(EventSubject::Bus(bus)),
    );
}

fn iso_weekday(date: chrono::NaiveDate) -> u32 {
    use chrono::{Datelike, Weekday};
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
