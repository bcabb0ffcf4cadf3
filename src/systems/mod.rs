//! Kernel callbacks (§4): one module per [`crate::clock::EventKind`], each
//! exposing a single `fire` function the runner dispatches into.

pub mod dispatch_tick;
pub mod passenger_arrival;
pub mod vehicle_arrival;
pub mod vehicle_departure;
