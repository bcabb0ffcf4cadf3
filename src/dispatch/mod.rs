//! Dispatcher subsystem (§4.6): the `Dispatcher` trait, its three
//! implementations, the shared holding controller, and the ECS resource
//! wiring one dispatcher instance per direction.

pub mod adaptive;
pub mod interval;
pub mod registry;
pub mod timetable;
pub mod types;

pub use adaptive::AdaptiveHeadwayDispatcher;
pub use interval::FixedIntervalDispatcher;
pub use registry::DispatchRegistry;
pub use timetable::TimetableDispatcher;
pub use types::{compute_hold, DispatchDecision, Dispatcher, HoldingConfig};

use bevy_ecs::prelude::Resource;

use crate::route::Direction;

/// One boxed dispatcher per direction, mirroring how [`crate::route::StopQueues`]
/// holds both lanes in a single resource rather than one resource per
/// direction.
#[derive(Resource)]
pub struct Dispatchers {
    pub outbound: Box<dyn Dispatcher>,
    pub inbound: Box<dyn Dispatcher>,
}

impl Dispatchers {
    pub fn new(outbound: Box<dyn Dispatcher>, inbound: Box<dyn Dispatcher>) -> Self {
        Self { outbound, inbound }
    }

    pub fn get(&self, direction: Direction) -> &dyn Dispatcher {
        match direction {
            Direction::Outbound => self.outbound.as_ref(),
            Direction::Inbound => self.inbound.as_ref(),
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut (dyn Dispatcher + 'static) {
        match direction {
            Direction::Outbound => self.outbound.as_mut(),
            Direction::Inbound => self.inbound.as_mut(),
        }
    }
}
