//! DispatchRegistry (§3): per-direction ordered record of dispatched buses,
//! read by the holding controller and written only by dispatchers.

use std::collections::HashMap;

use bevy_ecs::prelude::{Entity, Resource};

use crate::route::Direction;

struct RegistryEntry {
    bus: Entity,
    dispatch_time: u64,
    dispatch_seq: u64,
}

/// Assigns each dispatched bus a monotone `dispatch_seq`, independent of
/// `dispatch_time`, and uses it to resolve "preceding bus" when two buses
/// are dispatched at the identical simulation second (§9 Open Question).
#[derive(Default, Resource)]
pub struct DispatchRegistry {
    by_direction: HashMap<Direction, Vec<RegistryEntry>>,
    next_seq: u64,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly dispatched bus and returns its assigned
    /// `dispatch_seq`.
    pub fn register(&mut self, direction: Direction, bus: Entity, dispatch_time: u64) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_direction.entry(direction).or_default().push(RegistryEntry {
            bus,
            dispatch_time,
            dispatch_seq: seq,
        });
        seq
    }

    /// The bus immediately preceding `dispatch_seq` in `direction`, i.e.
    /// the one with the largest `dispatch_seq` strictly less than it.
    pub fn preceding(&self, direction: Direction, dispatch_seq: u64) -> Option<Entity> {
        self.by_direction
            .get(&direction)?
            .iter()
            .filter(|e| e.dispatch_seq < dispatch_seq)
            .max_by_key(|e| e.dispatch_seq)
            .map(|e| e.bus)
    }

    pub fn dispatch_time_of(&self, direction: Direction, bus: Entity) -> Option<u64> {
        self.by_direction
            .get(&direction)?
            .iter()
            .find(|e| e.bus == bus)
            .map(|e| e.dispatch_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preceding_resolves_by_dispatch_seq_not_time() {
        let mut registry = DispatchRegistry::new();
        let a = Entity::from_raw(0);
        let b = Entity::from_raw(1);
        let c = Entity::from_raw(2);
        let seq_a = registry.register(Direction::Outbound, a, 100);
        let seq_b = registry.register(Direction::Outbound, b, 100); // identical dispatch time
        let seq_c = registry.register(Direction::Outbound, c, 700);

        assert_eq!(registry.preceding(Direction::Outbound, seq_b), Some(a));
        assert_eq!(registry.preceding(Direction::Outbound, seq_a), None);
        assert_eq!(registry.preceding(Direction::Outbound, seq_c), Some(b));
        assert!(seq_a < seq_b && seq_b < seq_c);
    }

    #[test]
    fn directions_are_independent() {
        let mut registry = DispatchRegistry::new();
        let a = Entity::from_raw(0);
        let seq = registry.register(Direction::Outbound, a, 0);
        assert_eq!(registry.preceding(Direction::Inbound, seq), None);
    }
}
