//! Route configuration: stops, inter-stop distances, and direction tags.
//!
//! A [`RouteConfig`] is immutable for the life of a run — it is validated
//! once at setup (§7 data-integrity errors) and never mutated afterward.
//! Two directions on the same physical corridor are modeled as two
//! independent `RouteConfig`s (sharing [`StopId`]s where the same physical
//! stop appears in both), since each direction boards a disjoint set of
//! waiting passengers.

use std::collections::{HashMap, HashSet, VecDeque};

use bevy_ecs::prelude::{Entity, Resource};

use crate::error::SetupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Outbound,
    Inbound,
}

/// Static metadata for a physical stop, independent of any one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopDef {
    pub id: StopId,
    pub abbreviation: String,
}

/// Lookup table from [`StopId`] to its display abbreviation, used only by
/// telemetry labelling. A stop with no registered definition falls back to
/// a synthetic `S<id>` label rather than failing the run.
#[derive(Debug, Clone, Default, Resource)]
pub struct StopRegistry {
    defs: HashMap<StopId, StopDef>,
}

impl StopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: StopDef) -> &mut Self {
        self.defs.insert(def.id, def);
        self
    }

    pub fn abbreviation(&self, stop: StopId) -> String {
        self.defs
            .get(&stop)
            .map(|d| d.abbreviation.clone())
            .unwrap_or_else(|| format!("S{}", stop.0))
    }
}

/// An immutable ordered sequence of stops for one direction of travel.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub direction: Direction,
    /// Identifies the physical corridor this direction belongs to, carried
    /// through to [`crate::telemetry_export::StopVisitRecord::route_id`].
    pub route_id: String,
    /// `stops[i]` is the i-th stop visited, `s0..s_{k-1}`.
    pub stops: Vec<StopId>,
    /// `distances_m[i]` is the distance from `stops[i]` to `stops[i+1]`, in
    /// metres. Length is `stops.len() - 1`.
    pub distances_m: Vec<f64>,
    /// Indices (into `stops`) of the monitored stops used by the
    /// adaptive-headway dispatcher, typically 2-4 stops.
    pub monitored: HashSet<usize>,
}

impl RouteConfig {
    pub fn new(
        direction: Direction,
        stops: Vec<StopId>,
        distances_m: Vec<f64>,
        monitored: HashSet<usize>,
    ) -> Result<Self, SetupError> {
        if stops.is_empty() {
            log::error!("route setup failed: stop list is empty");
            return Err(SetupError::EmptyRoute);
        }
        let expected = stops.len().saturating_sub(1);
        if distances_m.len() != expected {
            log::error!(
                "route setup failed: got {} inter-stop distances, expected {expected}",
                distances_m.len()
            );
            return Err(SetupError::DistanceCountMismatch {
                distances: distances_m.len(),
                expected,
            });
        }
        for &idx in &monitored {
            if idx >= stops.len() {
                log::error!("route setup failed: monitored stop index {idx} is out of range");
                return Err(SetupError::MonitoredStopOutOfRange(idx));
            }
        }
        Ok(Self {
            direction,
            route_id: String::new(),
            stops,
            distances_m,
            monitored,
        })
    }

    /// Attaches a route id (e.g. "R1"), used only for telemetry labelling.
    pub fn with_route_id(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = route_id.into();
        self
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn is_terminus(&self, stop_index: usize) -> bool {
        stop_index + 1 >= self.stops.len()
    }

    pub fn distance_to_next(&self, stop_index: usize) -> Option<f64> {
        self.distances_m.get(stop_index).copied()
    }

    /// Total remaining distance from `stop_index` to the terminus.
    pub fn distance_remaining(&self, stop_index: usize) -> f64 {
        self.distances_m.get(stop_index..).map(|s| s.iter().sum()).unwrap_or(0.0)
    }

    /// Whether `destination_stop` is still reachable from `from_index`
    /// (i.e. occurs at or after `from_index` in this direction's stop
    /// sequence). A passenger never boards a bus whose remaining stops do
    /// not include its destination.
    pub fn remaining_stops_include(&self, from_index: usize, destination: StopId) -> bool {
        self.stops[from_index..].iter().any(|&s| s == destination)
    }

    pub fn index_of(&self, stop: StopId) -> Option<usize> {
        self.stops.iter().position(|&s| s == stop)
    }
}

/// Both directions' route configuration, as a single resource — mirrors
/// how [`StopQueues`] holds both lanes rather than splitting into two
/// per-direction resources.
#[derive(Debug, Resource)]
pub struct Routes {
    pub outbound: RouteConfig,
    pub inbound: RouteConfig,
}

impl Routes {
    pub fn get(&self, direction: Direction) -> &RouteConfig {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }
}

/// Per-direction, per-stop FIFO queues of waiting passengers. Touched by a
/// stop's passenger generator (push) and by any arriving bus (pop/walk);
/// both run as kernel callbacks, so no locking is needed (§5).
#[derive(Debug, Default, Resource)]
pub struct StopQueues {
    outbound: Vec<VecDeque<Entity>>,
    inbound: Vec<VecDeque<Entity>>,
}

impl StopQueues {
    pub fn new(outbound_len: usize, inbound_len: usize) -> Self {
        Self {
            outbound: (0..outbound_len).map(|_| VecDeque::new()).collect(),
            inbound: (0..inbound_len).map(|_| VecDeque::new()).collect(),
        }
    }

    fn lane(&self, direction: Direction) -> &[VecDeque<Entity>] {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    fn lane_mut(&mut self, direction: Direction) -> &mut Vec<VecDeque<Entity>> {
        match direction {
            Direction::Outbound => &mut self.outbound,
            Direction::Inbound => &mut self.inbound,
        }
    }

    pub fn push(&mut self, direction: Direction, stop_index: usize, passenger: Entity) {
        self.lane_mut(direction)[stop_index].push_back(passenger);
    }

    pub fn queue(&self, direction: Direction, stop_index: usize) -> &VecDeque<Entity> {
        &self.lane(direction)[stop_index]
    }

    pub fn queue_mut(&mut self, direction: Direction, stop_index: usize) -> &mut VecDeque<Entity> {
        &mut self.lane_mut(direction)[stop_index]
    }

    pub fn len_at(&self, direction: Direction, stop_index: usize) -> usize {
        self.lane(direction)[stop_index].len()
    }
}
