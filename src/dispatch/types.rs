//! The `Dispatcher` capability set (§4.6) and the holding controller shared
//! by every implementation.

use crate::demand::DemandModel;
use crate::clock::SimulationClock;
use crate::route::{Direction, RouteConfig};

/// In-trip holding controller tunables (§4.6.2).
#[derive(Debug, Clone, Copy)]
pub struct HoldingConfig {
    pub max_hold_secs: u64,
    /// Fraction of `h_assigned` below which a computed hold is suppressed
    /// as a trivial micro-hold. Spec default range 0.05-0.20.
    pub headway_tolerance: f64,
}

impl Default for HoldingConfig {
    fn default() -> Self {
        Self {
            max_hold_secs: 30,
            headway_tolerance: 0.1,
        }
    }
}

/// Steps 2-6 of the in-trip holding controller. `t_prev_dep` is the
/// preceding bus's recorded departure time at the current stop; callers
/// are expected to have already resolved "no preceding bus at this stop
/// yet" to `tau_hold = 0` before calling this (step 1).
pub fn compute_hold(h_assigned: u64, now: u64, t_prev_dep: u64, config: &HoldingConfig) -> f64 {
    if now < t_prev_dep {
        return 0.0;
    }
    let delta = (now - t_prev_dep) as f64;
    let h = h_assigned as f64;
    if delta >= h {
        // Running on time or late: never speeds a late bus up.
        return 0.0;
    }
    let tau_hold = (h - delta).min(config.max_hold_secs as f64);
    if tau_hold < config.headway_tolerance * h {
        return 0.0;
    }
    tau_hold
}

/// What a dispatch tick decided: the headway to freeze onto the newly
/// dispatched bus (`None` only for a timetable dispatcher's last stop with
/// no following departure to derive a headway from) and the delay until
/// the dispatcher's next self-scheduled tick (`None` once it has nothing
/// left to dispatch).
#[derive(Debug, Clone, Copy)]
pub struct DispatchDecision {
    pub h_assigned: Option<u64>,
    pub next_tick_delay_secs: Option<u64>,
}

/// A pluggable dispatch policy: decides when to inject a new bus onto a
/// route direction, and whether/how much to hold an in-trip bus.
pub trait Dispatcher: Send + Sync {
    /// Delay (seconds from simulation start) until this dispatcher's first
    /// `on_dispatch_tick`.
    fn initial_delay_secs(&self) -> u64;

    /// Fires on a `DispatchTick` event: decide this dispatch's headway and
    /// when to tick again.
    fn on_dispatch_tick(
        &mut self,
        demand: &DemandModel,
        clock: &SimulationClock,
        route: &RouteConfig,
        direction: Direction,
    ) -> DispatchDecision;

    /// The next time this dispatcher expects to dispatch, if known without
    /// firing a tick (e.g. a timetable dispatcher knows its full list
    /// up front).
    fn next_departure_time(&self) -> Option<u64>;

    /// Holding-controller tunables for buses this dispatcher creates.
    fn holding_config(&self) -> HoldingConfig {
        HoldingConfig::default()
    }

    /// Whether the most recent `on_dispatch_tick` hit the zero-demand
    /// guard (only meaningful for the adaptive dispatcher; other variants
    /// never set this).
    fn last_tick_was_zero_demand(&self) -> bool {
        false
    }

    /// `request_hold(bus, current_time)`: steps 2-6 of §4.6.2, given the
    /// bus's frozen `h_assigned` and its preceding bus's departure time at
    /// the stop it just arrived at (`None` if no preceding bus has reached
    /// this stop yet, or there is no preceding bus).
    fn request_hold(&self, h_assigned: u64, now: u64, t_prev_dep: Option<u64>) -> f64 {
        match t_prev_dep {
            Some(t_prev) => compute_hold(h_assigned, now, t_prev, &self.holding_config()),
            None => 0.0,
        }
    }
}
