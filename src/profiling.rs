//! Soft-anomaly counters (§7): things that are handled locally rather than
//! failing the run, but are worth surfacing to whoever reads the run's
//! summary afterward.

use bevy_ecs::prelude::Resource;

#[derive(Debug, Default, Resource)]
pub struct EventMetrics {
    pub passengers_generated: u64,
    pub passengers_boarded: u64,
    pub passengers_alighted: u64,
    pub passengers_denied: u64,
    pub passengers_denied_and_requeued: u64,
    pub buses_dispatched: u64,
    /// Dispatch ticks where the adaptive dispatcher hit the zero-demand
    /// guard (`lambda_hat / |M| < 1e-3`) and fell back to `h_max`.
    pub zero_demand_dispatches: u64,
    /// Holding-controller evaluations that computed a non-zero hold.
    pub holds_applied: u64,
    /// Holding-controller evaluations suppressed by the tolerance band.
    pub suppressed_holds: u64,
    /// Holding-controller evaluations skipped because the preceding bus
    /// had not yet reached the current stop.
    pub skipped_holds_no_predecessor: u64,
}

impl EventMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_counters_start_at_zero() {
        let metrics = EventMetrics::new();
        assert_eq!(metrics.buses_dispatched, 0);
        assert_eq!(metrics.suppressed_holds, 0);
    }
}
