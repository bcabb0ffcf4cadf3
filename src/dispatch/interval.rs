//! Fixed-interval dispatcher (§4.6.3): piecewise-constant headway by
//! daypart, no demand inputs.

use std::collections::HashMap;

use crate::clock::SimulationClock;
use crate::demand::{DemandModel, Daypart};
use crate::dispatch::types::{DispatchDecision, Dispatcher, HoldingConfig};
use crate::route::{Direction, RouteConfig};

#[derive(Debug, Clone)]
pub struct FixedIntervalDispatcher {
    by_daypart: HashMap<Daypart, u64>,
    default_interval_secs: u64,
    holding: HoldingConfig,
    next_departure: Option<u64>,
}

impl FixedIntervalDispatcher {
    pub fn new(by_daypart: HashMap<Daypart, u64>, default_interval_secs: u64, holding: HoldingConfig) -> Self {
        Self {
            by_daypart,
            default_interval_secs,
            holding,
            next_departure: None,
        }
    }

    fn interval_for(&self, daypart: Daypart) -> u64 {
        self.by_daypart
            .get(&daypart)
            .copied()
            .unwrap_or(self.default_interval_secs)
    }
}

impl Dispatcher for FixedIntervalDispatcher {
    fn initial_delay_secs(&self) -> u64 {
        0
    }

    fn on_dispatch_tick(
        &mut self,
        demand: &DemandModel,
        clock: &SimulationClock,
        _route: &RouteConfig,
        _direction: Direction,
    ) -> DispatchDecision {
        let daypart = demand.dayparts.daypart_for(clock.time_of_day());
        let interval = self.interval_for(daypart);
        self.next_departure = Some(clock.now() + interval);
        DispatchDecision {
            h_assigned: Some(interval),
            next_tick_delay_secs: Some(interval),
        }
    }

    fn next_departure_time(&self) -> Option<u64> {
        self.next_departure
    }

    fn holding_config(&self) -> HoldingConfig {
        self.holding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn falls_back_to_default_interval_when_daypart_unconfigured() {
        let demand = DemandModel::default();
        let clock = SimulationClock::with_epoch(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let route = RouteConfig::new(Direction::Outbound, vec![crate::route::StopId(0)], vec![], Default::default()).unwrap();
        let mut dispatcher = FixedIntervalDispatcher::new(HashMap::new(), 900, HoldingConfig::default());
        let decision = dispatcher.on_dispatch_tick(&demand, &clock, &route, Direction::Outbound);
        assert_eq!(decision.h_assigned, Some(900));
        assert_eq!(dispatcher.next_departure_time(), Some(900));
    }

    #[test]
    fn peak_interval_overrides_default() {
        let demand = DemandModel::default();
        let mut clock = SimulationClock::with_epoch(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        clock.advance_to(7 * 3600); // morning peak
        let route = RouteConfig::new(Direction::Outbound, vec![crate::route::StopId(0)], vec![], Default::default()).unwrap();
        let mut by_daypart = HashMap::new();
        by_daypart.insert(Daypart::MorningPeak, 300);
        let mut dispatcher = FixedIntervalDispatcher::new(by_daypart, 900, HoldingConfig::default());
        let decision = dispatcher.on_dispatch_tick(&demand, &clock, &route, Direction::Outbound);
        assert_eq!(decision.h_assigned, Some(300));
    }
}
