//! Fixed-timetable dispatcher (§4.6.1).

use crate::clock::SimulationClock;
use crate::demand::DemandModel;
use crate::dispatch::types::{DispatchDecision, Dispatcher};
use crate::error::SetupError;
use crate::route::{Direction, RouteConfig};

/// Dispatches at a pre-supplied, strictly increasing list of simulation
/// seconds. `h_assigned` for bus `i` is `t_{i+1} - t_i`; the last bus in
/// the list inherits the preceding interval so holding stays meaningful,
/// or is left unset if it is the only departure.
#[derive(Debug, Clone)]
pub struct TimetableDispatcher {
    departures: Vec<u64>,
    next_index: usize,
}

impl TimetableDispatcher {
    pub fn new(mut departures: Vec<u64>) -> Result<Self, SetupError> {
        if departures.is_empty() {
            log::error!("timetable dispatcher setup failed: departure list is empty");
            return Err(SetupError::EmptyTimetable);
        }
        departures.sort_unstable();
        Ok(Self {
            departures,
            next_index: 0,
        })
    }
}

impl Dispatcher for TimetableDispatcher {
    fn initial_delay_secs(&self) -> u64 {
        self.departures[0]
    }

    fn on_dispatch_tick(
        &mut self,
        _demand: &DemandModel,
        _clock: &SimulationClock,
        _route: &RouteConfig,
        _direction: Direction,
    ) -> DispatchDecision {
        let current = self.departures[self.next_index];
        let h_assigned = if self.next_index + 1 < self.departures.len() {
            Some(self.departures[self.next_index + 1] - current)
        } else if self.next_index > 0 {
            Some(current - self.departures[self.next_index - 1])
        } else {
            None
        };
        self.next_index += 1;
        let next_tick_delay_secs = self
            .departures
            .get(self.next_index)
            .map(|&next| next - current);
        DispatchDecision {
            h_assigned,
            next_tick_delay_secs,
        }
    }

    fn next_departure_time(&self) -> Option<u64> {
        self.departures.get(self.next_index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_timetable_is_rejected() {
        assert_eq!(TimetableDispatcher::new(vec![]).unwrap_err(), SetupError::EmptyTimetable);
    }

    #[test]
    fn headway_is_gap_to_next_departure() {
        let demand = DemandModel::default();
        let clock = SimulationClock::default();
        let mut dispatcher = TimetableDispatcher::new(vec![0, 600, 1500]).unwrap();

        let first = dispatcher.on_dispatch_tick(&demand, &clock, &dummy_route(), Direction::Outbound);
        assert_eq!(first.h_assigned, Some(600));
        assert_eq!(first.next_tick_delay_secs, Some(600));

        let second = dispatcher.on_dispatch_tick(&demand, &clock, &dummy_route(), Direction::Outbound);
        assert_eq!(second.h_assigned, Some(900));
        assert_eq!(second.next_tick_delay_secs, Some(900));

        let third = dispatcher.on_dispatch_tick(&demand, &clock, &dummy_route(), Direction::Outbound);
        assert_eq!(third.h_assigned, Some(900), "last bus inherits preceding interval");
        assert_eq!(third.next_tick_delay_secs, None);
        assert_eq!(dispatcher.next_departure_time(), None);
    }

    fn dummy_route() -> RouteConfig {
        RouteConfig::new(Direction::Outbound, vec![crate::route::StopId(0)], vec![], Default::default()).unwrap()
    }
}
