//! Demand predictor: tabulated arrival rates and destination weights.
//!
//! `DemandModel` is a pure read-only table lookup — the same interface is
//! used both by the passenger generator (§4.3, for inter-arrival draws) and
//! by the adaptive-headway dispatcher (§4.6.2, for the headway formula).

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use chrono::{Datelike, NaiveDate, Weekday};

use crate::clock::SimulationClock;
use crate::route::Direction;

/// A named, contiguous segment of the 24-hour day. The partition itself
/// (which seconds-from-midnight boundary maps to which daypart) is
/// data-driven via [`DaypartSchedule`] — this enum only names the possible
/// segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Daypart {
    MorningPeak,
    Midday,
    EveningPeak,
    Night,
}

/// A closed partition of the 24-hour clock (seconds from midnight) into
/// dayparts. Entries are `(start_of_segment_secs, daypart)`, sorted
/// ascending; the segment for `t` is the last entry whose start is `<= t`,
/// wrapping around midnight.
#[derive(Debug, Clone)]
pub struct DaypartSchedule {
    boundaries: Vec<(u64, Daypart)>,
}

impl DaypartSchedule {
    /// `boundaries` need not be pre-sorted; must be non-empty and every
    /// start must be `< 86_400`.
    pub fn new(mut boundaries: Vec<(u64, Daypart)>) -> Self {
        boundaries.sort_by_key(|(start, _)| *start);
        Self { boundaries }
    }

    /// The conventional four-part partition: morning peak 06:00-09:00,
    /// midday 09:00-16:00, evening peak 16:00-19:00, night otherwise.
    pub fn default_four_part() -> Self {
        Self::new(vec![
            (0, Daypart::Night),
            (6 * 3600, Daypart::MorningPeak),
            (9 * 3600, Daypart::Midday),
            (16 * 3600, Daypart::EveningPeak),
            (19 * 3600, Daypart::Night),
        ])
    }

    pub fn daypart_for(&self, time_of_day_secs: u64) -> Daypart {
        let t = time_of_day_secs % 86_400;
        self.boundaries
            .iter()
            .rev()
            .find(|(start, _)| *start <= t)
            .map(|(_, d)| *d)
            .unwrap_or(self.boundaries[0].1)
    }
}

/// `(direction, stop_index, month, iso_weekday, daypart) -> passengers/sec`.
/// Missing cells return 0, never an error — a stop with no recorded demand
/// simply generates nothing.
#[derive(Debug, Clone, Default)]
pub struct ArrivalRateTable {
    cells: HashMap<(Direction, usize, u32, u32, Daypart), f64>,
}

impl ArrivalRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        direction: Direction,
        stop_index: usize,
        month: u32,
        iso_weekday: u32,
        daypart: Daypart,
        rate_per_sec: f64,
    ) -> &mut Self {
        self.cells
            .insert((direction, stop_index, month, iso_weekday, daypart), rate_per_sec);
        self
    }

    pub fn get(
        &self,
        direction: Direction,
        stop_index: usize,
        month: u32,
        iso_weekday: u32,
        daypart: Daypart,
    ) -> f64 {
        self.cells
            .get(&(direction, stop_index, month, iso_weekday, daypart))
            .copied()
            .unwrap_or(0.0)
    }
}

/// `(direction, month, iso_weekday, daypart) -> categorical distribution
/// over destination stop indices`. Used to sample a passenger's destination
/// given their origin stop's position in the route.
#[derive(Debug, Clone, Default)]
pub struct WeightsTable {
    cells: HashMap<(Direction, u32, u32, Daypart), Vec<f64>>,
}

impl WeightsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        direction: Direction,
        month: u32,
        iso_weekday: u32,
        daypart: Daypart,
        weights: Vec<f64>,
    ) -> &mut Self {
        self.cells.insert((direction, month, iso_weekday, daypart), weights);
        self
    }

    /// Returns the weight vector for this cell, or `None` if undefined.
    pub fn get(
        &self,
        direction: Direction,
        month: u32,
        iso_weekday: u32,
        daypart: Daypart,
    ) -> Option<&[f64]> {
        self.cells
            .get(&(direction, month, iso_weekday, daypart))
            .map(|v| v.as_slice())
    }
}

/// Multiplicative "special event" overrides: a mapping from calendar date
/// to a rate multiplier, applied after the base arrival-rate lookup.
#[derive(Debug, Clone, Default)]
pub struct SpecialEventOverrides {
    multipliers: HashMap<NaiveDate, f64>,
}

impl SpecialEventOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, date: NaiveDate, multiplier: f64) -> &mut Self {
        self.multipliers.insert(date, multiplier);
        self
    }

    pub fn multiplier_for(&self, date: NaiveDate) -> f64 {
        self.multipliers.get(&date).copied().unwrap_or(1.0)
    }
}

/// Bundles the tabulated data the predictor resolves against, plus the
/// configured daypart partition, as a single ECS resource.
#[derive(Debug, Clone, Resource)]
pub struct DemandModel {
    pub arrival_rates: ArrivalRateTable,
    pub weights: WeightsTable,
    pub dayparts: DaypartSchedule,
    pub special_events: SpecialEventOverrides,
}

impl Default for DemandModel {
    fn default() -> Self {
        Self {
            arrival_rates: ArrivalRateTable::new(),
            weights: WeightsTable::new(),
            dayparts: DaypartSchedule::default_four_part(),
            special_events: SpecialEventOverrides::new(),
        }
    }
}

impl DemandModel {
    /// The simulation calendar date at the clock's current time.
    pub fn date_at(&self, clock: &SimulationClock) -> NaiveDate {
        let days_elapsed = (clock.now() / 86_400) as i64;
        clock.epoch() + chrono::Duration::days(days_elapsed)
    }

    fn iso_weekday(date: NaiveDate) -> u32 {
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

    /// Resolve `(stop, t)` to an arrival rate in passengers/sec, following
    /// the predictor contract: resolve (month, weekday) from the
    /// simulation date, map `t` to a daypart, look up, apply the special
    /// event multiplier, return 0 on any missing cell.
    pub fn rate(&self, clock: &SimulationClock, direction: Direction, stop_index: usize) -> f64 {
        let date = self.date_at(clock);
        let daypart = self.dayparts.daypart_for(clock.time_of_day());
        let base = self.arrival_rates.get(
            direction,
            stop_index,
            date.month(),
            Self::iso_weekday(date),
            daypart,
        );
        base * self.special_events.multiplier_for(date)
    }

    /// Destination weight vector for the current `(direction, month,
    /// weekday, daypart)`, or `None` if undefined for this cell.
    pub fn destination_weights(&self, clock: &SimulationClock, direction: Direction) -> Option<&[f64]> {
        let date = self.date_at(clock);
        let daypart = self.dayparts.daypart_for(clock.time_of_day());
        self.weights
            .get(direction, date.month(), Self::iso_weekday(date), daypart)
    }
}
