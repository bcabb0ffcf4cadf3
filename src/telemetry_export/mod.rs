//! Persisted-record export (§6.2): a pure, testable record type plus
//! CSV/Parquet writers. Batch persistence/storage orchestration beyond
//! "write these rows out" is out of scope.

pub mod stop_visits;
pub mod utils;

use bevy_ecs::prelude::Resource;

pub use stop_visits::StopVisitRecord;
pub use utils::{to_record_batch, write_csv, write_parquet};

/// Accumulates one [`StopVisitRecord`] per (bus, stop) visit over the life
/// of a run, ready to hand to [`write_csv`]/[`write_parquet`] afterward.
#[derive(Debug, Default, Resource)]
pub struct StopVisitLog(pub Vec<StopVisitRecord>);

impl StopVisitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StopVisitRecord) {
        self.0.push(record);
    }

    pub fn records(&self) -> &[StopVisitRecord] {
        &self.0
    }
}
