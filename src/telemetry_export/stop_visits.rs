//! The per-(bus, stop) visit record (§6.2): the output contract the ETL
//! consumer relies on.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StopVisitRecord {
    pub operating_date: NaiveDate,
    /// ISO weekday, 1 (Monday) through 7 (Sunday).
    pub weekday: u32,
    pub daypart: String,
    pub route_id: String,
    pub direction: String,
    pub trip_id: u64,
    pub stop_abbreviation: String,
    pub sequence: usize,
    pub scheduled_arrival_secs: Option<u64>,
    pub actual_arrival_secs: u64,
    pub scheduled_departure_secs: Option<u64>,
    pub actual_departure_secs: u64,
    pub dwell_secs: f64,
    pub boarding: u32,
    pub alighting: u32,
    pub load: i64,
    pub wheelchair_count: i64,
    pub distance_to_next_m: f64,
    pub distance_remaining_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_as_csv_row() {
        let record = StopVisitRecord {
            operating_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            weekday: 4,
            daypart: "MorningPeak".to_string(),
            route_id: "R1".to_string(),
            direction: "Outbound".to_string(),
            trip_id: 1,
            stop_abbreviation: "MAIN".to_string(),
            sequence: 0,
            scheduled_arrival_secs: None,
            actual_arrival_secs: 0,
            scheduled_departure_secs: None,
            actual_departure_secs: 7,
            dwell_secs: 7.0,
            boarding: 3,
            alighting: 0,
            load: 3,
            wheelchair_count: 0,
            distance_to_next_m: 400.0,
            distance_remaining_m: 1200.0,
        };
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&record).unwrap();
        let csv_bytes = writer.into_inner().unwrap();
        let csv_text = String::from_utf8(csv_bytes).unwrap();
        assert!(csv_text.contains("R1"));
        assert!(csv_text.contains("MAIN"));
    }
}
