//! CSV and Parquet writers for [`StopVisitRecord`].

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use super::stop_visits::StopVisitRecord;

/// Writes `records` as CSV rows, one per (bus, stop) visit.
pub fn write_csv<W: std::io::Write>(
    records: &[StopVisitRecord],
    writer: W,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("operating_date", DataType::Utf8, false),
        Field::new("weekday", DataType::UInt32, false),
        Field::new("daypart", DataType::Utf8, false),
        Field::new("route_id", DataType::Utf8, false),
        Field::new("direction", DataType::Utf8, false),
        Field::new("trip_id", DataType::UInt64, false),
        Field::new("stop_abbreviation", DataType::Utf8, false),
        Field::new("sequence", DataType::UInt64, false),
        Field::new("scheduled_arrival_secs", DataType::UInt64, true),
        Field::new("actual_arrival_secs", DataType::UInt64, false),
        Field::new("scheduled_departure_secs", DataType::UInt64, true),
        Field::new("actual_departure_secs", DataType::UInt64, false),
        Field::new("dwell_secs", DataType::Float64, false),
        Field::new("boarding", DataType::UInt32, false),
        Field::new("alighting", DataType::UInt32, false),
        Field::new("load", DataType::Int64, false),
        Field::new("wheelchair_count", DataType::Int64, false),
        Field::new("distance_to_next_m", DataType::Float64, false),
        Field::new("distance_remaining_m", DataType::Float64, false),
    ])
}

/// Builds one Arrow `RecordBatch` from `records`, column-by-column.
pub fn to_record_batch(records: &[StopVisitRecord]) -> Result<RecordBatch, arrow::error::ArrowError> {
    let schema = Arc::new(schema());

    let operating_date = StringArray::from_iter_values(records.iter().map(|r| r.operating_date.to_string()));
    let weekday = UInt32Array::from_iter_values(records.iter().map(|r| r.weekday));
    let daypart = StringArray::from_iter_values(records.iter().map(|r| r.daypart.clone()));
    let route_id = StringArray::from_iter_values(records.iter().map(|r| r.route_id.clone()));
    let direction = StringArray::from_iter_values(records.iter().map(|r| r.direction.clone()));
    let trip_id = UInt64Array::from_iter_values(records.iter().map(|r| r.trip_id));
    let stop_abbreviation = StringArray::from_iter_values(records.iter().map(|r| r.stop_abbreviation.clone()));
    let sequence = UInt64Array::from_iter_values(records.iter().map(|r| r.sequence as u64));
    let scheduled_arrival_secs: UInt64Array = records.iter().map(|r| r.scheduled_arrival_secs).collect();
    let actual_arrival_secs = UInt64Array::from_iter_values(records.iter().map(|r| r.actual_arrival_secs));
    let scheduled_departure_secs: UInt64Array = records.iter().map(|r| r.scheduled_departure_secs).collect();
    let actual_departure_secs = UInt64Array::from_iter_values(records.iter().map(|r| r.actual_departure_secs));
    let dwell_secs = Float64Array::from_iter_values(records.iter().map(|r| r.dwell_secs));
    let boarding = UInt32Array::from_iter_values(records.iter().map(|r| r.boarding));
    let alighting = UInt32Array::from_iter_values(records.iter().map(|r| r.alighting));
    let load = Int64Array::from_iter_values(records.iter().map(|r| r.load));
    let wheelchair_count = Int64Array::from_iter_values(records.iter().map(|r| r.wheelchair_count));
    let distance_to_next_m = Float64Array::from_iter_values(records.iter().map(|r| r.distance_to_next_m));
    let distance_remaining_m = Float64Array::from_iter_values(records.iter().map(|r| r.distance_remaining_m));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(operating_date),
            Arc::new(weekday),
            Arc::new(daypart),
            Arc::new(route_id),
            Arc::new(direction),
            Arc::new(trip_id),
            Arc::new(stop_abbreviation),
            Arc::new(sequence),
            Arc::new(scheduled_arrival_secs),
            Arc::new(actual_arrival_secs),
            Arc::new(scheduled_departure_secs),
            Arc::new(actual_departure_secs),
            Arc::new(dwell_secs),
            Arc::new(boarding),
            Arc::new(alighting),
            Arc::new(load),
            Arc::new(wheelchair_count),
            Arc::new(distance_to_next_m),
            Arc::new(distance_remaining_m),
        ],
    )
}

/// Writes `records` to a Parquet file at `path`.
pub fn write_parquet(
    records: &[StopVisitRecord],
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = to_record_batch(records)?;
    let file = std::fs::File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
