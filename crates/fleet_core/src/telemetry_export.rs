use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::alerts::{Alert, AlertsState};
use crate::history::TripHistory;

/// One row per recorded point: `vehicle_id, seq, lat, lng`, vehicles in id
/// order.
pub fn write_trip_history_parquet<P: AsRef<Path>>(
    path: P,
    history: &TripHistory,
) -> Result<(), Box<dyn Error>> {
    let mut vehicle_ids = Vec::new();
    let mut seqs = Vec::new();
    let mut lats = Vec::new();
    let mut lngs = Vec::new();

    for (id, track) in history.iter() {
        for (seq, point) in track.iter().enumerate() {
            vehicle_ids.push(id.as_str().to_string());
            seqs.push(seq as u64);
            lats.push(point.lat);
            lngs.push(point.lng);
        }
    }

    let schema = Schema::new(vec![
        Field::new("vehicle_id", DataType::Utf8, false),
        Field::new("seq", DataType::UInt64, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("lng", DataType::Float64, false),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vehicle_ids)),
        Arc::new(UInt64Array::from(seqs)),
        Arc::new(Float64Array::from(lats)),
        Arc::new(Float64Array::from(lngs)),
    ];

    write_record_batch(path, schema, arrays)
}

/// Active alerts followed by the handled log. `handled_at_ms` is null for
/// alerts still active.
pub fn write_alert_log_parquet<P: AsRef<Path>>(
    path: P,
    alerts: &AlertsState,
) -> Result<(), Box<dyn Error>> {
    let rows: Vec<&Alert> = alerts
        .alerts
        .iter()
        .chain(alerts.handled_alerts.iter())
        .collect();

    let mut ids = Vec::with_capacity(rows.len());
    let mut kinds = Vec::with_capacity(rows.len());
    let mut vehicle_ids = Vec::with_capacity(rows.len());
    let mut messages = Vec::with_capacity(rows.len());
    let mut timestamps = Vec::with_capacity(rows.len());
    let mut read = Vec::with_capacity(rows.len());
    let mut acknowledged = Vec::with_capacity(rows.len());
    let mut handled_at = Vec::with_capacity(rows.len());

    for alert in rows {
        ids.push(alert.id.clone());
        kinds.push(alert.kind.as_str());
        vehicle_ids.push(alert.vehicle_id.as_str().to_string());
        messages.push(alert.message.clone());
        timestamps.push(alert.timestamp_ms);
        read.push(alert.read);
        acknowledged.push(alert.acknowledged);
        handled_at.push(alert.handled_at_ms);
    }

    let schema = Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("vehicle_id", DataType::Utf8, false),
        Field::new("message", DataType::Utf8, false),
        Field::new("timestamp_ms", DataType::UInt64, false),
        Field::new("read", DataType::Boolean, false),
        Field::new("acknowledged", DataType::Boolean, false),
        Field::new("handled_at_ms", DataType::UInt64, true),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(kinds)),
        Arc::new(StringArray::from(vehicle_ids)),
        Arc::new(StringArray::from(messages)),
        Arc::new(UInt64Array::from(timestamps)),
        Arc::new(BooleanArray::from(read)),
        Arc::new(BooleanArray::from(acknowledged)),
        Arc::new(UInt64Array::from(handled_at)),
    ];

    write_record_batch(path, schema, arrays)
}

fn write_record_batch<P: AsRef<Path>>(
    path: P,
    schema: Schema,
    arrays: Vec<ArrayRef>,
) -> Result<(), Box<dyn Error>> {
    let schema = Arc::new(schema);
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
