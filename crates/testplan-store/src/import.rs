//! Import from the flat CSV layout
//!
//! One row per vehicle and test:
//!
//! ```text
//! vehicle_id,sopm,lrm,vin,chassis,test,responsible,duration_days,start
//! V001,2025-01-01,2025-06-01,VF1X,CH-1,Brakes,Lab A,3,
//! V001,,,,,Noise,Lab B,2,
//! V002,2025-02-01,,,,,,,
//! ```
//!
//! Rows are grouped by `vehicle_id` in first-seen order. Vehicle columns may
//! be repeated or left empty on later rows but must not contradict the first
//! value given. A row with an empty `test` column declares the vehicle only.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use testplan_core::{Test, TestPlan, Vehicle};
use tracing::info;

use crate::{check_plan, parse_date, StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct FlatRecord {
    vehicle_id: String,
    #[serde(default)]
    sopm: String,
    #[serde(default)]
    lrm: String,
    #[serde(default)]
    vin: String,
    #[serde(default)]
    chassis: String,
    #[serde(default)]
    test: String,
    #[serde(default)]
    responsible: String,
    #[serde(default)]
    duration_days: String,
    #[serde(default)]
    start: String,
}

/// Read a flat CSV file into a plan named `project`
pub fn import_flat_csv<P: AsRef<Path>>(path: P, project: &str) -> StoreResult<TestPlan> {
    let path = path.as_ref();
    let plan = read_flat_csv(File::open(path)?, project)?;
    info!(
        project,
        path = %path.display(),
        vehicles = plan.vehicles.len(),
        tests = plan.test_count(),
        "imported flat CSV"
    );
    Ok(plan)
}

/// Read flat CSV data from any reader
pub fn read_flat_csv<R: Read>(reader: R, project: &str) -> StoreResult<TestPlan> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut plan = TestPlan::new(project);
    for (idx, record) in csv_reader.deserialize::<FlatRecord>().enumerate() {
        // Header is line 1
        let line = idx + 2;
        let record = record?;
        apply_record(&mut plan, record).map_err(|err| match err {
            StoreError::InvalidData(msg) => StoreError::InvalidData(format!("line {line}: {msg}")),
            other => other,
        })?;
    }

    if plan.vehicles.is_empty() {
        return Err(StoreError::InvalidData("CSV file contained no vehicles".into()));
    }
    check_plan(&plan)?;
    Ok(plan)
}

fn apply_record(plan: &mut TestPlan, record: FlatRecord) -> StoreResult<()> {
    if record.vehicle_id.is_empty() {
        return Err(StoreError::InvalidData("empty vehicle_id".into()));
    }

    let sopm = parse_date(&record.sopm)?;
    let lrm = parse_date(&record.lrm)?;
    if plan.get_vehicle(&record.vehicle_id).is_none() {
        plan.vehicles.push(Vehicle::new(record.vehicle_id.as_str()));
    }
    let Some(vehicle) = plan.get_vehicle_mut(&record.vehicle_id) else {
        return Err(StoreError::InvalidData(format!(
            "vehicle '{}' vanished during import",
            record.vehicle_id
        )));
    };

    merge_date(&mut vehicle.sopm, sopm, &vehicle.id, "sopm")?;
    merge_date(&mut vehicle.lrm, lrm, &vehicle.id, "lrm")?;
    merge_text(&mut vehicle.vin, record.vin, &vehicle.id, "vin")?;
    merge_text(&mut vehicle.chassis, record.chassis, &vehicle.id, "chassis")?;

    if record.test.is_empty() {
        return Ok(());
    }
    if vehicle.get_test(&record.test).is_some() {
        return Err(StoreError::InvalidData(format!(
            "duplicate test '{}' on vehicle '{}'",
            record.test, vehicle.id
        )));
    }
    let duration_days: i64 = record.duration_days.parse().map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid duration '{}' for test '{}'",
            record.duration_days, record.test
        ))
    })?;
    if duration_days < 1 {
        return Err(StoreError::InvalidData(format!(
            "test '{}' has duration {duration_days} (must be at least 1 day)",
            record.test
        )));
    }

    let mut test = Test::new(record.test, duration_days).responsible(record.responsible);
    test.start = parse_date(&record.start)?;
    vehicle.tests.push(test);
    Ok(())
}

fn merge_date(
    slot: &mut Option<NaiveDate>,
    value: Option<NaiveDate>,
    vehicle: &str,
    column: &str,
) -> StoreResult<()> {
    match (*slot, value) {
        (_, None) => Ok(()),
        (None, Some(date)) => {
            *slot = Some(date);
            Ok(())
        }
        (Some(existing), Some(date)) if existing == date => Ok(()),
        (Some(existing), Some(date)) => Err(StoreError::InvalidData(format!(
            "conflicting {column} for vehicle '{vehicle}': {existing} vs {date}"
        ))),
    }
}

fn merge_text(slot: &mut Option<String>, value: String, vehicle: &str, column: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    match slot {
        None => {
            *slot = Some(value);
            Ok(())
        }
        Some(existing) if *existing == value => Ok(()),
        Some(existing) => Err(StoreError::InvalidData(format!(
            "conflicting {column} for vehicle '{vehicle}': {existing} vs {value}"
        ))),
    }
}
