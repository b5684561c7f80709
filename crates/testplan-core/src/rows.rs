//! Flat row records for presentation
//!
//! Renderers consume derived data as plain tables: an ordered list of rows,
//! each an ordered mapping from field name to value. Nothing here derives
//! anything; rows are a projection of a [`Schedule`] or an overlap list.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{AlertFlag, Overlap, Schedule, ScheduledTest};

/// Field names of a schedule row, in column order
pub const SCHEDULE_FIELDS: [&str; 12] = [
    "vehicle",
    "test",
    "responsible",
    "start",
    "end",
    "duration_days",
    "week",
    "sopm",
    "lrm",
    "sopm_alert",
    "lrm_alert",
    "end_alert",
];

/// Field names of an overlap row, in column order
pub const OVERLAP_FIELDS: [&str; 8] = [
    "vehicle",
    "test_a",
    "start_a",
    "end_a",
    "test_b",
    "start_b",
    "end_b",
    "shared_days",
];

/// A single cell value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Date(NaiveDate),
    Flag(bool),
    Empty,
}

impl CellValue {
    fn from_date(date: Option<NaiveDate>) -> Self {
        date.map_or(CellValue::Empty, CellValue::Date)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(n) => write!(f, "{n}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Flag(true) => f.write_str("yes"),
            CellValue::Flag(false) | CellValue::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Int(n) => serializer.serialize_i64(*n),
            CellValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            CellValue::Flag(b) => serializer.serialize_bool(*b),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

/// An ordered mapping from field name to value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(&'static str, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (builder pattern)
    pub fn with(mut self, name: &'static str, value: CellValue) -> Self {
        self.fields.push((name, value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CellValue)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl ScheduledTest {
    /// Project this test onto a schedule row
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("vehicle", CellValue::Text(self.vehicle_id.clone()))
            .with("test", CellValue::Text(self.test_name.clone()))
            .with("responsible", CellValue::Text(self.responsible.clone()))
            .with("start", CellValue::Date(self.start))
            .with("end", CellValue::Date(self.end))
            .with("duration_days", CellValue::Int(self.duration_days))
            .with("week", CellValue::Int(i64::from(self.week)))
            .with("sopm", CellValue::from_date(self.sopm))
            .with("lrm", CellValue::from_date(self.lrm))
            .with("sopm_alert", CellValue::Flag(self.has_alert(AlertFlag::SopmImminent)))
            .with("lrm_alert", CellValue::Flag(self.has_alert(AlertFlag::LrmImminent)))
            .with("end_alert", CellValue::Flag(self.has_alert(AlertFlag::EndImminent)))
    }
}

impl Overlap {
    /// Project this overlap onto an overlap row
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("vehicle", CellValue::Text(self.vehicle_id.clone()))
            .with("test_a", CellValue::Text(self.test_a.clone()))
            .with("start_a", CellValue::Date(self.range_a.start))
            .with("end_a", CellValue::Date(self.range_a.end))
            .with("test_b", CellValue::Text(self.test_b.clone()))
            .with("start_b", CellValue::Date(self.range_b.start))
            .with("end_b", CellValue::Date(self.range_b.end))
            .with("shared_days", CellValue::Int(self.shared_days))
    }
}

/// Schedule rows in derivation order
pub fn schedule_rows(schedule: &Schedule) -> Vec<Row> {
    schedule.tests.iter().map(ScheduledTest::to_row).collect()
}

/// Overlap rows in discovery order
pub fn overlap_rows(overlaps: &[Overlap]) -> Vec<Row> {
    overlaps.iter().map(Overlap::to_row).collect()
}
