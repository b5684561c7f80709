//! # testplan-core
//!
//! Core domain model and traits for the testplan vehicle test scheduler.
//!
//! This crate provides:
//! - Input types: `TestPlan`, `Vehicle`, `Test`
//! - Derived types: `Schedule`, `ScheduledTest`, `Overlap`, `PlanView`
//! - Flat row records for presentation (`rows`)
//! - Explicit plan edits (`edit`) and derivation configuration (`config`)
//! - Core traits: `Scheduler`, `Renderer`
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use testplan_core::{Test, TestPlan, Vehicle};
//!
//! let sopm = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let mut plan = TestPlan::new("Prototype Fleet");
//! plan.vehicles.push(
//!     Vehicle::new("V001")
//!         .sopm(sopm)
//!         .test(Test::new("Brakes", 3).responsible("Chassis team"))
//!         .test(Test::new("Climate", 2)),
//! );
//! assert_eq!(plan.test_count(), 2);
//! ```

pub mod config;
pub mod edit;
pub mod rows;

pub use config::{AlertThresholds, DerivationConfig, ModeSelection, PlanLimits};
pub use edit::PlanEdit;
pub use rows::{overlap_rows, schedule_rows, CellValue, Row};

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Identifier of a vehicle, unique within a plan
pub type VehicleId = String;

/// Name of a test, unique within its vehicle
pub type TestName = String;

// ============================================================================
// Date Ranges
// ============================================================================

/// Inclusive range of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, returning `None` when `end` precedes `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    /// Range covering `days` whole days starting at `start`.
    ///
    /// Returns `None` for `days < 1` or when the end leaves chrono's range.
    pub fn from_duration(start: NaiveDate, days: i64) -> Option<Self> {
        let span = u64::try_from(days.checked_sub(1)?).ok()?;
        let end = start.checked_add_days(Days::new(span))?;
        Some(Self { start, end })
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Closed-interval intersection test: sharing a single day counts
    pub fn intersects(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of days both ranges cover (0 when disjoint)
    pub fn shared_days(&self, other: &DateRange) -> i64 {
        if !self.intersects(other) {
            return 0;
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).num_days() + 1
    }

    /// First day after the range
    pub fn next_day(&self) -> Option<NaiveDate> {
        self.end.succ_opt()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

// ============================================================================
// Test Plan
// ============================================================================

/// A complete test plan: the unit of persistence, keyed by project name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    /// Project name
    pub name: String,
    /// Vehicles in display order
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

impl TestPlan {
    /// Create an empty plan with the given project name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vehicles: Vec::new(),
        }
    }

    /// Add a vehicle (builder pattern)
    pub fn vehicle(mut self, vehicle: Vehicle) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn get_vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn get_vehicle_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    /// Total number of tests across all vehicles
    pub fn test_count(&self) -> usize {
        self.vehicles.iter().map(|v| v.tests.len()).sum()
    }

    /// Structural checks that hold for any stored plan: non-empty and
    /// unique vehicle ids, non-empty test names unique within their vehicle.
    pub fn check_structure(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::with_capacity(self.vehicles.len());
        for vehicle in &self.vehicles {
            if vehicle.id.trim().is_empty() {
                return Err(PlanError::EmptyVehicleId);
            }
            if !seen.insert(vehicle.id.as_str()) {
                return Err(PlanError::DuplicateVehicle(vehicle.id.clone()));
            }

            let mut names = HashSet::with_capacity(vehicle.tests.len());
            for test in &vehicle.tests {
                if test.name.trim().is_empty() {
                    return Err(PlanError::EmptyTestName(vehicle.id.clone()));
                }
                if !names.insert(test.name.as_str()) {
                    return Err(PlanError::DuplicateTest {
                        vehicle: vehicle.id.clone(),
                        test: test.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Vehicle
// ============================================================================

/// A vehicle under test. Attributes only, no behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Identifier, unique within a plan
    pub id: VehicleId,
    /// Start-of-production milestone (required for sequential scheduling)
    #[serde(default)]
    pub sopm: Option<NaiveDate>,
    /// Last-revision milestone
    #[serde(default)]
    pub lrm: Option<NaiveDate>,
    /// Vehicle identification number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    /// Chassis code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
    /// Tests in execution order
    #[serde(default)]
    pub tests: Vec<Test>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sopm: None,
            lrm: None,
            vin: None,
            chassis: None,
            tests: Vec::new(),
        }
    }

    /// Set the start-of-production milestone
    pub fn sopm(mut self, date: NaiveDate) -> Self {
        self.sopm = Some(date);
        self
    }

    /// Set the last-revision milestone
    pub fn lrm(mut self, date: NaiveDate) -> Self {
        self.lrm = Some(date);
        self
    }

    pub fn vin(mut self, vin: impl Into<String>) -> Self {
        self.vin = Some(vin.into());
        self
    }

    pub fn chassis(mut self, chassis: impl Into<String>) -> Self {
        self.chassis = Some(chassis.into());
        self
    }

    /// Append a test (builder pattern)
    pub fn test(mut self, test: Test) -> Self {
        self.tests.push(test);
        self
    }

    pub fn get_test(&self, name: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.name == name)
    }

    pub fn get_test_mut(&mut self, name: &str) -> Option<&mut Test> {
        self.tests.iter_mut().find(|t| t.name == name)
    }

    /// Number of tests carrying an explicit start date
    pub fn explicit_test_count(&self) -> usize {
        self.tests.iter().filter(|t| t.start.is_some()).count()
    }
}

// ============================================================================
// Test
// ============================================================================

/// A test to run on one vehicle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    /// Test name, unique within its vehicle
    pub name: TestName,
    /// Responsible party
    #[serde(default)]
    pub responsible: String,
    /// Duration in whole days (must be at least 1)
    pub duration_days: i64,
    /// Explicit start date; `None` means "right after the previous test"
    #[serde(default)]
    pub start: Option<NaiveDate>,
}

impl Test {
    pub fn new(name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            name: name.into(),
            responsible: String::new(),
            duration_days,
            start: None,
        }
    }

    /// Set the responsible party
    pub fn responsible(mut self, responsible: impl Into<String>) -> Self {
        self.responsible = responsible.into();
        self
    }

    /// Pin the test to an explicit start date
    pub fn starting(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }
}

// ============================================================================
// Derived Schedule
// ============================================================================

/// How a vehicle's tests were placed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Back-to-back from the vehicle's SOPM
    Sequential,
    /// Each test at its own explicit start date
    Explicit,
}

impl std::fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingMode::Sequential => write!(f, "sequential"),
            SchedulingMode::Explicit => write!(f, "explicit"),
        }
    }
}

/// Due-soon alert attached to a scheduled test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertFlag {
    /// The vehicle's SOPM is within the alert window
    SopmImminent,
    /// The vehicle's LRM is within the alert window
    LrmImminent,
    /// The test ends within the alert window
    EndImminent,
}

impl AlertFlag {
    /// Short label used in tables and exports
    pub fn label(self) -> &'static str {
        match self {
            AlertFlag::SopmImminent => "SOPM",
            AlertFlag::LrmImminent => "LRM",
            AlertFlag::EndImminent => "END",
        }
    }
}

impl std::fmt::Display for AlertFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A test with its computed date range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTest {
    pub vehicle_id: VehicleId,
    pub test_name: TestName,
    pub responsible: String,
    pub duration_days: i64,
    /// First day of the test
    pub start: NaiveDate,
    /// Last day of the test (inclusive)
    pub end: NaiveDate,
    /// ISO week number of `start`
    pub week: u32,
    /// Vehicle milestones, carried for display
    pub sopm: Option<NaiveDate>,
    pub lrm: Option<NaiveDate>,
    /// How the range was derived
    pub mode: SchedulingMode,
    /// Alerts in fixed order: SOPM, LRM, END
    pub alerts: Vec<AlertFlag>,
}

impl ScheduledTest {
    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn has_alert(&self, flag: AlertFlag) -> bool {
        self.alerts.contains(&flag)
    }

    /// ISO week of an arbitrary date, as used for `week`
    pub fn iso_week(date: NaiveDate) -> u32 {
        date.iso_week().week()
    }
}

/// The result of one derivation pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Project the schedule was derived from
    pub project: String,
    /// Reference date the alerts were computed against
    pub today: NaiveDate,
    /// Scheduled tests in vehicle order, then test order
    pub tests: Vec<ScheduledTest>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Vehicle ids in first-seen order
    pub fn vehicles(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for test in &self.tests {
            if !ids.contains(&test.vehicle_id.as_str()) {
                ids.push(&test.vehicle_id);
            }
        }
        ids
    }

    /// Scheduled tests of one vehicle, in derivation order
    pub fn for_vehicle<'a>(
        &'a self,
        vehicle_id: &'a str,
    ) -> impl Iterator<Item = &'a ScheduledTest> {
        self.tests.iter().filter(move |t| t.vehicle_id == vehicle_id)
    }

    pub fn get(&self, vehicle_id: &str, test_name: &str) -> Option<&ScheduledTest> {
        self.tests
            .iter()
            .find(|t| t.vehicle_id == vehicle_id && t.test_name == test_name)
    }

    /// Earliest start to latest end over all tests
    pub fn span(&self) -> Option<DateRange> {
        let start = self.tests.iter().map(|t| t.start).min()?;
        let end = self.tests.iter().map(|t| t.end).max()?;
        Some(DateRange { start, end })
    }

    /// Number of tests carrying at least one alert
    pub fn alert_count(&self) -> usize {
        self.tests.iter().filter(|t| !t.alerts.is_empty()).count()
    }
}

/// Two tests on the same vehicle whose inclusive ranges intersect
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlap {
    pub vehicle_id: VehicleId,
    pub test_a: TestName,
    pub range_a: DateRange,
    pub test_b: TestName,
    pub range_b: DateRange,
    /// Days both tests occupy
    pub shared_days: i64,
}

impl Overlap {
    /// Whether the named test is one side of this overlap
    pub fn involves(&self, vehicle_id: &str, test_name: &str) -> bool {
        self.vehicle_id == vehicle_id && (self.test_a == test_name || self.test_b == test_name)
    }
}

/// A derived schedule together with its overlaps
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanView {
    pub schedule: Schedule,
    pub overlaps: Vec<Overlap>,
}

impl PlanView {
    pub fn is_overlapping(&self, vehicle_id: &str, test_name: &str) -> bool {
        self.overlaps.iter().any(|o| o.involves(vehicle_id, test_name))
    }

    pub fn schedule_rows(&self) -> Vec<Row> {
        schedule_rows(&self.schedule)
    }

    pub fn overlap_rows(&self) -> Vec<Row> {
        overlap_rows(&self.overlaps)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Derives a schedule from a plan
pub trait Scheduler {
    /// Place every test of the plan, computing alerts against `today`
    fn schedule(&self, plan: &TestPlan, today: NaiveDate) -> Result<Schedule, PlanError>;
}

/// Renders a derived view to some output format
pub trait Renderer {
    type Output;

    fn render(&self, view: &PlanView) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Input validation error; derivation does not proceed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Test '{test}' on vehicle '{vehicle}' has invalid duration {days} (must be at least 1 day)")]
    InvalidDuration {
        vehicle: VehicleId,
        test: TestName,
        days: i64,
    },

    #[error("Vehicle '{0}' has no SOPM date, required for sequential scheduling")]
    MissingSopm(VehicleId),

    #[error("Test '{test}' on vehicle '{vehicle}' has no start date, required for explicit scheduling")]
    MissingStart { vehicle: VehicleId, test: TestName },

    #[error("Vehicle '{0}' mixes explicit and sequential start dates")]
    MixedModes(VehicleId),

    #[error("Duplicate vehicle id: {0}")]
    DuplicateVehicle(VehicleId),

    #[error("Duplicate test '{test}' on vehicle '{vehicle}'")]
    DuplicateTest { vehicle: VehicleId, test: TestName },

    #[error("Vehicle id must not be empty")]
    EmptyVehicleId,

    #[error("Test name must not be empty (vehicle '{0}')")]
    EmptyTestName(VehicleId),

    #[error("Vehicle not found: {0}")]
    UnknownVehicle(VehicleId),

    #[error("Test '{test}' not found on vehicle '{vehicle}'")]
    UnknownTest { vehicle: VehicleId, test: TestName },

    #[error("Position {position} out of range for vehicle '{vehicle}' ({len} tests)")]
    InvalidPosition {
        vehicle: VehicleId,
        position: usize,
        len: usize,
    },

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Date out of range for test '{test}' on vehicle '{vehicle}'")]
    DateOverflow { vehicle: VehicleId, test: TestName },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
