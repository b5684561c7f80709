//! Schedule derivation
//!
//! Places every test of a plan on the calendar.
//!
//! # Algorithm
//!
//! 1. Validate the whole plan (structure, durations, per-vehicle mode,
//!    required dates). Nothing is derived if any check fails.
//! 2. For each vehicle, in plan order:
//!    - sequential: a cursor starts at SOPM; each test takes
//!      `[cursor, cursor + duration - 1]` and the cursor moves to the day
//!      after its end;
//!    - explicit: each test takes `[start, start + duration - 1]`.
//! 3. Attach the ISO week of the start and the alerts for `today`.

use chrono::{Local, NaiveDate};
use testplan_core::{
    DateRange, DerivationConfig, ModeSelection, PlanError, Schedule, ScheduledTest, Scheduler,
    SchedulingMode, TestPlan, Vehicle,
};
use tracing::{debug, warn};

use crate::alerts::alerts_for;

/// Derives schedules from plans under a fixed configuration
#[derive(Clone, Debug, Default)]
pub struct ScheduleDeriver {
    config: DerivationConfig,
}

impl ScheduleDeriver {
    pub fn new(config: DerivationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DerivationConfig {
        &self.config
    }

    /// Check everything derivation needs, without deriving
    pub fn validate(&self, plan: &TestPlan) -> Result<(), PlanError> {
        self.vehicle_modes(plan).map(|_| ())
    }

    /// Validate the plan and settle each vehicle's mode, in plan order
    fn vehicle_modes(&self, plan: &TestPlan) -> Result<Vec<SchedulingMode>, PlanError> {
        plan.check_structure()?;
        let mut modes = Vec::with_capacity(plan.vehicles.len());
        for vehicle in &plan.vehicles {
            for test in &vehicle.tests {
                if test.duration_days < 1 {
                    return Err(PlanError::InvalidDuration {
                        vehicle: vehicle.id.clone(),
                        test: test.name.clone(),
                        days: test.duration_days,
                    });
                }
            }
            let mode = select_mode(vehicle, self.config.mode)?;
            if mode == SchedulingMode::Sequential
                && vehicle.sopm.is_none()
                && !vehicle.tests.is_empty()
            {
                return Err(PlanError::MissingSopm(vehicle.id.clone()));
            }
            modes.push(mode);
        }
        Ok(modes)
    }

    /// Derive the schedule, computing alerts against `today`
    pub fn derive(&self, plan: &TestPlan, today: NaiveDate) -> Result<Schedule, PlanError> {
        let modes = self.vehicle_modes(plan)?;

        let mut tests = Vec::with_capacity(plan.test_count());
        for (vehicle, mode) in plan.vehicles.iter().zip(modes) {
            let ranges = match mode {
                SchedulingMode::Sequential => place_sequential(vehicle)?,
                SchedulingMode::Explicit => place_explicit(vehicle)?,
            };
            debug!(
                vehicle = %vehicle.id,
                %mode,
                tests = ranges.len(),
                "derived vehicle schedule"
            );

            for (test, range) in vehicle.tests.iter().zip(ranges) {
                tests.push(ScheduledTest {
                    vehicle_id: vehicle.id.clone(),
                    test_name: test.name.clone(),
                    responsible: test.responsible.clone(),
                    duration_days: test.duration_days,
                    start: range.start,
                    end: range.end,
                    week: ScheduledTest::iso_week(range.start),
                    sopm: vehicle.sopm,
                    lrm: vehicle.lrm,
                    mode,
                    alerts: alerts_for(vehicle, range.end, today, &self.config.alerts),
                });
            }
        }

        Ok(Schedule {
            project: plan.name.clone(),
            today,
            tests,
        })
    }

    /// Derive against the local calendar date, read fresh on every call
    pub fn derive_now(&self, plan: &TestPlan) -> Result<Schedule, PlanError> {
        self.derive(plan, Local::now().date_naive())
    }
}

impl Scheduler for ScheduleDeriver {
    fn schedule(&self, plan: &TestPlan, today: NaiveDate) -> Result<Schedule, PlanError> {
        self.derive(plan, today)
    }
}

/// Decide how a vehicle's tests are placed
pub fn select_mode(
    vehicle: &Vehicle,
    selection: ModeSelection,
) -> Result<SchedulingMode, PlanError> {
    match selection {
        ModeSelection::Sequential => {
            if vehicle.explicit_test_count() > 0 {
                warn!(
                    vehicle = %vehicle.id,
                    "ignoring explicit start dates in sequential mode"
                );
            }
            Ok(SchedulingMode::Sequential)
        }
        ModeSelection::Explicit => {
            if let Some(test) = vehicle.tests.iter().find(|t| t.start.is_none()) {
                return Err(PlanError::MissingStart {
                    vehicle: vehicle.id.clone(),
                    test: test.name.clone(),
                });
            }
            Ok(SchedulingMode::Explicit)
        }
        ModeSelection::Auto => {
            let explicit = vehicle.explicit_test_count();
            if explicit == 0 {
                Ok(SchedulingMode::Sequential)
            } else if explicit == vehicle.tests.len() {
                Ok(SchedulingMode::Explicit)
            } else {
                Err(PlanError::MixedModes(vehicle.id.clone()))
            }
        }
    }
}

fn overflow(vehicle: &Vehicle, test: &str) -> PlanError {
    PlanError::DateOverflow {
        vehicle: vehicle.id.clone(),
        test: test.to_string(),
    }
}

fn place_sequential(vehicle: &Vehicle) -> Result<Vec<DateRange>, PlanError> {
    if vehicle.tests.is_empty() {
        return Ok(Vec::new());
    }
    let mut cursor = vehicle
        .sopm
        .ok_or_else(|| PlanError::MissingSopm(vehicle.id.clone()))?;

    let mut ranges = Vec::with_capacity(vehicle.tests.len());
    for (idx, test) in vehicle.tests.iter().enumerate() {
        let range = DateRange::from_duration(cursor, test.duration_days)
            .ok_or_else(|| overflow(vehicle, &test.name))?;
        // The cursor only matters if another test follows
        if idx + 1 < vehicle.tests.len() {
            cursor = range.next_day().ok_or_else(|| overflow(vehicle, &test.name))?;
        }
        ranges.push(range);
    }
    Ok(ranges)
}

fn place_explicit(vehicle: &Vehicle) -> Result<Vec<DateRange>, PlanError> {
    vehicle
        .tests
        .iter()
        .map(|test| {
            let start = test.start.ok_or_else(|| PlanError::MissingStart {
                vehicle: vehicle.id.clone(),
                test: test.name.clone(),
            })?;
            DateRange::from_duration(start, test.duration_days)
                .ok_or_else(|| overflow(vehicle, &test.name))
        })
        .collect()
}
