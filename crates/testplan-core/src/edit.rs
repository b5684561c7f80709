//! Plan edits
//!
//! Every mutation of a [`TestPlan`] goes through [`TestPlan::apply`]. Callers
//! apply an edit to the in-memory plan, persist it, and derive a fresh view;
//! derived data is never patched in place.

use chrono::NaiveDate;

use crate::{PlanError, Test, TestPlan, Vehicle};

/// A single mutation of a test plan
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanEdit {
    /// Append a vehicle
    AddVehicle(Vehicle),
    /// Remove a vehicle and its tests
    RemoveVehicle { vehicle: String },
    /// Replace a vehicle's milestones
    SetMilestones {
        vehicle: String,
        sopm: Option<NaiveDate>,
        lrm: Option<NaiveDate>,
    },
    /// Append a test to one vehicle
    AddTest { vehicle: String, test: Test },
    /// Append the same test to every vehicle
    AddTestToAll(Test),
    /// Remove a test from a vehicle
    RemoveTest { vehicle: String, test: String },
    /// Change a test's duration
    SetDuration {
        vehicle: String,
        test: String,
        days: i64,
    },
    /// Pin a test to a date, or clear the date with `None`
    SetStart {
        vehicle: String,
        test: String,
        start: Option<NaiveDate>,
    },
    /// Move a test to a new zero-based position within its vehicle
    MoveTest {
        vehicle: String,
        test: String,
        position: usize,
    },
}

impl TestPlan {
    /// Apply an edit in place.
    ///
    /// The plan is left untouched when the edit is rejected.
    pub fn apply(&mut self, edit: PlanEdit) -> Result<(), PlanError> {
        match edit {
            PlanEdit::AddVehicle(vehicle) => {
                if vehicle.id.trim().is_empty() {
                    return Err(PlanError::EmptyVehicleId);
                }
                if self.get_vehicle(&vehicle.id).is_some() {
                    return Err(PlanError::DuplicateVehicle(vehicle.id));
                }
                for test in &vehicle.tests {
                    check_new_test(&vehicle.id, test)?;
                }
                self.vehicles.push(vehicle);
            }
            PlanEdit::RemoveVehicle { vehicle } => {
                let idx = self.vehicle_index(&vehicle)?;
                self.vehicles.remove(idx);
            }
            PlanEdit::SetMilestones { vehicle, sopm, lrm } => {
                let target = self.vehicle_mut(&vehicle)?;
                target.sopm = sopm;
                target.lrm = lrm;
            }
            PlanEdit::AddTest { vehicle, test } => {
                let target = self.vehicle_mut(&vehicle)?;
                check_new_test(&target.id, &test)?;
                if target.get_test(&test.name).is_some() {
                    return Err(PlanError::DuplicateTest {
                        vehicle,
                        test: test.name,
                    });
                }
                target.tests.push(test);
            }
            PlanEdit::AddTestToAll(test) => {
                for vehicle in &self.vehicles {
                    check_new_test(&vehicle.id, &test)?;
                    if vehicle.get_test(&test.name).is_some() {
                        return Err(PlanError::DuplicateTest {
                            vehicle: vehicle.id.clone(),
                            test: test.name,
                        });
                    }
                }
                for vehicle in &mut self.vehicles {
                    vehicle.tests.push(test.clone());
                }
            }
            PlanEdit::RemoveTest { vehicle, test } => {
                let target = self.vehicle_mut(&vehicle)?;
                let idx = test_index(target, &test)?;
                target.tests.remove(idx);
            }
            PlanEdit::SetDuration {
                vehicle,
                test,
                days,
            } => {
                if days < 1 {
                    return Err(PlanError::InvalidDuration { vehicle, test, days });
                }
                let target = self.vehicle_mut(&vehicle)?;
                let idx = test_index(target, &test)?;
                target.tests[idx].duration_days = days;
            }
            PlanEdit::SetStart {
                vehicle,
                test,
                start,
            } => {
                let target = self.vehicle_mut(&vehicle)?;
                let idx = test_index(target, &test)?;
                target.tests[idx].start = start;
            }
            PlanEdit::MoveTest {
                vehicle,
                test,
                position,
            } => {
                let target = self.vehicle_mut(&vehicle)?;
                let idx = test_index(target, &test)?;
                let len = target.tests.len();
                if position >= len {
                    return Err(PlanError::InvalidPosition {
                        vehicle,
                        position,
                        len,
                    });
                }
                let moved = target.tests.remove(idx);
                target.tests.insert(position, moved);
            }
        }
        Ok(())
    }

    fn vehicle_index(&self, id: &str) -> Result<usize, PlanError> {
        self.vehicles
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| PlanError::UnknownVehicle(id.to_string()))
    }

    fn vehicle_mut(&mut self, id: &str) -> Result<&mut Vehicle, PlanError> {
        let idx = self.vehicle_index(id)?;
        Ok(&mut self.vehicles[idx])
    }
}

fn test_index(vehicle: &Vehicle, name: &str) -> Result<usize, PlanError> {
    vehicle
        .tests
        .iter()
        .position(|t| t.name == name)
        .ok_or_else(|| PlanError::UnknownTest {
            vehicle: vehicle.id.clone(),
            test: name.to_string(),
        })
}

fn check_new_test(vehicle: &str, test: &Test) -> Result<(), PlanError> {
    if test.name.trim().is_empty() {
        return Err(PlanError::EmptyTestName(vehicle.to_string()));
    }
    if test.duration_days < 1 {
        return Err(PlanError::InvalidDuration {
            vehicle: vehicle.to_string(),
            test: test.name.clone(),
            days: test.duration_days,
        });
    }
    Ok(())
}
