//! Derivation configuration
//!
//! Everything a derivation pass depends on besides the plan itself and the
//! reference date travels in a [`DerivationConfig`]. There is no
//! process-wide state: callers build one (from defaults or a config file)
//! and hand it to the solver.

use serde::{Deserialize, Serialize};

use crate::{PlanError, TestPlan};

/// How scheduling modes are chosen for each vehicle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSelection {
    /// Per vehicle: all tests dated is explicit, none dated is sequential,
    /// a mix is rejected
    #[default]
    Auto,
    /// Sequence every vehicle from its SOPM, ignoring explicit dates
    Sequential,
    /// Require an explicit date on every test
    Explicit,
}

impl std::str::FromStr for ModeSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ModeSelection::Auto),
            "sequential" => Ok(ModeSelection::Sequential),
            "explicit" => Ok(ModeSelection::Explicit),
            other => Err(format!(
                "unknown scheduling mode '{other}' (expected auto, sequential or explicit)"
            )),
        }
    }
}

/// Alert windows, in days before the reference date.
///
/// A flag is raised when `(date - today) <= window`, so dates already in the
/// past are flagged too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Window for the vehicle's SOPM
    pub sopm_days: i64,
    /// Window for the vehicle's LRM
    pub lrm_days: i64,
    /// Window for a test's end date
    pub test_end_days: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            sopm_days: 3,
            lrm_days: 3,
            test_end_days: 2,
        }
    }
}

impl AlertThresholds {
    /// Thresholds for the "milestone approaching" view: test ends are
    /// flagged a week ahead.
    pub fn milestone_view() -> Self {
        Self {
            test_end_days: 7,
            ..Self::default()
        }
    }
}

/// Range limits applied by the input layer before data reaches the solver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanLimits {
    pub max_duration_days: i64,
    pub max_vehicles: usize,
    pub max_tests_per_vehicle: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            max_duration_days: 30,
            max_vehicles: 20,
            max_tests_per_vehicle: 10,
        }
    }
}

impl PlanLimits {
    /// Check counts and durations against the limits
    pub fn check(&self, plan: &TestPlan) -> Result<(), PlanError> {
        if plan.vehicles.len() > self.max_vehicles {
            return Err(PlanError::LimitExceeded(format!(
                "{} vehicles (maximum {})",
                plan.vehicles.len(),
                self.max_vehicles
            )));
        }
        for vehicle in &plan.vehicles {
            if vehicle.tests.len() > self.max_tests_per_vehicle {
                return Err(PlanError::LimitExceeded(format!(
                    "vehicle '{}' has {} tests (maximum {})",
                    vehicle.id,
                    vehicle.tests.len(),
                    self.max_tests_per_vehicle
                )));
            }
            for test in &vehicle.tests {
                if test.duration_days < 1 {
                    return Err(PlanError::InvalidDuration {
                        vehicle: vehicle.id.clone(),
                        test: test.name.clone(),
                        days: test.duration_days,
                    });
                }
                if test.duration_days > self.max_duration_days {
                    return Err(PlanError::LimitExceeded(format!(
                        "test '{}' on vehicle '{}' lasts {} days (maximum {})",
                        test.name, vehicle.id, test.duration_days, self.max_duration_days
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Configuration passed into every derivation call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    pub mode: ModeSelection,
    pub alerts: AlertThresholds,
    pub limits: PlanLimits,
}

impl DerivationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mode selection
    pub fn mode(mut self, mode: ModeSelection) -> Self {
        self.mode = mode;
        self
    }

    /// Set the alert thresholds
    pub fn alerts(mut self, alerts: AlertThresholds) -> Self {
        self.alerts = alerts;
        self
    }

    /// Set the input limits
    pub fn limits(mut self, limits: PlanLimits) -> Self {
        self.limits = limits;
        self
    }
}
