//! # testplan-solver
//!
//! Schedule derivation and overlap detection for vehicle test plans.
//!
//! This crate provides:
//! - Sequential and explicit placement of tests (`ScheduleDeriver`)
//! - Due-soon alerts against a reference date (`alerts`)
//! - Pairwise overlap detection per vehicle (`OverlapDetector`)
//! - `plan_view`, the single entry point run after every plan edit
//!
//! All functions are pure in their inputs: the plan, a `DerivationConfig`
//! and the reference date. Running twice on the same input gives the same
//! result.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use testplan_core::{DerivationConfig, Test, TestPlan, Vehicle};
//! use testplan_solver::plan_view;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
//! let plan = TestPlan::new("Fleet").vehicle(
//!     Vehicle::new("V001")
//!         .sopm(d(1, 1))
//!         .test(Test::new("A", 3))
//!         .test(Test::new("B", 2)),
//! );
//!
//! let view = plan_view(&plan, &DerivationConfig::default(), d(1, 1)).unwrap();
//! assert_eq!(view.schedule.tests[1].start, d(1, 4));
//! assert!(view.overlaps.is_empty());
//! ```

pub mod alerts;
pub mod derive;
pub mod overlap;

pub use alerts::{alerts_for, days_until, AlertThresholds};
pub use derive::{select_mode, ScheduleDeriver};
pub use overlap::{find_overlaps, overlaps, OverlapDetector};

use chrono::NaiveDate;
use testplan_core::{DerivationConfig, PlanError, PlanView, TestPlan};

/// Derive the schedule of a plan and detect its overlaps
pub fn plan_view(
    plan: &TestPlan,
    config: &DerivationConfig,
    today: NaiveDate,
) -> Result<PlanView, PlanError> {
    let schedule = ScheduleDeriver::new(*config).derive(plan, today)?;
    let overlaps = OverlapDetector::new().detect(&schedule);
    Ok(PlanView { schedule, overlaps })
}
