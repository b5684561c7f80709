#![allow(dead_code)]

use chrono::NaiveDate;
use testplan_core::{DerivationConfig, PlanView, Test, TestPlan, Vehicle};
use testplan_solver::plan_view;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// V001 is sequential from its SOPM; V002 has explicit, overlapping tests.
pub fn fleet_view(today: NaiveDate) -> PlanView {
    let plan = TestPlan::new("Fleet 2025")
        .vehicle(
            Vehicle::new("V001")
                .sopm(date(2025, 1, 6))
                .lrm(date(2025, 3, 1))
                .test(Test::new("Brakes", 3).responsible("Lab A"))
                .test(Test::new("Noise", 2).responsible("Lab B")),
        )
        .vehicle(
            Vehicle::new("V002")
                .test(Test::new("Climate", 3).starting(date(2025, 1, 7)))
                .test(Test::new("Brakes", 2).starting(date(2025, 1, 8))),
        );
    plan_view(&plan, &DerivationConfig::default(), today).unwrap()
}

/// A reference date long before every date in the fleet plan
pub fn quiet_day() -> NaiveDate {
    date(2024, 6, 1)
}
